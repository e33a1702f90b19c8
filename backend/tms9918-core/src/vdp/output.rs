//! The read side of the pipeline: turns line buffers into the composite signal.

use crate::vdp::colors::tms_color;
use crate::vdp::linebuffer::LineMode;
use crate::vdp::{CYCLES_PER_LINE, SpanState, Vdp};
use vdp_common::frontend::{Color, ScanTarget};

// Output units per internal cycle
const UNITS_PER_CYCLE: u32 = 4;

const RIGHT_BORDER_END: u16 = 15;
const LEFT_BORDER_START: u16 = 73;
const VSYNC_LINES: u16 = 4;

// Layout of the horizontal blanking interval between the borders, in internal cycles
const FRONT_PORCH: u32 = 8;
const HSYNC: u32 = 26;
const BREEZEWAY: u32 = 2;
const COLOUR_BURST: u32 = 14;
const BACK_PORCH: u32 = 8;

impl Vdp {
    /// Runs the read side to the end of the current line or the end of the budget, returning
    /// the cycles consumed.
    pub(super) fn advance_read_pointer<T: ScanTarget>(
        &mut self,
        cycles_pool: u32,
        target: &mut T,
    ) -> u32 {
        let total_lines = self.mode_timing.total_lines;
        let target_read_cycles =
            cycles_pool.min(u32::from(CYCLES_PER_LINE - self.read_pointer.column)) as u16;

        let mut read_cycles_performed = 0;
        let mut next_cram_dot: Option<Color> = None;
        while read_cycles_performed < target_read_cycles {
            let cram_dot = next_cram_dot.take();
            let mut read_cycles = target_read_cycles - read_cycles_performed;

            // Stop short of the next CRAM dot so that it lands on the first pixel of a sub-span
            if let Some(dot) = self.cram_dots.next_on_line(self.read_pointer, total_lines) {
                let cycles_until_dot = dot.location.column - self.read_pointer.column;
                if cycles_until_dot < read_cycles {
                    read_cycles = cycles_until_dot;
                    next_cram_dot = Some(dot.value);
                    self.cram_dots.pop();
                }
            }

            if read_cycles == 0 {
                continue;
            }

            read_cycles_performed += read_cycles;

            let start_column = self.read_pointer.column;
            let end_column = start_column + read_cycles;
            self.output_columns(start_column, end_column, cram_dot, target);
            self.read_pointer.column = end_column;
        }

        if self.read_pointer.column == CYCLES_PER_LINE {
            self.read_pointer.column = 0;
            self.read_pointer.row = (self.read_pointer.row + 1) % total_lines;
        }

        u32::from(target_read_cycles)
    }

    fn output_columns<T: ScanTarget>(
        &mut self,
        start: u16,
        end: u16,
        mut cram_dot: Option<Color>,
        target: &mut T,
    ) {
        let row = self.read_pointer.row;
        let line = &self.line_buffers[usize::from(row)];
        let first_pixel_column = line.first_pixel_output_column;
        let next_border_column = line.next_border_column;

        if line.line_mode == LineMode::Refresh || row > self.mode_timing.pixel_lines {
            let first_vsync_line = self.mode_timing.first_vsync_line;
            if (first_vsync_line..first_vsync_line + VSYNC_LINES).contains(&row) {
                if end == CYCLES_PER_LINE {
                    target.output_sync(u32::from(CYCLES_PER_LINE) * UNITS_PER_CYCLE);
                }
                return;
            }

            self.output_border_zone(0..RIGHT_BORDER_END, start, end, &mut cram_dot, target);
            output_blanking_interval(start, end, target);
            let left_border = LEFT_BORDER_START..CYCLES_PER_LINE;
            self.output_border_zone(left_border, start, end, &mut cram_dot, target);
            return;
        }

        self.output_border_zone(0..RIGHT_BORDER_END, start, end, &mut cram_dot, target);
        output_blanking_interval(start, end, target);
        let left_border = LEFT_BORDER_START..first_pixel_column;
        self.output_border_zone(left_border, start, end, &mut cram_dot, target);

        let pixel_start = start.max(first_pixel_column);
        let pixel_end = end.min(next_border_column);
        if pixel_start < pixel_end {
            let dot = if pixel_start == start { cram_dot.take() } else { None };
            self.output_pixels(pixel_start, pixel_end, dot, target);
        }

        if next_border_column != CYCLES_PER_LINE {
            let right_border = next_border_column..CYCLES_PER_LINE;
            self.output_border_zone(right_border, start, end, &mut cram_dot, target);
        }
    }

    fn output_border_zone<T: ScanTarget>(
        &self,
        zone: std::ops::Range<u16>,
        start: u16,
        end: u16,
        cram_dot: &mut Option<Color>,
        target: &mut T,
    ) {
        let zone_start = start.max(zone.start);
        let zone_end = end.min(zone.end);
        if zone_start >= zone_end {
            return;
        }

        // A dot only ever applies at the first column of the span it split
        let dot = if zone_start == start { cram_dot.take() } else { None };
        self.output_border(u32::from(zone_end - zone_start) * UNITS_PER_CYCLE, dot, target);
    }

    fn output_border<T: ScanTarget>(&self, duration: u32, cram_dot: Option<Color>, target: &mut T) {
        let border = self.border_colour();

        let mut duration = duration;
        if let Some(dot) = cram_dot {
            target.output_level(UNITS_PER_CYCLE, border | dot);
            duration -= UNITS_PER_CYCLE;
        }

        if duration == 0 {
            return;
        }

        if border.is_black() {
            target.output_blank(duration);
        } else {
            target.output_level(duration, border);
        }
    }

    fn border_colour(&self) -> Color {
        let background = self.registers.background_colour;
        if self.personality.is_sega_vdp() && self.registers.mode4_enable {
            self.colour_ram[usize::from(0x10 | background)]
        } else {
            tms_color(self.personality, background)
        }
    }

    fn output_pixels<T: ScanTarget>(
        &mut self,
        start: u16,
        end: u16,
        cram_dot: Option<Color>,
        target: &mut T,
    ) {
        let line = &self.line_buffers[usize::from(self.read_pointer.row)];
        let line_mode = line.line_mode;
        let first_pixel_column = line.first_pixel_output_column;
        let next_border_column = line.next_border_column;
        let width = usize::from(line.pixel_count());

        if self.span_state == SpanState::Idle {
            self.span_state =
                if target.begin_span(width) { SpanState::Accepted } else { SpanState::Refused };
        }

        if self.span_state == SpanState::Accepted {
            let start = usize::from(start - first_pixel_column);
            let end = usize::from(end - first_pixel_column);
            match line_mode {
                LineMode::Sms => self.paint_sms(start, end, cram_dot),
                LineMode::Text => self.paint_tms_text(start, end, cram_dot),
                LineMode::Character | LineMode::Refresh => {
                    self.paint_tms_character(start, end, cram_dot);
                }
            }
        }

        if end == next_border_column {
            let duration = u32::from(next_border_column - first_pixel_column) * UNITS_PER_CYCLE;
            let pixels: &[Color] = match self.span_state {
                SpanState::Accepted => &self.pixel_line[..width],
                SpanState::Idle | SpanState::Refused => &[],
            };
            target.commit_span(duration, pixels);
            self.span_state = SpanState::Idle;
        }
    }
}

fn output_blanking_interval<T: ScanTarget>(start: u16, end: u16, target: &mut T) {
    // Emitted as a whole once the span reaches the left border
    if start >= LEFT_BORDER_START || end < LEFT_BORDER_START {
        return;
    }

    target.output_blank(FRONT_PORCH * UNITS_PER_CYCLE);
    target.output_sync(HSYNC * UNITS_PER_CYCLE);
    target.output_blank(BREEZEWAY * UNITS_PER_CYCLE);
    target.output_colour_burst(COLOUR_BURST * UNITS_PER_CYCLE);
    target.output_blank(BACK_PORCH * UNITS_PER_CYCLE);
}
