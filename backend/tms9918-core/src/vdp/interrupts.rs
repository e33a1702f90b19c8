use crate::vdp::linebuffer::LineBufferPointer;
use crate::vdp::{CYCLES_PER_LINE, LINE_INTERRUPT_COLUMN, STATUS_INTERRUPT, Vdp};

impl Vdp {
    /// State of the interrupt output: a pending frame or line interrupt whose source is enabled.
    #[must_use]
    pub fn interrupt_line(&self) -> bool {
        (self.status & STATUS_INTERRUPT != 0 && self.registers.frame_interrupt_enabled)
            || (self.registers.line_interrupt_enabled && self.line_interrupt_pending)
    }

    /// Half cycles until [`Self::interrupt_line`] next becomes true, assuming no further port
    /// accesses. `None` if no interrupt is enabled or one is already asserted.
    #[must_use]
    pub fn next_sequence_point(&self) -> Option<u32> {
        let registers = &self.registers;
        if !registers.frame_interrupt_enabled && !registers.line_interrupt_enabled {
            return None;
        }

        if self.interrupt_line() {
            return None;
        }

        let cycles_until_frame_interrupt = registers
            .frame_interrupt_enabled
            .then(|| self.cycles_until_frame_interrupt());

        let cycles_until_line_interrupt = if registers.line_interrupt_enabled {
            self.cycles_until_line_interrupt()
        } else {
            None
        };

        let cycles = match (cycles_until_frame_interrupt, cycles_until_line_interrupt) {
            (Some(frame), Some(line)) => frame.min(line),
            (Some(cycles), None) | (None, Some(cycles)) => cycles,
            (None, None) => return None,
        };

        Some(self.clock.half_cycles_before(cycles))
    }

    /// Half cycles until the line interrupt column of `line`; negative lines count back from
    /// the end of the frame.
    #[must_use]
    pub fn time_until_line(&self, line: i32) -> u32 {
        let total_lines = i32::from(self.mode_timing.total_lines);
        let line = if line < 0 { line + total_lines } else { line };

        let (cycles_to_threshold, threshold_line) = self.next_line_threshold();
        let mut line = line;
        if i32::from(threshold_line) > line {
            line += total_lines;
        }

        let cycles = cycles_to_threshold
            + (line - i32::from(threshold_line)).max(0) as u32 * u32::from(CYCLES_PER_LINE);
        self.clock.half_cycles_before(cycles)
    }

    fn cycles_until_frame_interrupt(&self) -> u32 {
        let cycles = self
            .mode_timing
            .end_of_frame_interrupt_position
            .cycles_since(self.write_pointer, self.mode_timing.total_lines);

        // Sitting exactly on the interrupt position means it has already been crossed
        if cycles == 0 { self.mode_timing.frame_length() } else { cycles }
    }

    fn cycles_until_line_interrupt(&self) -> Option<u32> {
        self.mode_timing.line_interrupt_position?;

        let pixel_lines = self.mode_timing.pixel_lines;
        let (cycles_to_threshold, threshold_line) = self.next_line_threshold();

        let underflow_this_frame = threshold_line + u16::from(self.line_interrupt_counter);
        let line_interrupt_row = if underflow_this_frame <= pixel_lines {
            underflow_this_frame
        } else if u16::from(self.registers.line_interrupt_target) <= pixel_lines {
            // Reloaded during the vertical border, then counted down from the top of next frame
            self.mode_timing.total_lines + u16::from(self.registers.line_interrupt_target)
        } else {
            return None;
        };

        let lines_after_threshold = u32::from(line_interrupt_row - threshold_line);
        Some(cycles_to_threshold + lines_after_threshold * u32::from(CYCLES_PER_LINE))
    }

    // Cycles until the write pointer next crosses the line interrupt column, and the (possibly
    // unwrapped) row on which that happens
    fn next_line_threshold(&self) -> (u32, u16) {
        let LineBufferPointer { row, column } = self.write_pointer;
        if column < LINE_INTERRUPT_COLUMN {
            (u32::from(LINE_INTERRUPT_COLUMN - column), row)
        } else {
            (u32::from(CYCLES_PER_LINE + LINE_INTERRUPT_COLUMN - column), row + 1)
        }
    }
}
