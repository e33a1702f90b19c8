use tms9918_core::vdp::CYCLES_PER_LINE;
use vdp_common::frontend::{Color, ScanTarget};

const UNITS_PER_CYCLE: u32 = 4;
const LINE_UNITS: u32 = CYCLES_PER_LINE as u32 * UNITS_PER_CYCLE;

// Lines are stored starting from the left border rather than from the start of horizontal
// blanking; the columns before it belong to the end of the previous line
const LEFT_BORDER_COLUMN: u32 = 73;

/// Scan target that rasterises the composite signal into an image of one pixel per internal
/// cycle, `CYCLES_PER_LINE` wide and one row per scanline.
///
/// Rows are aligned by vertical sync: the first line after sync becomes row 0. Output before the
/// first vertical sync is discarded.
pub struct FrameCapture {
    width: u32,
    height: u32,
    buffer: Vec<Color>,
    row: Option<u32>,
    position: u32,
    in_vertical_sync: bool,
    frames_completed: u32,
}

impl FrameCapture {
    pub fn new(total_lines: u16) -> Self {
        let width = u32::from(CYCLES_PER_LINE);
        let height = u32::from(total_lines);
        Self {
            width,
            height,
            buffer: vec![Color::BLACK; (width * height) as usize],
            row: None,
            position: 0,
            in_vertical_sync: false,
            frames_completed: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames whose vertical sync has ended since capture began.
    pub fn frames_completed(&self) -> u32 {
        self.frames_completed
    }

    pub fn pixels(&self) -> &[Color] {
        &self.buffer
    }

    fn end_vertical_sync(&mut self) {
        if !self.in_vertical_sync {
            return;
        }

        self.in_vertical_sync = false;
        self.row = Some(0);
        self.position = 0;
        self.frames_completed += 1;
    }

    fn set_pixel(&mut self, column: u32, color: Color) {
        let Some(row) = self.row else { return };
        if column >= self.width {
            return;
        }

        let (x, y) = if column >= LEFT_BORDER_COLUMN {
            (column - LEFT_BORDER_COLUMN, Some(row))
        } else {
            (column + self.width - LEFT_BORDER_COLUMN, row.checked_sub(1))
        };

        if let Some(y) = y.filter(|&y| y < self.height) {
            self.buffer[(y * self.width + x) as usize] = color;
        }
    }

    fn advance(&mut self, duration: u32, mut color_at: impl FnMut(usize) -> Color) {
        let first_column = self.position / UNITS_PER_CYCLE;
        let columns = duration / UNITS_PER_CYCLE;
        for i in 0..columns {
            self.set_pixel(first_column + i, color_at(i as usize));
        }

        self.position += duration;
        while self.position >= LINE_UNITS {
            self.position -= LINE_UNITS;
            self.row = self.row.map(|row| row + 1);
        }
    }
}

impl ScanTarget for FrameCapture {
    fn output_sync(&mut self, duration: u32) {
        if duration >= LINE_UNITS {
            self.in_vertical_sync = true;
        } else {
            self.end_vertical_sync();
        }
        self.advance(duration, |_| Color::BLACK);
    }

    fn output_blank(&mut self, duration: u32) {
        self.end_vertical_sync();
        self.advance(duration, |_| Color::BLACK);
    }

    fn output_colour_burst(&mut self, duration: u32) {
        self.end_vertical_sync();
        self.advance(duration, |_| Color::BLACK);
    }

    fn output_level(&mut self, duration: u32, color: Color) {
        self.end_vertical_sync();
        self.advance(duration, |_| color);
    }

    fn begin_span(&mut self, _width: usize) -> bool {
        true
    }

    fn commit_span(&mut self, duration: u32, pixels: &[Color]) {
        self.end_vertical_sync();
        self.advance(duration, |i| pixels.get(i).copied().unwrap_or(Color::BLACK));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const RED: Color = Color::rgb(255, 0, 0);

    fn border_line(capture: &mut FrameCapture, color: Color) {
        capture.output_level(15 * 4, color);
        capture.output_blank(8 * 4);
        capture.output_sync(26 * 4);
        capture.output_blank(2 * 4);
        capture.output_colour_burst(14 * 4);
        capture.output_blank(8 * 4);
        capture.output_level(269 * 4, color);
    }

    #[test]
    fn discards_output_before_vertical_sync() {
        let mut capture = FrameCapture::new(10);
        border_line(&mut capture, RED);

        assert_eq!(capture.frames_completed(), 0);
        assert!(capture.pixels().iter().all(|&pixel| pixel == Color::BLACK));
    }

    #[test]
    fn rows_start_after_vertical_sync() {
        let mut capture = FrameCapture::new(10);
        capture.output_sync(LINE_UNITS);
        capture.output_sync(LINE_UNITS);
        border_line(&mut capture, RED);
        border_line(&mut capture, RED);

        assert_eq!(capture.frames_completed(), 1);

        let width = capture.width() as usize;
        let row0 = &capture.pixels()[..width];
        assert!(row0[..269].iter().all(|&pixel| pixel == RED));

        // Row 1's leading border and blanking fold onto the end of row 0
        assert!(row0[269..284].iter().all(|&pixel| pixel == RED));
        assert_eq!(row0[284], Color::BLACK);
    }

    #[test]
    fn spans_are_placed_at_their_columns() {
        let mut capture = FrameCapture::new(4);
        capture.output_sync(LINE_UNITS);
        capture.output_blank(86 * 4);

        let pixels = vec![RED; 256];
        assert!(capture.begin_span(pixels.len()));
        capture.commit_span(256 * 4, &pixels);

        let row0 = &capture.pixels()[..capture.width() as usize];
        assert_eq!(row0[12], Color::BLACK);
        assert!(row0[13..269].iter().all(|&pixel| pixel == RED));
    }
}
