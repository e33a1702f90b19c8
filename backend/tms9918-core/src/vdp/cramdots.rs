use crate::vdp::CYCLES_PER_LINE;
use crate::vdp::linebuffer::LineBufferPointer;
use bincode::{Decode, Encode};
use std::collections::VecDeque;
use vdp_common::frontend::Color;

// Dots are queued at most one line plus the output lag ahead of the read pointer
const PENDING_WINDOW: u32 = 2 * CYCLES_PER_LINE as u32;

/// A colour-RAM write that lands while the beam is drawing shows up as a single pixel of the new
/// colour at the beam position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CramDot {
    pub location: LineBufferPointer,
    pub value: Color,
}

#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct CramDotQueue {
    dots: VecDeque<CramDot>,
}

impl CramDotQueue {
    pub fn push(&mut self, dot: CramDot) {
        log::trace!("CRAM dot queued at {:?}: {:?}", dot.location, dot.value);
        self.dots.push_back(dot);
    }

    /// Discards dots the read pointer has already passed and returns the next dot on the read
    /// pointer's current line, if any.
    pub fn next_on_line(
        &mut self,
        read_pointer: LineBufferPointer,
        total_lines: u16,
    ) -> Option<CramDot> {
        while let Some(&dot) = self.dots.front() {
            if dot.location.cycles_since(read_pointer, total_lines) < PENDING_WINDOW {
                break;
            }

            log::trace!("Discarding passed CRAM dot at {:?}", dot.location);
            self.dots.pop_front();
        }

        self.dots.front().copied().filter(|dot| dot.location.row == read_pointer.row)
    }

    pub fn pop(&mut self) {
        self.dots.pop_front();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.dots.len()
    }
}
