use crate::vdp::linebuffer::LineBufferPointer;
use crate::vdp::{CYCLES_PER_LINE, END_OF_FRAME_INTERRUPT_COLUMN, LINE_INTERRUPT_COLUMN};
use bincode::{Decode, Encode};
use tms9918_config::Personality;
use vdp_common::frontend::TvStandard;

pub const NTSC_LINES_PER_FRAME: u16 = 262;
pub const PAL_LINES_PER_FRAME: u16 = 313;

const NTSC_FIRST_VSYNC_LINE: u16 = 227;
const PAL_FIRST_VSYNC_LINE: u16 = 253;

pub const SPRITE_TERMINATOR: u8 = 0xD0;

pub trait TvStandardExt {
    fn lines_per_frame(self) -> u16;

    fn first_vsync_line(self) -> u16;
}

impl TvStandardExt for TvStandard {
    fn lines_per_frame(self) -> u16 {
        match self {
            Self::Ntsc => NTSC_LINES_PER_FRAME,
            Self::Pal => PAL_LINES_PER_FRAME,
        }
    }

    fn first_vsync_line(self) -> u16 {
        match self {
            Self::Ntsc => NTSC_FIRST_VSYNC_LINE,
            Self::Pal => PAL_FIRST_VSYNC_LINE,
        }
    }
}

/// Converts host time, in half cycles of the colour clock, to internal cycles at 342 per line.
///
/// Three host half cycles make four internal cycles; the remainder is carried between calls.
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct ClockConverter {
    cycles_error: u32,
}

impl ClockConverter {
    pub fn to_internal(&mut self, half_cycles: u32) -> u32 {
        let total = u64::from(half_cycles) * 3 + u64::from(self.cycles_error);
        self.cycles_error = (total & 3) as u32;
        (total >> 2) as u32
    }

    /// The number of half cycles that, passed to [`Self::to_internal`] right now, yields exactly
    /// `internal_cycles`.
    pub fn half_cycles_before(&self, internal_cycles: u32) -> u32 {
        let numerator = (i64::from(internal_cycles) << 2) + 2 - i64::from(self.cycles_error);
        (numerator.max(0) / 3) as u32
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct ModeTiming {
    pub total_lines: u16,
    pub pixel_lines: u16,
    pub first_vsync_line: u16,
    pub line_interrupt_position: Option<u16>,
    pub end_of_frame_interrupt_position: LineBufferPointer,
    pub maximum_visible_sprites: u8,
    pub allow_sprite_terminator: bool,
    pub sprite_terminator: u8,
}

impl ModeTiming {
    pub fn new(personality: Personality, tv_standard: TvStandard) -> Self {
        Self {
            total_lines: tv_standard.lines_per_frame(),
            pixel_lines: 192,
            first_vsync_line: tv_standard.first_vsync_line(),
            line_interrupt_position: personality.is_sega_vdp().then_some(LINE_INTERRUPT_COLUMN),
            end_of_frame_interrupt_position: LineBufferPointer {
                row: 193,
                column: END_OF_FRAME_INTERRUPT_COLUMN,
            },
            maximum_visible_sprites: 4,
            allow_sprite_terminator: true,
            sprite_terminator: SPRITE_TERMINATOR,
        }
    }

    pub fn set_tv_standard(&mut self, tv_standard: TvStandard) {
        self.total_lines = tv_standard.lines_per_frame();
        self.first_vsync_line = tv_standard.first_vsync_line();
    }

    /// Applies a Mode 4 display height latched at the start of a frame.
    pub fn set_mode4_pixel_lines(&mut self, pixel_lines: u16) {
        self.pixel_lines = pixel_lines;
        self.allow_sprite_terminator = pixel_lines == 192;
        self.first_vsync_line = (self.total_lines + pixel_lines) >> 1;
        self.end_of_frame_interrupt_position.row = pixel_lines + 1;
    }

    pub fn restore_tms_heights(&mut self, tv_standard: TvStandard) {
        self.pixel_lines = 192;
        self.allow_sprite_terminator = true;
        self.first_vsync_line = tv_standard.first_vsync_line();
        self.end_of_frame_interrupt_position.row = 193;
    }

    pub fn frame_length(&self) -> u32 {
        u32::from(self.total_lines) * u32::from(CYCLES_PER_LINE)
    }
}
