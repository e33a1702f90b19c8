//! TMS9918-family VDP (video display processor)
//!
//! Timing is modelled at 342 internal cycles per line. Two pointers walk a ring of per-line
//! buffers:
//! * The write pointer performs the chip's memory fetches in the same slots the hardware uses,
//!   collects sprites for the following line, services host VRAM accesses in the free slots, and
//!   raises interrupts.
//! * The read pointer trails the write pointer by [`OUTPUT_LAG`] cycles and converts what was
//!   fetched into sync, border and pixel output.
//!
//! The Sega parts extend the TMS9918A with Mode 4, colour RAM, scrolling and line interrupts; the
//! differences are gated on [`Personality`].

mod colors;
mod cramdots;
mod fetch;
mod interrupts;
mod linebuffer;
mod output;
mod registers;
mod render;
mod sprites;
mod timing;

use crate::vdp::cramdots::CramDotQueue;
use crate::vdp::linebuffer::{LineBuffer, LineBufferPointer, LineMode};
use crate::vdp::registers::{ControlWriteFlag, Registers, ScreenMode};
use crate::vdp::timing::{ClockConverter, ModeTiming, PAL_LINES_PER_FRAME, TvStandardExt};
use bincode::{Decode, Encode};
use tms9918_config::{Personality, VdpConfig};
use vdp_common::frontend::{Color, ScanTarget, TvStandard};
use vdp_common::num::{GetBit, U16Ext};

pub const VRAM_LEN: usize = 16 * 1024;
const COLOR_RAM_LEN: usize = 32;

// VRAM address is 14 bits
const VRAM_ADDRESS_MASK: u16 = 0x3FFF;

pub const CYCLES_PER_LINE: u16 = 342;

/// Internal cycles between a memory fetch and the output of the pixels it feeds.
pub const OUTPUT_LAG: u16 = 11;

const SCROLL_LATCH_COLUMN: u16 = 61;
const LINE_INTERRUPT_COLUMN: u16 = 64;
const END_OF_FRAME_INTERRUPT_COLUMN: u16 = 63;

// The host's view of the line counter advances at this column
const ROW_CHANGE_COLUMN: u16 = 63;

const VRAM_ACCESS_DELAY: i32 = 6;

const STATUS_INTERRUPT: u8 = 0x80;
const STATUS_SPRITE_OVERFLOW: u8 = 0x40;
const STATUS_SPRITE_COLLISION: u8 = 0x20;

pub type Vram = [u8; VRAM_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum MemoryAccess {
    #[default]
    None,
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum SpanState {
    #[default]
    Idle,
    Accepted,
    Refused,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Vdp {
    personality: Personality,
    tv_standard: TvStandard,
    registers: Registers,
    mode_timing: ModeTiming,
    clock: ClockConverter,
    vram: Box<Vram>,
    colour_ram: [Color; COLOR_RAM_LEN],
    cram_write_latch: u8,
    cram_is_selected: bool,
    cram_dots: CramDotQueue,
    line_buffers: Vec<LineBuffer>,
    write_pointer: LineBufferPointer,
    read_pointer: LineBufferPointer,
    status: u8,
    line_interrupt_pending: bool,
    line_interrupt_counter: u8,
    latched_vertical_scroll: u8,
    control_write_flag: ControlWriteFlag,
    low_write: u8,
    ram_pointer: u16,
    read_ahead_buffer: u8,
    queued_access: MemoryAccess,
    cycles_until_access: i32,
    minimum_access_column: i32,
    latched_column: u16,
    span_state: SpanState,
    pixel_line: Box<[Color; 256]>,
}

impl Vdp {
    /// Creates a VDP that powers on at a random point in the frame, as real hardware does.
    #[must_use]
    pub fn new(personality: Personality) -> Self {
        Self::with_starting_phase_seed(personality, rand::random())
    }

    /// Creates a VDP whose power-on position within the frame is derived from `seed`.
    #[must_use]
    pub fn with_starting_phase_seed(personality: Personality, seed: u64) -> Self {
        let tv_standard = TvStandard::default();
        let total_lines = tv_standard.lines_per_frame();

        let row = (seed % u64::from(total_lines)) as u16;
        let column_range = u64::from(CYCLES_PER_LINE - OUTPUT_LAG);
        let column = (seed / u64::from(total_lines) % column_range) as u16;
        let read_pointer = LineBufferPointer { row, column };
        let write_pointer = LineBufferPointer { row, column: column + OUTPUT_LAG };

        Self {
            personality,
            tv_standard,
            registers: Registers::new(personality),
            mode_timing: ModeTiming::new(personality, tv_standard),
            clock: ClockConverter::default(),
            vram: Box::new([0; VRAM_LEN]),
            colour_ram: [Color::BLACK; COLOR_RAM_LEN],
            cram_write_latch: 0,
            cram_is_selected: false,
            cram_dots: CramDotQueue::default(),
            line_buffers: (0..PAL_LINES_PER_FRAME).map(|_| LineBuffer::new()).collect(),
            write_pointer,
            read_pointer,
            status: 0,
            line_interrupt_pending: false,
            line_interrupt_counter: 0,
            latched_vertical_scroll: 0,
            control_write_flag: ControlWriteFlag::default(),
            low_write: 0,
            ram_pointer: 0,
            read_ahead_buffer: 0,
            queued_access: MemoryAccess::None,
            cycles_until_access: 0,
            minimum_access_column: 0,
            latched_column: 0,
            span_state: SpanState::Idle,
            pixel_line: Box::new([Color::BLACK; 256]),
        }
    }

    #[must_use]
    pub fn from_config(config: &VdpConfig) -> Self {
        let mut vdp = match config.starting_phase_seed {
            Some(seed) => Self::with_starting_phase_seed(config.personality, seed),
            None => Self::new(config.personality),
        };
        vdp.set_tv_standard(config.tv_standard);
        vdp
    }

    #[must_use]
    pub fn personality(&self) -> Personality {
        self.personality
    }

    #[must_use]
    pub fn tv_standard(&self) -> TvStandard {
        self.tv_standard
    }

    /// Switches between 262-line and 313-line timing. Only meaningful between frames.
    pub fn set_tv_standard(&mut self, tv_standard: TvStandard) {
        log::debug!("VDP TV standard set to {tv_standard}");

        self.tv_standard = tv_standard;
        self.mode_timing.set_tv_standard(tv_standard);

        let total_lines = self.mode_timing.total_lines;
        self.write_pointer.row %= total_lines;
        self.read_pointer = self.write_pointer.rewound_by(OUTPUT_LAG, total_lines);
    }

    /// Lines per frame, including blanking and sync.
    #[must_use]
    pub fn total_lines(&self) -> u16 {
        self.mode_timing.total_lines
    }

    /// Video RAM. The host machine owns its contents; the VDP only reads it during fetches and
    /// writes it when servicing port accesses.
    #[must_use]
    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    #[must_use]
    pub fn colour_ram(&self) -> &[Color; COLOR_RAM_LEN] {
        &self.colour_ram
    }

    /// Port write. Even addresses are the data port and odd addresses the control port.
    pub fn write(&mut self, address: u16, value: u8) {
        if !address.bit(0) {
            log::trace!("VDP data write {value:02X} queued for address {:04X}", self.ram_pointer);

            self.control_write_flag = ControlWriteFlag::First;
            self.read_ahead_buffer = value;
            self.queue_access(MemoryAccess::Write);
            return;
        }

        let write_flag = self.control_write_flag;
        self.control_write_flag = write_flag.toggle();

        match write_flag {
            ControlWriteFlag::First => {
                self.low_write = value;
                self.ram_pointer.set_lsb(value);
            }
            ControlWriteFlag::Second => {
                self.ram_pointer.set_msb(value & 0x3F);

                if value.bit(7) {
                    if self.personality.is_sega_vdp() && value.bit(6) {
                        log::trace!("CRAM selected at address {:04X}", self.ram_pointer);
                        self.cram_is_selected = true;
                        return;
                    }

                    // Register writes leave the CRAM/VRAM data port target untouched
                    let register = value & self.personality.register_mask();
                    self.registers.write(register, self.low_write);
                    return;
                }

                if !value.bit(6) {
                    self.queue_access(MemoryAccess::Read);
                }
                self.cram_is_selected = false;

                log::trace!("VRAM address set to {:04X}", self.ram_pointer);
            }
        }
    }

    /// Port read. Even addresses return the read-ahead buffer and start the next read; odd
    /// addresses return and acknowledge the status register.
    pub fn read(&mut self, address: u16) -> u8 {
        self.control_write_flag = ControlWriteFlag::First;

        if !address.bit(0) {
            let value = self.read_ahead_buffer;
            self.queue_access(MemoryAccess::Read);
            return value;
        }

        let status = self.status;
        self.status &= !(STATUS_INTERRUPT | STATUS_SPRITE_OVERFLOW | STATUS_SPRITE_COLLISION);
        self.line_interrupt_pending = false;
        status
    }

    // Only one access can be outstanding; a newer request replaces an unserviced one
    fn queue_access(&mut self, access: MemoryAccess) {
        self.queued_access = access;
        self.cycles_until_access = VRAM_ACCESS_DELAY;
    }

    /// Advances the chip by `half_cycles` of the colour clock, pushing the produced signal into
    /// `target`.
    ///
    /// Callers must not advance more than one frame per call; longer spans would let the write
    /// pointer overwrite line buffers and CRAM dots before the read pointer consumes them.
    pub fn run_for<T: ScanTarget>(&mut self, half_cycles: u32, target: &mut T) {
        let cycles = self.clock.to_internal(half_cycles);
        if cycles == 0 {
            return;
        }

        debug_assert!(
            cycles <= self.mode_timing.frame_length(),
            "run_for called with {cycles} cycles, more than one frame"
        );

        let mut write_cycles_pool = cycles;
        let mut read_cycles_pool = cycles;
        while write_cycles_pool > 0 || read_cycles_pool > 0 {
            let read_pointer_before = self.read_pointer;
            if write_cycles_pool > 0 {
                write_cycles_pool -= self.advance_write_pointer(write_cycles_pool);
            }
            debug_assert_eq!(read_pointer_before, self.read_pointer);

            let write_pointer_before = self.write_pointer;
            if read_cycles_pool > 0 {
                read_cycles_pool -= self.advance_read_pointer(read_cycles_pool, target);
            }
            debug_assert_eq!(write_pointer_before, self.write_pointer);
        }

        debug_assert_eq!(
            self.write_pointer.cycles_since(self.read_pointer, self.mode_timing.total_lines),
            u32::from(OUTPUT_LAG),
            "read pointer {:?} lost its lag behind write pointer {:?}",
            self.read_pointer,
            self.write_pointer
        );
    }

    /// Runs the write side to the end of the current line or the end of the budget, returning
    /// the cycles consumed.
    fn advance_write_pointer(&mut self, cycles_pool: u32) -> u32 {
        let start_column = self.write_pointer.column;
        let write_cycles = cycles_pool.min(u32::from(CYCLES_PER_LINE - start_column)) as u16;
        let end_column = start_column + write_cycles;

        // Host accesses become eligible a fixed number of cycles after they were made
        self.minimum_access_column = i32::from(start_column) + self.cycles_until_access;
        self.cycles_until_access = (self.cycles_until_access - i32::from(write_cycles)).max(0);

        let crosses = |position: u16| start_column < position && end_column >= position;

        if self.personality.is_sega_vdp() && crosses(SCROLL_LATCH_COLUMN) {
            self.latch_scroll();
        }

        let first_window = start_column >> 1;
        let final_window = end_column >> 1;
        if first_window != final_window {
            self.fetch(first_window, final_window);
        }

        let row = self.write_pointer.row;

        if self.mode_timing.line_interrupt_position.is_some_and(crosses) {
            self.clock_line_interrupt_counter(row);
        }

        let end_of_frame = self.mode_timing.end_of_frame_interrupt_position;
        if row == end_of_frame.row && crosses(end_of_frame.column) {
            log::trace!("Frame interrupt at line {row}");
            self.status |= STATUS_INTERRUPT;
        }

        self.write_pointer.column = end_column;
        if end_column == CYCLES_PER_LINE {
            self.begin_next_write_line();
        }

        u32::from(write_cycles)
    }

    fn latch_scroll(&mut self) {
        let row = self.write_pointer.row;
        self.line_buffers[usize::from(row)].latched_horizontal_scroll =
            self.registers.horizontal_scroll;

        if row != 0 {
            return;
        }

        self.latched_vertical_scroll = self.registers.vertical_scroll;

        if !self.registers.mode4_enable {
            self.mode_timing.restore_tms_heights(self.tv_standard);
            return;
        }

        let registers = &self.registers;
        let extended = self.personality.supports_extended_heights() && registers.mode2_enable;
        let pixel_lines = if !extended {
            192
        } else if registers.mode3_enable {
            240
        } else if registers.mode1_enable {
            224
        } else {
            192
        };

        if pixel_lines != self.mode_timing.pixel_lines {
            log::debug!("Mode 4 display height changed to {pixel_lines} lines");
        }
        self.mode_timing.set_mode4_pixel_lines(pixel_lines);
    }

    fn clock_line_interrupt_counter(&mut self, row: u16) {
        if row > self.mode_timing.pixel_lines {
            self.line_interrupt_counter = self.registers.line_interrupt_target;
            return;
        }

        self.line_interrupt_counter = self.line_interrupt_counter.wrapping_sub(1);
        if self.line_interrupt_counter == 0xFF {
            log::trace!("Line interrupt at line {row}");
            self.line_interrupt_pending = true;
            self.line_interrupt_counter = self.registers.line_interrupt_target;
        }
    }

    fn begin_next_write_line(&mut self) {
        let total_lines = self.mode_timing.total_lines;
        self.write_pointer.column = 0;
        self.write_pointer.row = (self.write_pointer.row + 1) % total_lines;

        let row = self.write_pointer.row;
        let screen_mode = self.registers.screen_mode();

        self.mode_timing.maximum_visible_sprites =
            if screen_mode == ScreenMode::Mode4 { 8 } else { 4 };

        let (line_mode, first_pixel_output_column, next_border_column) = match screen_mode {
            ScreenMode::Text => (LineMode::Text, 94, 334),
            ScreenMode::Mode4 => (LineMode::Sms, 86, CYCLES_PER_LINE),
            _ => (LineMode::Character, 86, CYCLES_PER_LINE),
        };

        // The final line of the frame still fetches so that sprites are collected for line 0
        let border_region = screen_mode == ScreenMode::Blank
            || (row >= self.mode_timing.pixel_lines && row != total_lines - 1);

        let line = &mut self.line_buffers[usize::from(row)];
        line.screen_mode = screen_mode;
        line.line_mode = if border_region { LineMode::Refresh } else { line_mode };
        line.first_pixel_output_column = first_pixel_output_column;
        line.next_border_column = next_border_column;
    }

    /// Samples the beam position for [`Self::latched_horizontal_counter`].
    pub fn latch_horizontal_counter(&mut self) {
        self.latched_column = self.write_pointer.column;
    }

    #[must_use]
    pub fn latched_horizontal_counter(&self) -> u8 {
        let mut counter = i32::from(self.latched_column) - 86;
        if counter < -46 {
            counter += i32::from(CYCLES_PER_LINE);
        }
        (counter >> 1) as u8
    }

    /// The line counter as the host sees it, including the jumps the hardware makes in the
    /// vertical border.
    #[must_use]
    pub fn current_line(&self) -> u8 {
        let total_lines = self.mode_timing.total_lines;
        let row = if self.write_pointer.column < ROW_CHANGE_COLUMN {
            (self.write_pointer.row + total_lines - 1) % total_lines
        } else {
            self.write_pointer.row
        };

        let adjusted = match (self.tv_standard, self.mode_timing.pixel_lines) {
            (TvStandard::Ntsc, 192) if row > 0xDA => row - 6,
            (TvStandard::Ntsc, 224) if row > 0xEA => row - 6,
            (TvStandard::Pal, 192) if row > 0xF2 => row - 0x39,
            (TvStandard::Pal, 224) if row > 0x102 => row - 0x39,
            (TvStandard::Pal, 240) if row > 0x10A => row - 0x39,
            _ => row,
        };
        adjusted as u8
    }

    #[cfg(test)]
    fn place_write_pointer(&mut self, row: u16, column: u16) {
        self.write_pointer = LineBufferPointer { row, column };
        self.read_pointer = self.write_pointer.rewound_by(OUTPUT_LAG, self.mode_timing.total_lines);
    }
}
