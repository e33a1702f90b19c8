use crate::vdp::CYCLES_PER_LINE;
use crate::vdp::registers::ScreenMode;
use bincode::{Decode, Encode};

pub const MAX_ACTIVE_SPRITES: usize = 8;

// Text mode shows 40 columns; the other modes show 32
const MAX_TILE_COLUMNS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum LineMode {
    Text,
    Character,
    Sms,
    #[default]
    Refresh,
}

/// Position of one of the two pipeline pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct LineBufferPointer {
    pub row: u16,
    pub column: u16,
}

impl LineBufferPointer {
    /// Internal cycles from `earlier` forward to `self`, wrapping at the end of the frame.
    pub fn cycles_since(self, earlier: Self, total_lines: u16) -> u32 {
        let frame_length = u32::from(total_lines) * u32::from(CYCLES_PER_LINE);
        let position = |pointer: Self| {
            u32::from(pointer.row) * u32::from(CYCLES_PER_LINE) + u32::from(pointer.column)
        };
        (position(self) + frame_length - position(earlier)) % frame_length
    }

    /// Steps back by `cycles`, which must be less than one line.
    pub fn rewound_by(self, cycles: u16, total_lines: u16) -> Self {
        if self.column >= cycles {
            Self { row: self.row, column: self.column - cycles }
        } else {
            Self {
                row: (self.row + total_lines - 1) % total_lines,
                column: self.column + CYCLES_PER_LINE - cycles,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct NameEntry {
    pub name: u16,
    /// Mode 4 attribute bits: 0x02 horizontal flip, 0x04 vertical flip, 0x08 palette select,
    /// 0x10 priority.
    pub flags: u8,
    /// Mode 4: line within the tile after vertical scroll and flip.
    pub row: u8,
}

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct ActiveSprite {
    pub index: u8,
    pub name: u8,
    pub row: u8,
    pub x: i16,
    pub shift_position: i16,
    /// TMS: pattern bytes 0-1 and colour in byte 2. Mode 4: the four bit-planes.
    pub image: [u8; 4],
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LineBuffer {
    pub line_mode: LineMode,
    pub screen_mode: ScreenMode,
    /// TMS: pattern byte then colour byte. Mode 4: four bit-planes.
    pub patterns: [[u8; 4]; MAX_TILE_COLUMNS],
    pub names: [NameEntry; MAX_TILE_COLUMNS],
    pub latched_horizontal_scroll: u8,
    pub first_pixel_output_column: u16,
    pub next_border_column: u16,
    pub active_sprites: [ActiveSprite; MAX_ACTIVE_SPRITES],
    pub active_sprite_slot: usize,
    pub sprites_stopped: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            line_mode: LineMode::default(),
            screen_mode: ScreenMode::default(),
            patterns: [[0; 4]; MAX_TILE_COLUMNS],
            names: [NameEntry::default(); MAX_TILE_COLUMNS],
            latched_horizontal_scroll: 0,
            first_pixel_output_column: 86,
            next_border_column: CYCLES_PER_LINE,
            active_sprites: [ActiveSprite::default(); MAX_ACTIVE_SPRITES],
            active_sprite_slot: 0,
            sprites_stopped: false,
        }
    }

    pub fn reset_sprite_collection(&mut self) {
        self.sprites_stopped = false;
        self.active_sprite_slot = 0;

        for sprite in &mut self.active_sprites {
            sprite.shift_position = 0;
        }
    }

    pub fn active_sprites(&self) -> &[ActiveSprite] {
        &self.active_sprites[..self.active_sprite_slot]
    }

    pub fn pixel_count(&self) -> u16 {
        self.next_border_column - self.first_pixel_output_column
    }
}
