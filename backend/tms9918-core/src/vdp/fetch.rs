//! Memory fetch slots
//!
//! A line has 171 access windows, one every two internal cycles. Each line mode assigns every
//! window to a tile fetch, a sprite fetch, a refresh, or an external slot in which a pending host
//! access may be serviced.

use crate::vdp::colors::{gg_color_to_rgb, sms_color_to_rgb};
use crate::vdp::cramdots::CramDot;
use crate::vdp::linebuffer::{LineBufferPointer, LineMode, NameEntry};
use crate::vdp::registers::ScreenMode;
use crate::vdp::{MemoryAccess, OUTPUT_LAG, VRAM_ADDRESS_MASK, Vdp};
use vdp_common::num::GetBit;

impl Vdp {
    pub(super) fn fetch(&mut self, first_window: u16, final_window: u16) {
        let line_mode = self.line_buffers[usize::from(self.write_pointer.row)].line_mode;

        for window in first_window..final_window {
            match line_mode {
                LineMode::Refresh => self.fetch_refresh_window(window),
                LineMode::Text => self.fetch_text_window(window),
                LineMode::Character => self.fetch_character_window(window),
                LineMode::Sms => self.fetch_sms_window(window),
            }
        }
    }

    fn fetch_refresh_window(&mut self, window: u16) {
        // Past the first 43 windows, refresh and external slots alternate
        if window < 43 || (window - 43) % 2 == 1 {
            self.do_external_slot(window);
        }
    }

    fn fetch_text_window(&mut self, window: u16) {
        match window {
            47..167 => {
                let column = (window - 47) / 3;
                match (window - 47) % 3 {
                    0 => self.fetch_text_name(column),
                    1 => self.do_external_slot(window),
                    _ => self.fetch_tms_pattern(column),
                }
            }
            _ => self.do_external_slot(window),
        }
    }

    fn fetch_character_window(&mut self, window: u16) {
        match window {
            0..12 => {
                let slot = usize::from(window / 3);
                match window % 3 {
                    0 => self.fetch_tms_sprite_position(slot),
                    1 => self.fetch_tms_sprite_name_and_colour(slot),
                    _ => self.fetch_tms_sprite_pattern(slot),
                }
            }
            31 => self.begin_sprite_collection(),
            35..43 => self.scan_tms_sprite_y(window - 35),
            43..171 => {
                let column = (window - 43) / 4;
                match (window - 43) % 4 {
                    0 => self.fetch_tms_name(column),
                    1 if column < 24 => self.scan_tms_sprite_y(8 + column),
                    1 => self.do_external_slot(window),
                    2 => self.fetch_tms_pattern(column),
                    _ => self.fetch_tms_colour(column),
                }
            }
            _ => self.do_external_slot(window),
        }
    }

    fn fetch_sms_window(&mut self, window: u16) {
        match window {
            0..16 => {
                let slot = usize::from(window / 2);
                if window % 2 == 0 {
                    self.fetch_sms_sprite_position(slot);
                } else {
                    self.fetch_sms_sprite_pattern(slot);
                }
            }
            16 => self.begin_sprite_collection(),
            29..37 => self.scan_sms_sprite_y(window - 29),
            37..165 => {
                let column = (window - 37) / 4;
                match (window - 37) % 4 {
                    0 => self.fetch_sms_name(column),
                    1 if column < 28 => {
                        self.scan_sms_sprite_y(8 + 2 * column);
                        self.scan_sms_sprite_y(9 + 2 * column);
                    }
                    1 => self.do_external_slot(window),
                    2 => self.fetch_sms_pattern(column, 0),
                    _ => self.fetch_sms_pattern(column, 2),
                }
            }
            _ => self.do_external_slot(window),
        }
    }

    fn vram_byte(&self, address: u16) -> u8 {
        self.vram[usize::from(address & VRAM_ADDRESS_MASK)]
    }

    fn do_external_slot(&mut self, window: u16) {
        let access_column = window << 1;
        if self.queued_access == MemoryAccess::None
            || i32::from(access_column) < self.minimum_access_column
        {
            return;
        }

        let address = self.ram_pointer & VRAM_ADDRESS_MASK;
        match self.queued_access {
            MemoryAccess::Write if self.cram_is_selected => self.write_colour_ram(access_column),
            MemoryAccess::Write => {
                log::trace!("VRAM write {:02X} to {address:04X}", self.read_ahead_buffer);
                self.vram[usize::from(address)] = self.read_ahead_buffer;
            }
            MemoryAccess::Read => {
                self.read_ahead_buffer = self.vram[usize::from(address)];
                log::trace!("VRAM read {:02X} from {address:04X}", self.read_ahead_buffer);
            }
            MemoryAccess::None => {}
        }

        self.ram_pointer = self.ram_pointer.wrapping_add(1) & VRAM_ADDRESS_MASK;
        self.queued_access = MemoryAccess::None;
    }

    fn write_colour_ram(&mut self, access_column: u16) {
        let value = self.read_ahead_buffer;

        let color = if self.personality.is_game_gear() {
            // Game Gear CRAM is 16-bit; even bytes are latched and odd bytes commit the word
            let address = self.ram_pointer & 0x3F;
            if !address.bit(0) {
                self.cram_write_latch = value;
                return;
            }

            let color = gg_color_to_rgb(u16::from_le_bytes([self.cram_write_latch, value]));
            self.colour_ram[usize::from(address >> 1)] = color;
            color
        } else {
            let color = sms_color_to_rgb(value);
            self.colour_ram[usize::from(self.ram_pointer & 0x1F)] = color;
            color
        };

        log::trace!("CRAM write {:02X} to {:02X}", value, self.ram_pointer & 0x3F);

        // The new colour appears at whatever the beam is drawing right now
        let location = LineBufferPointer { row: self.write_pointer.row, column: access_column }
            .rewound_by(OUTPUT_LAG, self.mode_timing.total_lines);
        self.cram_dots.push(CramDot { location, value: color });
    }

    fn next_line_index(&self) -> usize {
        usize::from((self.write_pointer.row + 1) % self.mode_timing.total_lines)
    }

    fn begin_sprite_collection(&mut self) {
        let next_line = self.next_line_index();
        self.line_buffers[next_line].reset_sprite_collection();
    }

    fn scan_tms_sprite_y(&mut self, sprite: u16) {
        let address = self.registers.sprite_attribute_table_address & (0x3F80 | (sprite << 2));
        let y = self.vram_byte(address);
        self.posit_sprite(sprite as u8, y);
    }

    fn scan_sms_sprite_y(&mut self, sprite: u16) {
        let address = self.registers.mode4.sprite_attributes & (0x3F00 | sprite);
        let y = self.vram_byte(address);
        self.posit_sprite(sprite as u8, y);
    }

    fn tms_sprite_attribute_address(&self, index: u8, byte: u16) -> u16 {
        self.registers.sprite_attribute_table_address & (0x3F80 | (u16::from(index) << 2) | byte)
    }

    fn fetch_tms_sprite_position(&mut self, slot: usize) {
        let row = usize::from(self.write_pointer.row);
        let Some(&sprite) = self.line_buffers[row].active_sprites().get(slot) else { return };

        let x = self.vram_byte(self.tms_sprite_attribute_address(sprite.index, 1));
        self.line_buffers[row].active_sprites[slot].x = x.into();
    }

    fn fetch_tms_sprite_name_and_colour(&mut self, slot: usize) {
        let row = usize::from(self.write_pointer.row);
        let Some(&sprite) = self.line_buffers[row].active_sprites().get(slot) else { return };

        let mut name = self.vram_byte(self.tms_sprite_attribute_address(sprite.index, 2));
        if self.registers.sprites_16x16 {
            name &= 0xFC;
        }
        let colour = self.vram_byte(self.tms_sprite_attribute_address(sprite.index, 3));

        let sprite = &mut self.line_buffers[row].active_sprites[slot];
        sprite.name = name;
        sprite.image[2] = colour;

        // Early clock shifts the sprite 32 pixels left
        if colour.bit(7) {
            sprite.x -= 32;
        }
    }

    fn fetch_tms_sprite_pattern(&mut self, slot: usize) {
        let row = usize::from(self.write_pointer.row);
        let Some(&sprite) = self.line_buffers[row].active_sprites().get(slot) else { return };

        let address = self.registers.sprite_generator_table_address
            & (0x3800 | (u16::from(sprite.name) << 3) | u16::from(sprite.row));
        let left = self.vram_byte(address);
        let right = self.vram_byte(address + 16);

        let image = &mut self.line_buffers[row].active_sprites[slot].image;
        image[0] = left;
        image[1] = right;
    }

    fn fetch_text_name(&mut self, column: u16) {
        let row = self.write_pointer.row;
        let address =
            self.registers.pattern_name_address & (0x3C00 | ((row >> 3) * 40 + column));
        let name = self.vram_byte(address);
        self.line_buffers[usize::from(row)].names[usize::from(column)].name = name.into();
    }

    fn fetch_tms_name(&mut self, column: u16) {
        let row = self.write_pointer.row;
        let address = self.registers.pattern_name_address & (0x3C00 | ((row >> 3) << 5) | column);
        let name = self.vram_byte(address);
        self.line_buffers[usize::from(row)].names[usize::from(column)].name = name.into();
    }

    fn fetch_tms_pattern(&mut self, column: u16) {
        let row = self.write_pointer.row;
        let line = &self.line_buffers[usize::from(row)];
        let name = line.names[usize::from(column)].name;

        let pattern_generator = self.registers.pattern_generator_table_address;
        let address = match line.screen_mode {
            // Graphics II splits the screen into thirds with their own patterns and colours
            ScreenMode::GraphicsII => {
                pattern_generator & (0x2000 | ((row & 0xC0) << 5) | (name << 3) | (row & 7))
            }
            ScreenMode::MultiColour => {
                pattern_generator & (0x3800 | (name << 3) | ((row >> 2) & 7))
            }
            _ => pattern_generator & (0x3800 | (name << 3) | (row & 7)),
        };

        let pattern = self.vram_byte(address);
        self.line_buffers[usize::from(row)].patterns[usize::from(column)][0] = pattern;
    }

    fn fetch_tms_colour(&mut self, column: u16) {
        let row = self.write_pointer.row;
        let line = &self.line_buffers[usize::from(row)];
        let name = line.names[usize::from(column)].name;

        let colour_table = self.registers.colour_table_address;
        let address = match line.screen_mode {
            ScreenMode::GraphicsII => {
                colour_table & (0x2000 | ((row & 0xC0) << 5) | (name << 3) | (row & 7))
            }
            ScreenMode::MultiColour => return,
            _ => colour_table & (0x3FC0 | (name >> 3)),
        };

        let colour = self.vram_byte(address);
        self.line_buffers[usize::from(row)].patterns[usize::from(column)][1] = colour;
    }

    fn sms_sprite_attribute_address(&self, index: u8, byte: u16) -> u16 {
        self.registers.mode4.sprite_attributes & (0x3F80 | (u16::from(index) << 1) | byte)
    }

    fn fetch_sms_sprite_position(&mut self, slot: usize) {
        let row = usize::from(self.write_pointer.row);
        let Some(&sprite) = self.line_buffers[row].active_sprites().get(slot) else { return };

        let x = self.vram_byte(self.sms_sprite_attribute_address(sprite.index, 0));
        let mut name = self.vram_byte(self.sms_sprite_attribute_address(sprite.index, 1));
        if self.registers.sprites_16x16 {
            // 8x16 sprites use an even/odd pair of patterns
            name &= !1;
        }

        let sprite = &mut self.line_buffers[row].active_sprites[slot];
        sprite.x = i16::from(x) - if self.registers.shift_sprites_8px_left { 8 } else { 0 };
        sprite.name = name;
    }

    fn fetch_sms_sprite_pattern(&mut self, slot: usize) {
        let row = usize::from(self.write_pointer.row);
        let Some(&sprite) = self.line_buffers[row].active_sprites().get(slot) else { return };

        let address = self.registers.mode4.sprite_patterns
            & (0x2000 | (u16::from(sprite.name) << 5) | (u16::from(sprite.row) << 2));
        let image = [0, 1, 2, 3].map(|plane| self.vram_byte(address + plane));
        self.line_buffers[row].active_sprites[slot].image = image;
    }

    fn fetch_sms_name(&mut self, column: u16) {
        let row = self.write_pointer.row;
        let row_index = usize::from(row);
        let pixel_lines = self.mode_timing.pixel_lines;

        let scrolled_row = if self.registers.vertical_scroll_lock && column >= 24 {
            row
        } else {
            let row = row + u16::from(self.latched_vertical_scroll);
            // The 192-line name table is 28 rows tall; the taller modes use 32 rows
            if pixel_lines == 192 { row % 224 } else { row & 0xFF }
        };

        let tile_column = if self.registers.horizontal_scroll_lock && row < 16 {
            column
        } else {
            let scroll = self.line_buffers[row_index].latched_horizontal_scroll;
            let coarse_scroll = u16::from(scroll >> 3);
            (column + 32 - coarse_scroll) & 31
        };

        let offset = ((scrolled_row >> 3) << 6) | (tile_column << 1);
        let name_table = self.registers.mode4.name_table;
        let address = if self.registers.uses_extended_name_table(pixel_lines) {
            ((name_table & 0x3000) | 0x0700) + offset
        } else {
            name_table & (0x3800 | offset)
        };

        let [low, high] = [self.vram_byte(address), self.vram_byte(address | 1)];
        let flags = high;
        let tile_row = if flags.bit(2) { 7 - (scrolled_row & 7) } else { scrolled_row & 7 };

        self.line_buffers[row_index].names[usize::from(column)] = NameEntry {
            name: u16::from_le_bytes([low, high]) & 0x1FF,
            flags,
            row: tile_row as u8,
        };
    }

    fn fetch_sms_pattern(&mut self, column: u16, first_plane: usize) {
        let row = usize::from(self.write_pointer.row);
        let entry = self.line_buffers[row].names[usize::from(column)];

        let address = (entry.name << 5) | (u16::from(entry.row) << 2) | first_plane as u16;
        let planes = [self.vram_byte(address), self.vram_byte(address + 1)];

        self.line_buffers[row].patterns[usize::from(column)][first_plane..first_plane + 2]
            .copy_from_slice(&planes);
    }
}
