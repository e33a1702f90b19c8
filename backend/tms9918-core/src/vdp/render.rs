//! Pixel generation for the part of a line between the borders
//!
//! Paint routines may be called several times per line, each time for the next run of pixels, so
//! sprite shift positions persist in the line buffer between calls.

use crate::vdp::colors::tms_color;
use crate::vdp::linebuffer::ActiveSprite;
use crate::vdp::registers::ScreenMode;
use crate::vdp::{STATUS_SPRITE_COLLISION, Vdp};
use vdp_common::frontend::Color;

const fn reverse_bits_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
}

/// Patterns are stored MSB-first; reversing them lets paint shift pixels out of bit 0.
const REVERSE_BITS: [u8; 256] = reverse_bits_table();

// Sprite colour index 0 is transparent
const TRANSPARENT: u8 = 0;

fn clip_sprites_at_line_start(sprites: &mut [ActiveSprite], shift_advance: i16) {
    for sprite in sprites {
        if sprite.x < 0 {
            sprite.shift_position -= shift_advance * sprite.x;
        }
    }
}

/// Gathers pixel `bit` (7 = leftmost) from four bit-planes into a 4-bit colour index.
fn planar_pixel(planes: [u8; 4], bit: u8) -> u8 {
    planes.iter().enumerate().fold(0, |color, (plane, &byte)| {
        color | (((byte >> bit) & 1) << plane)
    })
}

impl Vdp {
    pub(super) fn paint_tms_character(
        &mut self,
        start: usize,
        end: usize,
        cram_dot: Option<Color>,
    ) {
        let personality = self.personality;
        let background = self.registers.background_colour;
        let substitute = |index: u8| if index == TRANSPARENT { background } else { index };

        let line = &mut self.line_buffers[usize::from(self.read_pointer.row)];
        let pixels = &mut self.pixel_line[..];

        if line.screen_mode == ScreenMode::MultiColour {
            for (column, pixel) in pixels.iter_mut().enumerate().take(end).skip(start) {
                let pattern = line.patterns[column >> 3][0];
                let nibble = (pattern >> ((column & 4) ^ 4)) & 0x0F;
                *pixel = tms_color(personality, nibble);
            }
        } else {
            let mut column = start;
            while column < end {
                let [pattern, colour, ..] = line.patterns[column >> 3];
                let colours = [
                    tms_color(personality, substitute(colour & 0x0F)),
                    tms_color(personality, substitute(colour >> 4)),
                ];

                let tile_end = end.min((column & !7) + 8);
                let mut bits = REVERSE_BITS[usize::from(pattern)] >> (column & 7);
                for pixel in &mut pixels[column..tile_end] {
                    *pixel = colours[usize::from(bits & 1)];
                    bits >>= 1;
                }
                column = tile_end;
            }
        }

        if line.active_sprite_slot > 0 {
            let shift_advance = if self.registers.sprites_magnified { 1 } else { 2 };
            let sprites = &mut line.active_sprites[..line.active_sprite_slot];
            if start == 0 {
                clip_sprites_at_line_start(sprites, shift_advance);
            }

            let shifter_target = if self.registers.sprites_16x16 { 32 } else { 16 };
            let mut sprite_coverage = [false; 256];
            let mut collision = false;

            // Back to front, so that lower-numbered sprites end up on top
            for sprite in sprites.iter_mut().rev() {
                let first_column = start.max(sprite.x.max(0) as usize);
                for column in first_column..end {
                    if sprite.shift_position >= shifter_target {
                        break;
                    }

                    let shift = ((sprite.shift_position >> 1) ^ 7) as u8;
                    let sprite_pixel =
                        (sprite.image[usize::from(shift >> 3)] >> (shift & 7)) & 1 != 0;

                    collision |= sprite_coverage[column] && sprite_pixel;
                    sprite_coverage[column] |= sprite_pixel;

                    let colour = sprite.image[2] & 0x0F;
                    if sprite_pixel && colour != TRANSPARENT {
                        pixels[column] = tms_color(personality, colour);
                    }

                    sprite.shift_position += shift_advance;
                }
            }

            if collision {
                self.status |= STATUS_SPRITE_COLLISION;
            }
        }

        if let Some(dot) = cram_dot {
            pixels[start] |= dot;
        }
    }

    pub(super) fn paint_tms_text(&mut self, start: usize, end: usize, cram_dot: Option<Color>) {
        let colours = [
            tms_color(self.personality, self.registers.background_colour),
            tms_color(self.personality, self.registers.text_colour),
        ];

        let line = &self.line_buffers[usize::from(self.read_pointer.row)];
        let pixels = &mut self.pixel_line[..];

        // Each character is the top six bits of its pattern byte
        let mut column = start;
        while column < end {
            let character = column / 6;
            let tile_end = end.min((character + 1) * 6);

            let pattern = line.patterns[character][0];
            let mut bits = REVERSE_BITS[usize::from(pattern)] >> (column % 6);
            for pixel in &mut pixels[column..tile_end] {
                *pixel = colours[usize::from(bits & 1)];
                bits >>= 1;
            }
            column = tile_end;
        }

        if let Some(dot) = cram_dot {
            pixels[start] |= dot;
        }
    }

    pub(super) fn paint_sms(&mut self, start: usize, end: usize, cram_dot: Option<Color>) {
        let row = self.read_pointer.row;
        let registers = &self.registers;
        let line = &mut self.line_buffers[usize::from(row)];

        // 5-bit colour RAM indices; bit 5 marks background pixels with priority over sprites
        let mut colour_buffer = [0_u8; 256];
        let border_index = 0x10 | registers.background_colour;

        let fine_scroll = if registers.horizontal_scroll_lock && row < 16 {
            0
        } else {
            usize::from(line.latched_horizontal_scroll & 7)
        };

        for (column, index) in colour_buffer.iter_mut().enumerate().take(end).skip(start) {
            if column < fine_scroll {
                *index = border_index;
                continue;
            }

            let x = column - fine_scroll;
            let tile = x >> 3;
            let entry = line.names[tile];
            let bit = if entry.flags & 0x02 != 0 { x & 7 } else { 7 - (x & 7) };
            let colour = planar_pixel(line.patterns[tile], bit as u8);

            *index = colour | ((entry.flags & 0x18) << 1);
            if colour == 0 {
                // Transparent background pixels never hold priority
                *index &= !0x20;
            }
        }

        if line.active_sprite_slot > 0 {
            let shift_advance = if registers.sprites_magnified { 1 } else { 2 };
            let sprites = &mut line.active_sprites[..line.active_sprite_slot];
            if start == 0 {
                clip_sprites_at_line_start(sprites, shift_advance);
            }

            let mut sprite_buffer = [0_u8; 256];
            let mut collision = false;

            for sprite in sprites.iter_mut().rev() {
                let first_column = start.max(sprite.x.max(0) as usize);
                for column in first_column..end {
                    if sprite.shift_position >= 16 {
                        break;
                    }

                    let bit = 7 - (sprite.shift_position >> 1) as u8;
                    let colour = planar_pixel(sprite.image, bit);
                    if colour != TRANSPARENT {
                        collision |= sprite_buffer[column] != 0;
                        sprite_buffer[column] = colour | 0x10;
                    }

                    sprite.shift_position += shift_advance;
                }
            }

            let sprite_pixels = &sprite_buffer[start..end];
            for (index, &sprite) in colour_buffer[start..end].iter_mut().zip(sprite_pixels) {
                if sprite != 0 && *index & 0x20 == 0 {
                    *index = sprite;
                }
            }

            if collision {
                self.status |= STATUS_SPRITE_COLLISION;
            }
        }

        let colour_ram = &self.colour_ram;
        let indices = &colour_buffer[start..end];
        for (pixel, &index) in self.pixel_line[start..end].iter_mut().zip(indices) {
            *pixel = colour_ram[usize::from(index & 0x1F)];
        }

        if let Some(dot) = cram_dot {
            self.pixel_line[start] |= dot;
        }

        if end == 256 && registers.hide_left_column {
            self.pixel_line[..8].fill(colour_ram[usize::from(border_index)]);
        }
    }
}
