use crate::vdp::{STATUS_SPRITE_OVERFLOW, Vdp};

impl Vdp {
    /// Considers one sprite attribute table entry for the line after the write pointer's.
    pub(super) fn posit_sprite(&mut self, sprite_number: u8, sprite_y: u8) {
        // The status register reports the most recently examined sprite until overflow freezes it
        if self.status & STATUS_SPRITE_OVERFLOW == 0 {
            self.status = (self.status & !0x1F) | (sprite_number & 0x1F);
        }

        let total_lines = self.mode_timing.total_lines;
        let next_row = (self.write_pointer.row + 1) % total_lines;
        let buffer = &mut self.line_buffers[usize::from(next_row)];

        if buffer.sprites_stopped {
            return;
        }

        if self.mode_timing.allow_sprite_terminator
            && sprite_y == self.mode_timing.sprite_terminator
        {
            buffer.sprites_stopped = true;
            return;
        }

        let sprite_row = (i32::from(next_row) - ((i32::from(sprite_y) + 1) & 0xFF)) & 0xFF;
        if sprite_row >= i32::from(self.registers.sprite_height()) {
            return;
        }

        if buffer.active_sprite_slot == usize::from(self.mode_timing.maximum_visible_sprites) {
            log::trace!("Sprite overflow on line {next_row} at sprite {sprite_number}");
            self.status |= STATUS_SPRITE_OVERFLOW;
            buffer.sprites_stopped = true;
            return;
        }

        let sprite = &mut buffer.active_sprites[buffer.active_sprite_slot];
        sprite.index = sprite_number;
        sprite.row = (sprite_row >> u8::from(self.registers.sprites_magnified)) as u8;
        buffer.active_sprite_slot += 1;
    }
}
