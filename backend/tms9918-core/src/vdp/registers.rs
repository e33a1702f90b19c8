use bincode::{Decode, Encode};
use tms9918_config::Personality;
use vdp_common::num::GetBit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ControlWriteFlag {
    #[default]
    First,
    Second,
}

impl ControlWriteFlag {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ScreenMode {
    #[default]
    Blank,
    Text,
    MultiColour,
    GraphicsI,
    GraphicsII,
    Mode4,
}

/// Table addresses as seen by Mode 4, where some bits of the TMS-style registers act as masks.
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct Mode4Addresses {
    pub name_table: u16,
    pub sprite_attributes: u16,
    pub sprite_patterns: u16,
}

/// Table addresses are stored with all don't-care bits set so that fetches can AND in the
/// row/column/index bits; unused register bits then act as masks exactly as they do on hardware.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Registers {
    personality: Personality,
    pub blank_display: bool,
    pub frame_interrupt_enabled: bool,
    pub line_interrupt_enabled: bool,
    pub mode1_enable: bool,
    pub mode2_enable: bool,
    pub mode3_enable: bool,
    pub mode4_enable: bool,
    pub sprites_16x16: bool,
    pub sprites_magnified: bool,
    pub pattern_name_address: u16,
    pub colour_table_address: u16,
    pub pattern_generator_table_address: u16,
    pub sprite_attribute_table_address: u16,
    pub sprite_generator_table_address: u16,
    pub mode4: Mode4Addresses,
    pub text_colour: u8,
    pub background_colour: u8,
    pub vertical_scroll_lock: bool,
    pub horizontal_scroll_lock: bool,
    pub hide_left_column: bool,
    pub shift_sprites_8px_left: bool,
    pub horizontal_scroll: u8,
    pub vertical_scroll: u8,
    pub line_interrupt_target: u8,
}

impl Registers {
    pub fn new(personality: Personality) -> Self {
        Self {
            personality,
            blank_display: true,
            frame_interrupt_enabled: false,
            line_interrupt_enabled: false,
            mode1_enable: false,
            mode2_enable: false,
            mode3_enable: false,
            mode4_enable: false,
            sprites_16x16: false,
            sprites_magnified: false,
            pattern_name_address: 0x3FF,
            colour_table_address: 0x3F,
            pattern_generator_table_address: 0x7FF,
            sprite_attribute_table_address: 0x7F,
            sprite_generator_table_address: 0x7FF,
            mode4: Mode4Addresses {
                name_table: if personality.is_sms1() { 0x3FF } else { 0x7FF },
                sprite_attributes: if personality.is_sms1() { 0x7F } else { 0xFF },
                sprite_patterns: if personality.is_sms1() { 0x7FF } else { 0x1FFF },
            },
            text_colour: 0,
            background_colour: 0,
            vertical_scroll_lock: false,
            horizontal_scroll_lock: false,
            hide_left_column: false,
            shift_sprites_8px_left: false,
            horizontal_scroll: 0,
            vertical_scroll: 0,
            line_interrupt_target: 0,
        }
    }

    pub fn write(&mut self, register: u8, value: u8) {
        log::debug!("VDP register {register} set to {value:02X}");

        let sega = self.personality.is_sega_vdp();
        let sms1 = self.personality.is_sms1();

        match register {
            0 => {
                // Mode control #1
                if sega {
                    self.vertical_scroll_lock = value.bit(7);
                    self.horizontal_scroll_lock = value.bit(6);
                    self.hide_left_column = value.bit(5);
                    self.line_interrupt_enabled = value.bit(4);
                    self.shift_sprites_8px_left = value.bit(3);
                    self.mode4_enable = value.bit(2);

                    log::debug!("  Vertical scroll lock: {}", self.vertical_scroll_lock);
                    log::debug!("  Horizontal scroll lock: {}", self.horizontal_scroll_lock);
                    log::debug!("  Hide left column: {}", self.hide_left_column);
                    log::debug!("  Line interrupt enabled: {}", self.line_interrupt_enabled);
                    log::debug!("  Shift sprites left: {}", self.shift_sprites_8px_left);
                    log::debug!("  Mode 4: {}", self.mode4_enable);
                }
                self.mode2_enable = value.bit(1);

                log::debug!("  Mode 2: {}", self.mode2_enable);
            }
            1 => {
                // Mode control #2
                self.blank_display = !value.bit(6);
                self.frame_interrupt_enabled = value.bit(5);
                self.mode1_enable = value.bit(4);
                self.mode3_enable = value.bit(3);
                self.sprites_16x16 = value.bit(1);
                self.sprites_magnified = value.bit(0);

                log::debug!("  Display blanked: {}", self.blank_display);
                log::debug!("  Frame interrupt enabled: {}", self.frame_interrupt_enabled);
                log::debug!("  Mode 1: {}, Mode 3: {}", self.mode1_enable, self.mode3_enable);
                log::debug!("  Sprite height: {}", self.sprite_height());
            }
            2 => {
                self.pattern_name_address = (u16::from(value & 0x0F) << 10) | 0x3FF;
                self.mode4.name_table =
                    self.pattern_name_address | if sms1 { 0x000 } else { 0x400 };

                log::debug!("  Pattern name table address: {:04X}", self.pattern_name_address);
            }
            3 => {
                self.colour_table_address = (u16::from(value) << 6) | 0x3F;

                log::debug!("  Colour table address: {:04X}", self.colour_table_address);
            }
            4 => {
                self.pattern_generator_table_address = (u16::from(value & 0x07) << 11) | 0x7FF;

                log::debug!(
                    "  Pattern generator table address: {:04X}",
                    self.pattern_generator_table_address
                );
            }
            5 => {
                self.sprite_attribute_table_address = (u16::from(value & 0x7F) << 7) | 0x7F;
                self.mode4.sprite_attributes =
                    self.sprite_attribute_table_address | if sms1 { 0x00 } else { 0x80 };

                log::debug!(
                    "  Sprite attribute table address: {:04X}",
                    self.sprite_attribute_table_address
                );
            }
            6 => {
                self.sprite_generator_table_address = (u16::from(value & 0x07) << 11) | 0x7FF;
                self.mode4.sprite_patterns =
                    self.sprite_generator_table_address | if sms1 { 0x0000 } else { 0x1800 };

                log::debug!(
                    "  Sprite generator table address: {:04X}",
                    self.sprite_generator_table_address
                );
            }
            7 => {
                self.text_colour = value >> 4;
                self.background_colour = value & 0x0F;

                log::debug!("  Text colour: {}", self.text_colour);
                log::debug!("  Backdrop colour: {}", self.background_colour);
            }
            8 if sega => {
                self.horizontal_scroll = value;

                log::debug!("  X scroll: {value}");
            }
            9 if sega => {
                self.vertical_scroll = value;

                log::debug!("  Y scroll: {value}");
            }
            10 if sega => {
                self.line_interrupt_target = value;

                log::debug!("  Line interrupt counter reload: {value}");
            }
            _ => {
                log::warn!("Ignoring write to unknown VDP register {register}: {value:02X}");
            }
        }
    }

    /// Derived on every line boundary so that mode changes land at the start of a line.
    pub fn screen_mode(&self) -> ScreenMode {
        if self.blank_display {
            return ScreenMode::Blank;
        }

        if self.personality.is_sega_vdp() && self.mode4_enable {
            return ScreenMode::Mode4;
        }

        match (self.mode1_enable, self.mode2_enable, self.mode3_enable) {
            (false, false, false) => ScreenMode::GraphicsI,
            (true, false, false) => ScreenMode::Text,
            (false, true, false) => ScreenMode::GraphicsII,
            (false, false, true) => ScreenMode::MultiColour,
            _ => ScreenMode::Blank,
        }
    }

    /// Height of a sprite in scanlines: 8 or 16 depending on size, doubled by magnification.
    pub fn sprite_height(&self) -> u16 {
        let base = if self.sprites_16x16 { 16 } else { 8 };
        base << u16::from(self.sprites_magnified)
    }

    /// Mode 4 uses a 224-row name table layout in the 224 and 240 line modes.
    pub fn uses_extended_name_table(&self, pixel_lines: u16) -> bool {
        self.personality.is_sega_vdp() && pixel_lines != 192
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn screen_mode_from_mode_bits() {
        let mut registers = Registers::new(Personality::Tms9918a);
        assert_eq!(registers.screen_mode(), ScreenMode::Blank);

        registers.write(1, 0x40);
        assert_eq!(registers.screen_mode(), ScreenMode::GraphicsI);

        registers.write(1, 0x50);
        assert_eq!(registers.screen_mode(), ScreenMode::Text);

        registers.write(1, 0x48);
        assert_eq!(registers.screen_mode(), ScreenMode::MultiColour);

        registers.write(1, 0x40);
        registers.write(0, 0x02);
        assert_eq!(registers.screen_mode(), ScreenMode::GraphicsII);

        registers.write(1, 0x50);
        assert_eq!(registers.screen_mode(), ScreenMode::Blank);
    }

    #[test]
    fn mode4_only_on_sega_parts() {
        let mut tms = Registers::new(Personality::Tms9918a);
        tms.write(0, 0x04);
        tms.write(1, 0x40);
        assert_eq!(tms.screen_mode(), ScreenMode::GraphicsI);

        let mut sms = Registers::new(Personality::Sms2Vdp);
        sms.write(0, 0x04);
        sms.write(1, 0x40);
        assert_eq!(sms.screen_mode(), ScreenMode::Mode4);
    }

    #[test]
    fn sprite_height_follows_both_flags() {
        let mut registers = Registers::new(Personality::Tms9918a);
        assert_eq!(registers.sprite_height(), 8);

        registers.write(1, 0x02);
        assert_eq!(registers.sprite_height(), 16);

        registers.write(1, 0x03);
        assert_eq!(registers.sprite_height(), 32);

        registers.write(1, 0x01);
        assert_eq!(registers.sprite_height(), 16);
    }

    #[test]
    fn table_addresses_keep_mask_bits() {
        let mut registers = Registers::new(Personality::Sms2Vdp);
        registers.write(2, 0xFF);
        assert_eq!(registers.pattern_name_address, 0x3FFF);

        registers.write(2, 0x0E);
        assert_eq!(registers.pattern_name_address, 0x3BFF);
        assert_eq!(registers.mode4.name_table, 0x3FFF);

        registers.write(5, 0x7E);
        assert_eq!(registers.sprite_attribute_table_address, 0x3F7F);
        assert_eq!(registers.mode4.sprite_attributes, 0x3FFF);

        registers.write(4, 0xFF);
        assert_eq!(registers.pattern_generator_table_address, 0x3FFF);
    }

    #[test]
    fn sms1_keeps_quirk_mask_bits_clear() {
        let mut registers = Registers::new(Personality::SmsVdp);
        registers.write(2, 0x0E);
        assert_eq!(registers.mode4.name_table, 0x3BFF);

        registers.write(6, 0x04);
        assert_eq!(registers.mode4.sprite_patterns, 0x27FF);
    }

    #[test]
    fn sega_only_registers_ignored_on_tms() {
        let mut registers = Registers::new(Personality::Tms9918a);
        registers.write(0, 0xF4);
        assert!(!registers.vertical_scroll_lock);
        assert!(!registers.line_interrupt_enabled);
        assert!(!registers.mode4_enable);

        registers.write(9, 0x40);
        assert_eq!(registers.vertical_scroll, 0);
    }
}
