use tms9918_config::Personality;
use vdp_common::frontend::Color;

/// The fixed TMS9918A palette; entry 0 is transparent and shows as black.
pub const TMS_PALETTE: &[Color; 16] = &[
    Color::rgb(0, 0, 0),
    Color::rgb(0, 0, 0),
    Color::rgb(33, 200, 66),
    Color::rgb(94, 220, 120),
    Color::rgb(84, 85, 237),
    Color::rgb(125, 118, 252),
    Color::rgb(212, 82, 77),
    Color::rgb(66, 235, 245),
    Color::rgb(252, 85, 84),
    Color::rgb(255, 121, 120),
    Color::rgb(212, 193, 84),
    Color::rgb(230, 206, 128),
    Color::rgb(33, 176, 59),
    Color::rgb(201, 91, 186),
    Color::rgb(204, 204, 204),
    Color::rgb(255, 255, 255),
];

/// Colours the Sega parts substitute for the TMS palette in the legacy modes, as 6-bit
/// BBGGRR values.
const TMS_TO_SMS_COLOR: &[u8; 16] = &[
    0x00, // Transparent (Black)
    0x00, // Black
    0x08, // Green 0
    0x0C, // Green 2
    0x10, // Blue 0
    0x30, // Blue 1
    0x01, // Red 0
    0x3C, // Cyan
    0x02, // Red 1
    0x03, // Red 2
    0x05, // Yellow 0
    0x0F, // Yellow 1
    0x04, // Green 1
    0x33, // Pink
    0x15, // Gray
    0x3F, // White
];

// Blue is non-linear on the Master System DAC
const SMS_RED_GREEN_LEVELS: [u8; 4] = [0, 85, 170, 255];
const SMS_BLUE_LEVELS: [u8; 4] = [0, 104, 170, 255];

#[must_use]
pub fn sms_color_to_rgb(color: u8) -> Color {
    let r = SMS_RED_GREEN_LEVELS[usize::from(color & 0x03)];
    let g = SMS_RED_GREEN_LEVELS[usize::from((color >> 2) & 0x03)];
    let b = SMS_BLUE_LEVELS[usize::from((color >> 4) & 0x03)];
    Color::rgb(r, g, b)
}

#[must_use]
pub fn gg_color_to_rgb(color: u16) -> Color {
    // 4-bit components scale by 17 to cover 0-255
    let r = (color & 0x0F) as u8 * 17;
    let g = ((color >> 4) & 0x0F) as u8 * 17;
    let b = ((color >> 8) & 0x0F) as u8 * 17;
    Color::rgb(r, g, b)
}

/// Colour shown for a 4-bit TMS colour index.
#[must_use]
pub fn tms_color(personality: Personality, index: u8) -> Color {
    let index = usize::from(index & 0x0F);
    if personality.is_sega_vdp() {
        sms_color_to_rgb(TMS_TO_SMS_COLOR[index])
    } else {
        TMS_PALETTE[index]
    }
}
