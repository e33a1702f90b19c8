use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, Encode, Decode)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    #[must_use]
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether the color carries no light, i.e. can be emitted as a blank level.
    #[must_use]
    #[inline]
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::BLACK
    }
}

impl BitOr for Color {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self { r: self.r | rhs.r, g: self.g | rhs.g, b: self.b | rhs.b, a: self.a | rhs.a }
    }
}

impl BitOrAssign for Color {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TvStandard {
    #[default]
    Ntsc,
    Pal,
}

impl Display for TvStandard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ntsc => write!(f, "NTSC"),
            Self::Pal => write!(f, "PAL"),
        }
    }
}

/// Sink for the composite signal produced by a video chip.
///
/// All durations are in output units: four units per internal chip cycle, so one pixel of a
/// 342-cycle line lasts four units.
pub trait ScanTarget {
    /// Sync level for `duration` units.
    fn output_sync(&mut self, duration: u32);

    /// Blanking level for `duration` units.
    fn output_blank(&mut self, duration: u32);

    /// Colour burst for `duration` units.
    fn output_colour_burst(&mut self, duration: u32);

    /// A solid colour for `duration` units, used for borders.
    fn output_level(&mut self, duration: u32, color: Color);

    /// Announces an upcoming run of `width` pixels.
    ///
    /// Returning false refuses the span; the chip then skips computing its pixels but still
    /// reports its duration through [`Self::commit_span`].
    fn begin_span(&mut self, width: usize) -> bool;

    /// Completes the span most recently announced by [`Self::begin_span`].
    ///
    /// `pixels` is empty if the span was refused.
    fn commit_span(&mut self, duration: u32, pixels: &[Color]);
}
