//! Emulation core for the TMS9918 family of video display processors: the TMS9918A, the Yamaha
//! V9938/V9958 running TMS-compatible modes, and the Sega Master System, Game Gear and Mega Drive
//! VDPs.
//!
//! The chip is modelled as two pointers walking the same ring of line buffers. The write pointer
//! performs the chip's memory fetches slot by slot; the read pointer trails it by a fixed lag and
//! turns the fetched data into border, sync and pixel output for a [`ScanTarget`].
//!
//! [`ScanTarget`]: vdp_common::frontend::ScanTarget

pub mod vdp;

pub use tms9918_config::{Personality, VdpConfig};
pub use vdp::{OUTPUT_LAG, Vdp};
