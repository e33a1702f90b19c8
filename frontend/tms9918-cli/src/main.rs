mod capture;
mod snapshot;

use crate::capture::FrameCapture;
use crate::snapshot::Snapshot;
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use tms9918_core::{Personality, Vdp};
use vdp_common::frontend::{ScanTarget, TvStandard};

// Long enough for a queued access to reach an external slot on a blanked line
const UPLOAD_HALF_CYCLES: u32 = 32;

// Short enough that stopping right after vertical sync ends never draws into the captured rows
const CAPTURE_HALF_CYCLES: u32 = 32;

#[derive(Parser)]
struct Args {
    /// Snapshot file (TOML) with the chip configuration, register values and colour RAM
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Raw VRAM image to upload, overriding the snapshot's VRAM image
    #[arg(long)]
    vram: Option<PathBuf>,

    /// Chip variant, overriding the snapshot
    #[arg(long)]
    personality: Option<Personality>,

    /// TV standard (ntsc / pal), overriding the snapshot
    #[arg(long)]
    tv_standard: Option<TvStandard>,

    /// Register override as N=VALUE, where VALUE may be hex with a 0x prefix; may be repeated
    #[arg(long = "register", value_parser = parse_register_assignment)]
    registers: Vec<(usize, u8)>,

    /// Number of complete frames to run; the last one is captured
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// Output PNG path
    #[arg(short = 'o', long, default_value = "frame.png")]
    output: PathBuf,

    /// Fix the power-on position within the frame instead of choosing one at random
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn snapshot(&self) -> anyhow::Result<Snapshot> {
        let mut snapshot = match &self.config {
            Some(path) => Snapshot::load(path)
                .with_context(|| format!("Failed to load snapshot from '{}'", path.display()))?,
            None => Snapshot::default(),
        };

        if let Some(personality) = self.personality {
            snapshot.config.personality = personality;
        }
        if let Some(tv_standard) = self.tv_standard {
            snapshot.config.tv_standard = tv_standard;
        }
        if let Some(seed) = self.seed {
            snapshot.config.starting_phase_seed = Some(seed);
        }
        if let Some(vram) = &self.vram {
            snapshot.vram = Some(vram.clone());
        }

        for &(register, value) in &self.registers {
            snapshot.set_register(register, value)?;
        }

        Ok(snapshot)
    }
}

fn parse_register_assignment(s: &str) -> Result<(usize, u8), String> {
    let (register, value) =
        s.split_once('=').ok_or_else(|| format!("expected N=VALUE, got '{s}'"))?;

    let register = register
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid register number '{register}': {err}"))?;

    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    };
    let value = parsed.map_err(|err| format!("invalid register value '{value}': {err}"))?;

    Ok((register, value))
}

fn write_register(vdp: &mut Vdp, register: u8, value: u8) {
    vdp.write(1, value);
    vdp.write(1, 0x80 | register);
}

fn upload<T: ScanTarget>(vdp: &mut Vdp, address_code: u8, bytes: &[u8], target: &mut T) {
    vdp.write(1, 0x00);
    vdp.write(1, address_code);

    for &byte in bytes {
        vdp.write(0, byte);
        vdp.run_for(UPLOAD_HALF_CYCLES, target);
    }
}

fn load_into_vdp<T: ScanTarget>(
    vdp: &mut Vdp,
    snapshot: &Snapshot,
    target: &mut T,
) -> anyhow::Result<()> {
    // Blanked lines leave most access slots free
    write_register(vdp, 1, 0x00);

    if let Some(path) = &snapshot.vram {
        let vram = snapshot::load_vram(path)?;
        upload(vdp, 0x40, &vram, target);
    }

    if !snapshot.cram.is_empty() {
        if vdp.personality().is_sega_vdp() {
            upload(vdp, 0xC0, &snapshot.cram, target);
        } else {
            log::warn!(
                "Ignoring colour RAM in snapshot; {} has a fixed palette",
                vdp.personality()
            );
        }
    }

    for (register, &value) in snapshot.registers.iter().enumerate() {
        write_register(vdp, register as u8, value);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let snapshot = args.snapshot()?;

    log::info!(
        "Running {} ({}) for {} frame(s)",
        snapshot.config.personality,
        snapshot.config.tv_standard,
        args.frames
    );

    let mut vdp = Vdp::from_config(&snapshot.config);
    let mut capture = FrameCapture::new(vdp.total_lines());

    load_into_vdp(&mut vdp, &snapshot, &mut capture)?;

    // The frame in progress when the registers were written is discarded
    let target_frames = capture.frames_completed() + args.frames + 1;
    while capture.frames_completed() < target_frames {
        vdp.run_for(CAPTURE_HALF_CYCLES, &mut capture);
    }

    let bytes: &[u8] = bytemuck::cast_slice(capture.pixels());
    image::save_buffer(
        &args.output,
        bytes,
        capture.width(),
        capture.height(),
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("Failed to write PNG to '{}'", args.output.display()))?;

    log::info!(
        "Wrote {}x{} frame to '{}'",
        capture.width(),
        capture.height(),
        args.output.display()
    );

    Ok(())
}
