//! Snapshot files: a TOML description of the chip configuration, register values and colour RAM,
//! plus an optional raw VRAM image.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;
use tms9918_config::VdpConfig;
use tms9918_core::vdp::VRAM_LEN;

// Game Gear colour RAM is 32 16-bit entries; the other Sega parts use the first 32 bytes
pub const CRAM_LEN: usize = 64;

pub const REGISTER_COUNT: usize = 11;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error parsing snapshot file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("VRAM image is {len} bytes, more than the {max} bytes of VRAM", max = VRAM_LEN)]
    VramTooLarge { len: usize },
    #[error("Snapshot has {len} bytes of colour RAM, more than the {max} allowed", max = CRAM_LEN)]
    CramTooLarge { len: usize },
    #[error("Register {0} does not exist; only registers 0-10 can be written")]
    InvalidRegister(usize),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(flatten)]
    pub config: VdpConfig,
    /// Register values in register order, starting from register 0.
    pub registers: Vec<u8>,
    /// Colour RAM bytes in upload order.
    pub cram: Vec<u8>,
    /// Raw VRAM image, relative to the snapshot file.
    pub vram: Option<PathBuf>,
}

impl Snapshot {
    /// Parses a snapshot file. A relative `vram` path is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| SnapshotError::Io { path: path.into(), source })?;

        let mut snapshot = Self::parse(&contents)?;
        if let (Some(vram), Some(parent)) = (&snapshot.vram, path.parent()) {
            snapshot.vram = Some(parent.join(vram));
        }

        Ok(snapshot)
    }

    pub fn parse(contents: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = toml::from_str(contents)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.registers.len() > REGISTER_COUNT {
            return Err(SnapshotError::InvalidRegister(REGISTER_COUNT));
        }

        if self.cram.len() > CRAM_LEN {
            return Err(SnapshotError::CramTooLarge { len: self.cram.len() });
        }

        Ok(())
    }

    /// Overrides a single register value, growing the register list as needed.
    pub fn set_register(&mut self, register: usize, value: u8) -> Result<(), SnapshotError> {
        if register >= REGISTER_COUNT {
            return Err(SnapshotError::InvalidRegister(register));
        }

        if self.registers.len() <= register {
            self.registers.resize(register + 1, 0);
        }
        self.registers[register] = value;

        Ok(())
    }
}

pub fn load_vram(path: &Path) -> Result<Vec<u8>, SnapshotError> {
    let vram = fs::read(path).map_err(|source| SnapshotError::Io { path: path.into(), source })?;
    if vram.len() > VRAM_LEN {
        return Err(SnapshotError::VramTooLarge { len: vram.len() });
    }

    log::info!("Loaded {} bytes of VRAM from '{}'", vram.len(), path.display());

    Ok(vram)
}
