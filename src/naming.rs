//! Output file naming
//!
//! An output path is its input path with a suffix appended. The suffix is
//! either fixed, or derived from the volume dimensions recorded in the
//! `.vgi` file that sits next to the input volume.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_SUFFIX: &str = ".8bit.scaled.raw";

/// How each output file name is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixPolicy {
    /// Append the same suffix to every input
    Fixed(String),
    /// Read the volume size from the companion `.vgi` file, else use `fallback`
    FromVolumeInfo { fallback: String },
}

impl Default for SuffixPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SUFFIX.to_string())
    }
}

/// Volume dimensions in voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSize {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl VolumeSize {
    /// Suffix naming an 8-bit volume of this size, e.g. `512x512x256x8bit.raw`
    #[must_use]
    pub fn suffix(&self) -> String {
        format!("{self}x8bit.raw")
    }
}

impl fmt::Display for VolumeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{x}x{y}x{z}", x = self.x, y = self.y, z = self.z)
    }
}

/// Output path for `input` under `policy`
#[must_use]
pub fn output_path(input: &Path, policy: &SuffixPolicy) -> PathBuf {
    let suffix = match policy {
        SuffixPolicy::Fixed(suffix) => suffix.clone(),
        SuffixPolicy::FromVolumeInfo { fallback } => {
            let vgi = volume_info_path(input);
            match read_volume_size(&vgi) {
                Ok(size) => {
                    let suffix = size.suffix();
                    info!(vgi = %vgi.display(), "size will be {size}, output suffix set to {suffix}");
                    suffix
                }
                Err(e) => {
                    warn!("{e:#}; using suffix {fallback}");
                    fallback.clone()
                }
            }
        }
    };
    append_suffix(input, &suffix)
}

/// The `.vgi` companion of a volume: its last extension swapped for `vgi`
#[must_use]
pub fn volume_info_path(input: &Path) -> PathBuf {
    input.with_extension("vgi")
}

/// Read the volume size recorded in a `.vgi` file
pub fn read_volume_size(vgi: &Path) -> Result<VolumeSize> {
    let text = fs::read(vgi)
        .with_context(|| format!("Failed to read volume info file {}", vgi.display()))?;
    let text = String::from_utf8_lossy(&text);
    parse_volume_size(&text)
        .with_context(|| format!("No 'size = X Y Z' line in {}", vgi.display()))
}

/// First `size =` line with three integers on it
#[must_use]
pub fn parse_volume_size(text: &str) -> Option<VolumeSize> {
    let line = text.lines().find(|line| line.contains("size ="))?;
    let mut numbers = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse::<u64>);

    let x = numbers.next()?.ok()?;
    let y = numbers.next()?.ok()?;
    let z = numbers.next()?.ok()?;
    Some(VolumeSize { x, y, z })
}

fn append_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
