//! Pass 3: remap samples into 8 bits and write one output per input
//!
//! Output goes to a temporary file next to the destination and is only
//! renamed into place once its input has been fully converted.

use crate::error::RescaleError;
use crate::sample::Sample;
use crate::stream::{self, Progress, SampleBuffers};
use crate::types::{PercentileWindow, VolumeFile};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Linear map from the percentile window onto `0..=255`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    low: f64,
    range: f64,
}

impl Scaler {
    /// Fails on a window whose width is zero, negative or NaN
    pub fn new(window: PercentileWindow) -> Result<Self, RescaleError> {
        let range = window.scale_range();
        if range.is_nan() || range <= 0.0 {
            return Err(RescaleError::DegenerateRange {
                low: window.low,
                high: window.high,
            });
        }
        Ok(Self {
            low: window.low,
            range,
        })
    }

    #[inline(always)]
    #[must_use]
    // Hot path: called for every sample of pass 3
    pub fn scale(&self, value: f64) -> u8 {
        let scaled = (255.0 * (value - self.low) / self.range).trunc();
        // NaN survives clamp and then casts to 0
        scaled.clamp(0.0, 255.0) as u8
    }

    /// Remap `input` into the front of `output`
    #[inline]
    pub fn remap<S: Sample>(&self, input: &[S], output: &mut [u8]) {
        for (out, &value) in output.iter_mut().zip(input) {
            *out = self.scale(value.to_f64());
        }
    }
}

/// Byte counters for pass 3
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertTotals {
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Convert every file in order, each to its own output
pub fn convert_all<S: Sample>(
    files: &[VolumeFile],
    scaler: &Scaler,
    buffers: &mut SampleBuffers<S>,
    progress: &Progress,
) -> Result<ConvertTotals, RescaleError> {
    let mut totals = ConvertTotals::default();
    for file in files {
        let file_totals = convert_file(file, scaler, buffers, progress)?;
        totals.bytes_read += file_totals.bytes_read;
        totals.bytes_written += file_totals.bytes_written;
    }
    Ok(totals)
}

/// Convert one input file into its output file
pub fn convert_file<S: Sample>(
    file: &VolumeFile,
    scaler: &Scaler,
    buffers: &mut SampleBuffers<S>,
    progress: &Progress,
) -> Result<ConvertTotals, RescaleError> {
    let write_error = |source| RescaleError::WriteFailed {
        path: file.output.clone(),
        source,
    };

    let mut staged = NamedTempFile::new_in(staging_dir(&file.output)).map_err(write_error)?;

    let SampleBuffers { samples, bytes } = buffers;
    let mut bytes_written = 0u64;
    let bytes_read = stream::for_each_chunk(&file.input, samples, progress, |chunk| {
        let out = &mut bytes[..chunk.len()];
        scaler.remap(chunk, out);
        staged.write_all(out).map_err(write_error)?;
        bytes_written += out.len() as u64;
        Ok(())
    })?;

    set_output_permissions(&staged).map_err(write_error)?;
    staged
        .persist(&file.output)
        .map_err(|e| write_error(e.error))?;

    debug!(
        input = %file.input.display(),
        output = %file.output.display(),
        bytes_written,
        "output written"
    );
    Ok(ConvertTotals {
        bytes_read,
        bytes_written,
    })
}

/// Directory the temporary output lives in, so the final rename stays on one filesystem
fn staging_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// Temporary files are created owner-only; outputs get ordinary file permissions
#[cfg(unix)]
fn set_output_permissions(staged: &NamedTempFile) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    staged
        .as_file()
        .set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_output_permissions(_staged: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}
