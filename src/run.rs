//! Run orchestration
//!
//! Preflight, then the three read passes in order over every input file,
//! with one buffer pair shared by all of them.

use crate::convert::{self, Scaler};
use crate::error::RescaleError;
use crate::naming::{self, SuffixPolicy};
use crate::sample::{Sample, SampleKind};
use crate::stats::{self, BinLayout};
use crate::stream::{self, Pass, Progress, SampleBuffers};
use crate::types::{ByteSize, Extent, PercentileWindow, Threshold, VolumeFile};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_BINS: usize = 65536;
pub const DEFAULT_BUFFER_COUNT: u64 = 100_000_000;
pub const MAX_BUFFER_COUNT: u64 = 100_000_000_000;

/// Validated settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub sample_kind: SampleKind,
    pub threshold: Threshold,
    pub bins: NonZeroUsize,
    /// Samples per read; the output buffer has the same element count
    pub buffer_count: NonZeroUsize,
    pub suffix: SuffixPolicy,
    pub parallel_histogram: bool,
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sample_kind: SampleKind::F32,
            threshold: Threshold::default(),
            bins: NonZeroUsize::new(DEFAULT_BINS).unwrap_or(NonZeroUsize::MIN),
            buffer_count: NonZeroUsize::new(DEFAULT_BUFFER_COUNT as usize)
                .unwrap_or(NonZeroUsize::MIN),
            suffix: SuffixPolicy::default(),
            parallel_histogram: false,
            show_progress: true,
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files: Vec<VolumeFile>,
    pub input_bytes: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub extent: Extent,
    pub window: PercentileWindow,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "converted {n} file(s): read {read}, wrote {written}; total processing time was {minutes:.4} minutes",
            n = self.files.len(),
            read = ByteSize(self.bytes_read),
            written = ByteSize(self.bytes_written),
            minutes = self.elapsed.as_secs_f64() / 60.0
        )
    }
}

/// Rescale every file in `inputs` to 8 bits against one shared percentile window
pub fn run(config: &RunConfig, inputs: &[PathBuf]) -> Result<RunSummary, RescaleError> {
    let kind = config.sample_kind;
    kind.check_width()?;
    if inputs.is_empty() {
        return Err(RescaleError::NoInputFiles { kind });
    }

    match kind {
        SampleKind::F32 => run_typed::<f32>(config, inputs),
        SampleKind::U16 => run_typed::<u16>(config, inputs),
    }
}

/// Check every input before any pass starts; the first bad file aborts
pub fn preflight(
    inputs: &[PathBuf],
    kind: SampleKind,
    policy: &SuffixPolicy,
) -> Result<Vec<VolumeFile>, RescaleError> {
    info!("preflight checks: verifying {} input file(s)", inputs.len());

    let width = kind.byte_width();
    let mut total = 0u64;
    let mut files = Vec::with_capacity(inputs.len());

    for path in inputs {
        let size = input_size(path)?;
        if size % width as u64 != 0 {
            return Err(RescaleError::MisalignedInput {
                path: path.clone(),
                size,
                width,
            });
        }

        total += size;
        info!("total size to read is now {}", ByteSize(total));

        let output = naming::output_path(path, policy);
        debug!("added file {} to the list of output files", output.display());
        files.push(VolumeFile {
            input: path.clone(),
            output,
            size,
        });
    }

    let input_set: HashSet<&Path> = files.iter().map(|f| f.input.as_path()).collect();
    if let Some(file) = files.iter().find(|f| input_set.contains(f.output.as_path())) {
        return Err(RescaleError::OutputCollision {
            path: file.output.clone(),
        });
    }

    Ok(files)
}

fn input_size(path: &Path) -> Result<u64, RescaleError> {
    let file = File::open(path).map_err(|source| RescaleError::UnreadableInput {
        path: path.to_path_buf(),
        source,
    })?;
    let metadata = file
        .metadata()
        .map_err(|source| RescaleError::FileSizeUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    if !metadata.is_file() {
        return Err(RescaleError::UnreadableInput {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    Ok(metadata.len())
}

fn run_typed<S: Sample>(config: &RunConfig, inputs: &[PathBuf]) -> Result<RunSummary, RescaleError> {
    let started = Instant::now();
    let files = preflight(inputs, S::KIND, &config.suffix)?;
    let input_bytes: u64 = files.iter().map(|f| f.size).sum();

    let first = files
        .iter()
        .find(|f| f.size > 0)
        .ok_or(RescaleError::EmptyInput)?;
    info!(
        "saturation threshold set - percentiles between {} will be considered",
        config.threshold
    );
    let seed = stream::read_first_sample::<S>(&first.input)?;
    debug!("read first value {seed} from {}", first.input.display());

    let mut buffers = SampleBuffers::<S>::new(buffer_count_for(
        &files,
        S::KIND.byte_width(),
        config.buffer_count,
    ));
    debug!("using read/write buffers of {} elements", buffers.capacity());

    info!("{}", Pass::Extent);
    let progress = Progress::new(Pass::Extent, input_bytes, config.show_progress);
    let extent = stats::find_extent(&files, seed, &mut buffers.samples, &progress)?;
    progress.finish();
    info!("established min/max values as {extent}");

    let layout = BinLayout::new(extent, config.bins)?;
    info!(
        "using {} histogram bins (bin size = {:.4})",
        layout.bins(),
        layout.bin_width()
    );

    info!("{}", Pass::Histogram);
    let progress = Progress::new(Pass::Histogram, input_bytes, config.show_progress);
    let histogram = stats::build_histogram(
        &files,
        &layout,
        &mut buffers.samples,
        &progress,
        config.parallel_histogram,
    )?;
    progress.finish();

    let window = stats::resolve_window(&histogram, &layout, config.threshold);
    info!(
        counted = histogram.total(),
        "low value is {:.4}, high value is {:.4}", window.low, window.high
    );
    let scaler = Scaler::new(window)?;
    info!("scaling range is set to {:.4}", window.scale_range());

    info!("{}", Pass::Convert);
    let progress = Progress::new(Pass::Convert, input_bytes, config.show_progress);
    let totals = convert::convert_all(&files, &scaler, &mut buffers, &progress)?;
    progress.finish();

    Ok(RunSummary {
        files,
        input_bytes,
        bytes_read: totals.bytes_read,
        bytes_written: totals.bytes_written,
        extent,
        window,
        elapsed: started.elapsed(),
    })
}

/// No point holding more samples than the largest file has
fn buffer_count_for(files: &[VolumeFile], width: usize, requested: NonZeroUsize) -> NonZeroUsize {
    let largest = files.iter().map(|f| f.size).max().unwrap_or(0) / width as u64;
    let largest = usize::try_from(largest).unwrap_or(usize::MAX);
    NonZeroUsize::new(requested.get().min(largest)).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::test_support::write_raw;
    use assert_matches::assert_matches;

    fn quiet_config(kind: SampleKind) -> RunConfig {
        RunConfig {
            sample_kind: kind,
            buffer_count: NonZeroUsize::new(3).unwrap(),
            show_progress: false,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_preflight_collects_sizes_and_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_raw(dir.path(), "a.raw", &[1.0f32, 2.0]);
        let b = write_raw::<f32>(dir.path(), "b.raw", &[]);

        let files =
            preflight(&[a.clone(), b], SampleKind::F32, &SuffixPolicy::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size, 8);
        assert_eq!(files[1].size, 0);
        assert_eq!(files[0].output, dir.path().join("a.raw.8bit.scaled.raw"));
    }

    #[test]
    fn test_preflight_stops_at_first_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_raw(dir.path(), "good.raw", &[1u16]);
        let missing = dir.path().join("missing.raw");

        let result = preflight(&[good, missing], SampleKind::U16, &SuffixPolicy::default());
        assert_matches!(result, Err(RescaleError::UnreadableInput { path, .. }) if path.ends_with("missing.raw"));
    }

    #[test]
    fn test_preflight_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("d");
        std::fs::create_dir(&sub).unwrap();

        let result = preflight(&[sub], SampleKind::F32, &SuffixPolicy::default());
        assert_matches!(result, Err(RescaleError::UnreadableInput { path, .. }) if path.ends_with("d"));
    }

    #[test]
    fn test_preflight_rejects_partial_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.raw");
        std::fs::write(&path, [0u8; 5]).unwrap();

        let result = preflight(&[path], SampleKind::F32, &SuffixPolicy::default());
        assert_matches!(result, Err(RescaleError::MisalignedInput { size: 5, width: 4, .. }));
    }

    #[test]
    fn test_preflight_rejects_output_over_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_raw(dir.path(), "a", &[1.0f32]);
        let a_out = write_raw(dir.path(), "a.out", &[1.0f32]);

        let result = preflight(&[a, a_out], SampleKind::F32, &SuffixPolicy::Fixed(".out".into()));
        assert_matches!(result, Err(RescaleError::OutputCollision { .. }));
    }

    #[test]
    fn test_no_inputs() {
        let result = run(&quiet_config(SampleKind::U16), &[]);
        assert_matches!(result, Err(RescaleError::NoInputFiles { kind: SampleKind::U16 }));
    }

    #[test]
    fn test_all_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_raw::<f32>(dir.path(), "a.raw", &[]);
        let b = write_raw::<f32>(dir.path(), "b.raw", &[]);

        let result = run(&quiet_config(SampleKind::F32), &[a, b]);
        assert_matches!(result, Err(RescaleError::EmptyInput));
    }

    #[test]
    fn test_seed_comes_from_first_non_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_raw::<f32>(dir.path(), "empty.raw", &[]);
        let data = write_raw(dir.path(), "data.raw", &[4.0f32, 8.0]);

        let summary = run(&quiet_config(SampleKind::F32), &[empty.clone(), data]).unwrap();
        assert_eq!(summary.extent, Extent::new(4.0, 8.0));
        assert_eq!(std::fs::read(&summary.files[0].output).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_buffer_count_capped_by_largest_file() {
        let files = [
            VolumeFile { input: "a".into(), output: "a.o".into(), size: 40 },
            VolumeFile { input: "b".into(), output: "b.o".into(), size: 12 },
        ];
        let requested = NonZeroUsize::new(1_000_000).unwrap();
        assert_eq!(buffer_count_for(&files, 4, requested).get(), 10);
        let requested = NonZeroUsize::new(5).unwrap();
        assert_eq!(buffer_count_for(&files, 4, requested).get(), 5);
        assert_eq!(buffer_count_for(&[], 2, requested).get(), 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            files: Vec::new(),
            input_bytes: 0,
            bytes_read: 8,
            bytes_written: 2,
            extent: Extent::new(0.0, 1.0),
            window: PercentileWindow::new(0.0, 1.0),
            elapsed: Duration::from_secs(30),
        };
        let text = summary.to_string();
        assert!(text.contains("read 8 bytes"));
        assert!(text.contains("0.5000 minutes"));
    }
}
