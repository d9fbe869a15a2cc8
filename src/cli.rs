use crate::error::RescaleError;
use crate::naming::{DEFAULT_SUFFIX, SuffixPolicy};
use crate::run::{DEFAULT_BINS, DEFAULT_BUFFER_COUNT, MAX_BUFFER_COUNT, RunConfig};
use crate::sample::SampleKind;
use crate::types::Threshold;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::warn;

/// Buffers smaller than this make every pass crawl
const SMALL_BUFFER_WARNING: u64 = 1000;

/// Rescale raw volume data to 8-bit using a percentile window
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "In u16 mode, values of 0 and 65535 are known saturated values and are not \
                  considered when computing the scaling window."
)]
pub struct Args {
    /// Raw input file(s), all holding the same sample type
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Saturation threshold: e.g. 0.123 treats the first and last 12.3% of
    /// values as outside the scaling range (they become 0 or 255)
    #[arg(
        short = 't',
        long,
        env = "RESCALE_THRESHOLD",
        default_value_t = Threshold::DEFAULT,
        allow_negative_numbers = true
    )]
    pub threshold: f64,

    /// Read/write buffer size in elements (input and output)
    #[arg(short = 'b', long, env = "RESCALE_BUFFER_COUNT", default_value_t = DEFAULT_BUFFER_COUNT)]
    pub buffer_count: u64,

    /// Suffix appended to each input file name to form its output name
    #[arg(short = 's', long, env = "RESCALE_SUFFIX", default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Number of histogram bins (at least 1)
    #[arg(
        short = 'n',
        long,
        env = "RESCALE_BINS",
        default_value_t = DEFAULT_BINS as i64,
        allow_negative_numbers = true
    )]
    pub bins: i64,

    /// Name outputs from the volume size in the companion .vgi file
    #[arg(short = 'a', long)]
    pub auto: bool,

    /// Sample type of the input files
    #[arg(long, value_enum, env = "RESCALE_SAMPLE_TYPE", default_value_t = SampleKind::F32)]
    pub sample_type: SampleKind,

    /// Count histogram bins on all cores (reads stay sequential)
    #[arg(long)]
    pub parallel: bool,

    /// Hide progress bars and informational messages
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse `args`, turning help/version output and parse failures into errors
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, RescaleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                RescaleError::HelpRequested(e.render().to_string())
            }
            _ => RescaleError::InvalidArguments(e),
        })
    }

    /// Validate into the settings a run consumes, plus the input list
    pub fn into_config(self) -> Result<(RunConfig, Vec<PathBuf>), RescaleError> {
        if self.files.is_empty() {
            return Err(RescaleError::NoInputFiles {
                kind: self.sample_type,
            });
        }

        let threshold = Threshold::new(self.threshold)?;
        let bins = validate_bins(self.bins)?;
        let buffer_count = validate_buffer_count(self.buffer_count)?;

        let suffix = if self.auto {
            SuffixPolicy::FromVolumeInfo {
                fallback: self.suffix,
            }
        } else {
            SuffixPolicy::Fixed(self.suffix)
        };

        let config = RunConfig {
            sample_kind: self.sample_type,
            threshold,
            bins,
            buffer_count,
            suffix,
            parallel_histogram: self.parallel,
            show_progress: !self.quiet,
        };
        Ok((config, self.files))
    }
}

fn validate_bins(bins: i64) -> Result<NonZeroUsize, RescaleError> {
    usize::try_from(bins)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            RescaleError::InvalidConstraint(format!(
                "number of histogram bins set to {bins}; at least 1 is required"
            ))
        })
}

fn validate_buffer_count(count: u64) -> Result<NonZeroUsize, RescaleError> {
    if count == 0 {
        return Err(RescaleError::InvalidConstraint(
            "buffer size set to zero elements".to_string(),
        ));
    }
    if count < SMALL_BUFFER_WARNING {
        warn!("buffer count set unreasonably small ({count}); performance will almost certainly be dreadful");
    }

    let count = if count > MAX_BUFFER_COUNT {
        warn!(
            "requested buffer count of {count} is larger than the maximum allowed ({MAX_BUFFER_COUNT}); using {MAX_BUFFER_COUNT} elements"
        );
        MAX_BUFFER_COUNT
    } else {
        count
    };

    let count = usize::try_from(count).unwrap_or(usize::MAX);
    Ok(NonZeroUsize::new(count).unwrap_or(NonZeroUsize::MIN))
}
