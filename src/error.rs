//! Error type for a rescale run
//!
//! Every terminal condition of the tool is a variant here. The binary maps
//! each variant to its own process exit code via [`RescaleError::exit_code`].

use crate::sample::SampleKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RescaleError {
    /// Help or version text was requested; carries the rendered text
    #[error("{0}")]
    HelpRequested(String),

    #[error("not enough arguments: provide one or more {kind} raw files")]
    NoInputFiles { kind: SampleKind },

    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),

    #[error("{kind} samples are expected to be {expected} bytes wide, found {actual}")]
    UnexpectedSampleWidth {
        kind: SampleKind,
        expected: usize,
        actual: usize,
    },

    /// A numeric option outside the range the run can work with
    #[error("{0}")]
    InvalidConstraint(String),

    #[error("threshold {0} is outside [0.0, 0.5]")]
    BadThreshold(f64),

    #[error("{} is not a readable file", path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to read the size of {}", path.display())]
    FileSizeUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} holds {size} bytes, which is not a whole number of {width}-byte samples", path.display())]
    MisalignedInput {
        path: PathBuf,
        size: u64,
        width: usize,
    },

    #[error("output {} would overwrite an input file", path.display())]
    OutputCollision { path: PathBuf },

    #[error("failed to open {}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read from {}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the input files contain no samples")]
    EmptyInput,

    /// Zero (or non-finite) width between the two bounds used for scaling
    #[error("degenerate value range [{low}, {high}]: samples span no usable range, nothing to scale")]
    DegenerateRange { low: f64, high: f64 },
}

impl RescaleError {
    /// Process exit code reported for this error
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::HelpRequested(_) => 1,
            Self::NoInputFiles { .. } => 2,
            Self::InvalidArguments(_) => 3,
            Self::UnexpectedSampleWidth { .. } => 4,
            Self::InvalidConstraint(_) => 5,
            Self::UnreadableInput { .. } => 6,
            Self::FileSizeUnavailable { .. } => 7,
            Self::OpenFailed { .. } => 8,
            Self::BadThreshold(_) => 9,
            Self::ReadFailed { .. } => 10,
            Self::OutputCollision { .. } => 11,
            Self::DegenerateRange { .. } => 12,
            Self::EmptyInput => 13,
            Self::MisalignedInput { .. } => 14,
            Self::WriteFailed { .. } => 15,
        }
    }

    /// Help output is not a failure in the usual sense and goes to stdout
    #[must_use]
    pub fn is_help(&self) -> bool {
        matches!(self, Self::HelpRequested(_))
    }
}
