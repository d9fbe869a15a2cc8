//! Sample model
//!
//! A run works on exactly one sample width, picked once at startup through
//! [`SampleKind`]. Everything downstream is generic over [`Sample`].

use crate::error::RescaleError;
use clap::ValueEnum;
use std::fmt;
use std::mem::size_of;

/// Input sample width selected for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleKind {
    /// 4-byte IEEE-754 float
    #[value(name = "f32")]
    F32,
    /// 2-byte unsigned integer; 0 and 65535 are saturation sentinels
    #[value(name = "u16")]
    U16,
}

impl SampleKind {
    /// Byte width every input sample is expected to have on disk
    #[inline]
    #[must_use]
    pub fn byte_width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::U16 => 2,
        }
    }

    /// Width of the in-memory type used for this kind
    #[inline]
    #[must_use]
    fn native_width(self) -> usize {
        match self {
            Self::F32 => size_of::<f32>(),
            Self::U16 => size_of::<u16>(),
        }
    }

    /// Whether the statistics passes skip saturated values for this kind
    #[inline]
    #[must_use]
    pub fn excludes_sentinels(self) -> bool {
        matches!(self, Self::U16)
    }

    /// Platform sanity check: the in-memory type must match the on-disk width
    pub fn check_width(self) -> Result<(), RescaleError> {
        let actual = self.native_width();
        if actual != self.byte_width() {
            return Err(RescaleError::UnexpectedSampleWidth {
                kind: self,
                expected: self.byte_width(),
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "32-bit floating point"),
            Self::U16 => write!(f, "16-bit unsigned integer"),
        }
    }
}

/// Numeric interface the passes need from a sample type
///
/// Samples are read as raw native-endian memory images, hence the `Pod`
/// bound. Ordering is the type's own `PartialOrd`.
pub trait Sample: bytemuck::Pod + PartialOrd + fmt::Display + Send + Sync {
    const KIND: SampleKind;

    /// Widen to the scale used for binning and remapping
    fn to_f64(self) -> f64;

    /// Known sensor artifact that must not bias the statistics
    #[inline]
    fn is_saturation_sentinel(self) -> bool {
        false
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    #[inline(always)]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for u16 {
    const KIND: SampleKind = SampleKind::U16;

    #[inline(always)]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline(always)]
    fn is_saturation_sentinel(self) -> bool {
        self == u16::MIN || self == u16::MAX
    }
}
