//! Value types shared by the passes

use crate::error::RescaleError;
use std::fmt;
use std::path::PathBuf;

/// One input volume file and the 8-bit file it turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeFile {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Size in bytes, queried once during preflight
    pub size: u64,
}

/// Global minimum and maximum sample value across the input set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub minimum: f64,
    pub maximum: f64,
}

impl Extent {
    #[must_use]
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> f64 {
        self.maximum - self.minimum
    }

    /// A zero or NaN range cannot be binned or scaled
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let range = self.range();
        range.is_nan() || range <= 0.0
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{min:.4} / {max:.4} (range {range:.4})",
            min = self.minimum,
            max = self.maximum,
            range = self.range()
        )
    }
}

/// Sample-space bounds used as the input range for scaling to 8 bits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileWindow {
    pub low: f64,
    pub high: f64,
}

impl PercentileWindow {
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    #[inline]
    #[must_use]
    pub fn scale_range(&self) -> f64 {
        self.high - self.low
    }
}

impl fmt::Display for PercentileWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{low:.4}, {high:.4}]", low = self.low, high = self.high)
    }
}

/// Fraction of samples clipped at each end of the distribution
///
/// Only constructible inside `[0.0, 0.5]`, so `low() <= high()` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.002;

    pub fn new(value: f64) -> Result<Self, RescaleError> {
        if !(0.0..=0.5).contains(&value) {
            return Err(RescaleError::BadThreshold(value));
        }
        Ok(Self(value))
    }

    #[inline]
    #[must_use]
    pub fn low(self) -> f64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn high(self) -> f64 {
        1.0 - self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{low:.2}% - {high:.2}%",
            low = 100.0 * self.low(),
            high = 100.0 * self.high()
        )
    }
}

/// Byte count rendered with its GiB equivalent for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    const GIBI: f64 = 1_073_741_824.0;

    #[inline]
    #[must_use]
    pub fn gib(self) -> f64 {
        self.0 as f64 / Self::GIBI
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{bytes} bytes ({gib:.3} GiB)", bytes = self.0, gib = self.gib())
    }
}
