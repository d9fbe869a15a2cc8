//! Byte progress for a single pass
//!
//! Purely cosmetic: shows bytes done against the known input total and a
//! rolling throughput estimate. Nothing in a pass depends on it.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::Path;

/// The three read passes, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Extent,
    Histogram,
    Convert,
}

impl Pass {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Extent => 1,
            Self::Histogram => 2,
            Self::Convert => 3,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Self::Extent => "establishing value extents",
            Self::Histogram => "constructing histogram",
            Self::Convert => "performing conversion and writing output",
        };
        write!(f, "read pass {n}/3: {what}", n = self.number())
    }
}

pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Progress over `total_bytes` of input; `visible = false` draws nothing
    #[must_use]
    pub fn new(pass: Pass, total_bytes: u64, visible: bool) -> Self {
        if !visible {
            return Self::hidden();
        }

        let bar = ProgressBar::new(total_bytes);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {binary_bytes}/{binary_total_bytes} ({binary_bytes_per_sec}, {percent}%) {wide_msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_prefix(format!("[{n}/3]", n = pass.number()));
        Self { bar }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn start_file(&self, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    #[inline]
    pub fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
