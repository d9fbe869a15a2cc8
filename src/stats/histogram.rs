//! Uniform-width histogram over the extent
//!
//! Bins span `[minimum, maximum]`. A value equal to `maximum` would land one
//! past the last bin, so indices are clamped into `[0, N-1]`.

use crate::error::RescaleError;
use crate::sample::Sample;
use crate::types::Extent;
use rayon::prelude::*;
use std::num::NonZeroUsize;

/// Samples per rayon task when counting a chunk in parallel
const PARALLEL_SPLIT: usize = 1 << 18;

/// Bin geometry derived once from the extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    minimum: f64,
    maximum: f64,
    bin_width: f64,
    bin_factor: f64,
    bins: usize,
}

impl BinLayout {
    pub fn new(extent: Extent, bins: NonZeroUsize) -> Result<Self, RescaleError> {
        if extent.is_degenerate() {
            return Err(RescaleError::DegenerateRange {
                low: extent.minimum,
                high: extent.maximum,
            });
        }

        let bins = bins.get();
        let range = extent.range();
        Ok(Self {
            minimum: extent.minimum,
            maximum: extent.maximum,
            bin_width: range / bins as f64,
            bin_factor: bins as f64 / range,
            bins,
        })
    }

    #[inline]
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    #[inline]
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    #[inline]
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Bin for `value`; below-range and NaN go to 0, at-or-above-range to N-1
    #[inline(always)]
    #[must_use]
    pub fn bin_index(&self, value: f64) -> usize {
        // float-to-int `as` saturates and maps NaN to 0
        let raw = (self.bin_factor * (value - self.minimum)) as usize;
        raw.min(self.bins - 1)
    }

    #[inline]
    #[must_use]
    pub fn lower_edge(&self, bin: usize) -> f64 {
        self.minimum + bin as f64 * self.bin_width
    }

    #[inline]
    #[must_use]
    pub fn upper_edge(&self, bin: usize) -> f64 {
        if bin + 1 >= self.bins {
            self.maximum
        } else {
            self.lower_edge(bin + 1)
        }
    }
}

/// Counter per bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    #[must_use]
    pub fn new(bins: usize) -> Self {
        Self {
            counts: vec![0; bins],
        }
    }

    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Number of samples counted so far
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    // Hot path: every sample of pass 2
    #[inline]
    pub fn add_samples<S: Sample>(&mut self, layout: &BinLayout, chunk: &[S]) {
        for &value in chunk {
            if value.is_saturation_sentinel() {
                continue;
            }
            self.counts[layout.bin_index(value.to_f64())] += 1;
        }
    }

    /// Same result as [`Histogram::add_samples`], counted on the rayon pool
    ///
    /// Each task fills its own counters; they are summed once the whole
    /// chunk is done and only then added to `self`.
    pub fn add_samples_parallel<S: Sample>(&mut self, layout: &BinLayout, chunk: &[S]) {
        if chunk.len() <= PARALLEL_SPLIT {
            self.add_samples(layout, chunk);
            return;
        }

        let bins = self.bins();
        let partial = chunk
            .par_chunks(PARALLEL_SPLIT)
            .map(|part| {
                let mut local = Histogram::new(bins);
                local.add_samples(layout, part);
                local
            })
            .reduce(
                || Histogram::new(bins),
                |mut acc, local| {
                    acc.merge(&local);
                    acc
                },
            );
        self.merge(&partial);
    }

    /// Counter-wise addition of `other` into `self`
    pub fn merge(&mut self, other: &Histogram) {
        debug_assert_eq!(self.bins(), other.bins());
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }
}
