//! Statistics passes over the whole input set
//!
//! Pass 1 finds the extent, pass 2 fills the histogram, and the percentile
//! window is then read off the histogram without touching the files again.

mod extent;
mod histogram;
mod percentile;

pub use extent::RunningExtent;
pub use histogram::{BinLayout, Histogram};
pub use percentile::resolve_window;

use crate::error::RescaleError;
use crate::sample::Sample;
use crate::stream::{self, Progress};
use crate::types::{Extent, VolumeFile};
use tracing::debug;

/// Pass 1: global minimum and maximum, seeded with `seed`
pub fn find_extent<S: Sample>(
    files: &[VolumeFile],
    seed: S,
    buffer: &mut [S],
    progress: &Progress,
) -> Result<Extent, RescaleError> {
    let mut running = RunningExtent::seeded(seed);

    for file in files {
        stream::for_each_chunk(&file.input, buffer, progress, |chunk| {
            running.update(chunk);
            Ok(())
        })?;
        debug!(
            file = %file.input.display(),
            "min/max values now {} / {}",
            running.min(),
            running.max()
        );
    }

    Ok(running.extent())
}

/// Pass 2: bin every non-sentinel sample of every file
pub fn build_histogram<S: Sample>(
    files: &[VolumeFile],
    layout: &BinLayout,
    buffer: &mut [S],
    progress: &Progress,
    parallel: bool,
) -> Result<Histogram, RescaleError> {
    let mut histogram = Histogram::new(layout.bins());

    for file in files {
        stream::for_each_chunk(&file.input, buffer, progress, |chunk| {
            if parallel {
                histogram.add_samples_parallel(layout, chunk);
            } else {
                histogram.add_samples(layout, chunk);
            }
            Ok(())
        })?;
        debug!(file = %file.input.display(), counted = histogram.total(), "histogram updated");
    }

    Ok(histogram)
}
