use super::histogram::{BinLayout, Histogram};
use crate::types::{PercentileWindow, Threshold};

/// Walk the cumulative distribution to find the scaling window
///
/// The low bound is the lower edge of the last bin whose cumulative fraction
/// stays below `threshold.low()`. The high bound is the upper edge of the
/// last bin whose cumulative fraction stays at or below `threshold.high()`.
/// Either bound keeps its extent default when no bin qualifies, and an empty
/// histogram yields the whole extent.
#[must_use]
pub fn resolve_window(
    histogram: &Histogram,
    layout: &BinLayout,
    threshold: Threshold,
) -> PercentileWindow {
    let mut window = PercentileWindow::new(layout.minimum(), layout.maximum());

    let total = histogram.total();
    if total == 0 {
        return window;
    }
    let total = total as f64;

    let mut cumulative = 0u64;
    for (bin, &count) in histogram.counts().iter().enumerate() {
        cumulative += count;
        let fraction = cumulative as f64 / total;
        if fraction < threshold.low() {
            window.low = layout.lower_edge(bin);
        }
        if fraction <= threshold.high() {
            window.high = layout.upper_edge(bin);
        }
    }

    window
}
