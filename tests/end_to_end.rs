//! Whole-run scenarios through the library API.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use rescale::naming::SuffixPolicy;
use rescale::types::{Extent, PercentileWindow, Threshold};
use rescale::{RescaleError, RunConfig, Sample, SampleKind, run};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

fn write_raw<S: Sample>(dir: &Path, name: &str, samples: &[S]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytemuck::cast_slice::<S, u8>(samples)).unwrap();
    path
}

fn config(kind: SampleKind, threshold: f64, bins: usize) -> RunConfig {
    RunConfig {
        sample_kind: kind,
        threshold: Threshold::new(threshold).unwrap(),
        bins: NonZeroUsize::new(bins).unwrap(),
        buffer_count: NonZeroUsize::new(1024).unwrap(),
        show_progress: false,
        ..RunConfig::default()
    }
}

fn output_of(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".8bit.scaled.raw");
    PathBuf::from(name)
}

#[test]
fn test_four_floats_full_window() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw(dir.path(), "ramp.raw", &[0.0f32, 10.0, 20.0, 30.0]);

    let summary = run(&config(SampleKind::F32, 0.0, 4), &[input.clone()]).unwrap();

    assert_eq!(summary.extent, Extent::new(0.0, 30.0));
    assert_eq!(summary.window, PercentileWindow::new(0.0, 30.0));
    assert_eq!(summary.bytes_read, 16);
    assert_eq!(summary.bytes_written, 4);
    assert_eq!(std::fs::read(output_of(&input)).unwrap(), vec![0, 85, 170, 255]);
}

#[test]
fn test_constant_volume_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_raw(dir.path(), "a.raw", &[5.0f32, 5.0, 5.0]);
    let b = write_raw(dir.path(), "b.raw", &[5.0f32, 5.0, 5.0]);

    let result = run(&config(SampleKind::F32, 0.002, 65536), &[a.clone(), b.clone()]);

    assert_matches!(result, Err(RescaleError::DegenerateRange { low, high }) if low == 5.0 && high == 5.0);
    assert!(!output_of(&a).exists());
    assert!(!output_of(&b).exists());
}

#[test]
fn test_u16_sentinels_ignored_by_window_but_converted() {
    let dir = tempfile::tempdir().unwrap();
    let mut samples: Vec<u16> = vec![0, 65535];
    samples.extend((100..200).rev());
    let input = write_raw(dir.path(), "detector.raw", &samples);

    let summary = run(&config(SampleKind::U16, 0.1, 65535), &[input.clone()]).unwrap();

    // Sentinels still define the extent
    assert_eq!(summary.extent, Extent::new(0.0, 65535.0));
    // 100 real samples, one per bin: 10% below 109, 90% up to 190
    assert_eq!(summary.window, PercentileWindow::new(108.0, 190.0));

    let output = std::fs::read(output_of(&input)).unwrap();
    assert_eq!(output.len(), samples.len());
    assert_eq!(output[0], 0);
    assert_eq!(output[1], 255);
    let byte_for = |value: u16| output[samples.iter().position(|&s| s == value).unwrap()];
    assert_eq!(byte_for(100), 0);
    assert_eq!(byte_for(108), 0);
    assert_eq!(byte_for(149), 127);
    assert_eq!(byte_for(190), 255);
    assert_eq!(byte_for(199), 255);
}

#[test]
fn test_window_is_shared_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let low = write_raw(dir.path(), "low.raw", &[0.0f32, 10.0]);
    let high = write_raw(dir.path(), "high.raw", &[20.0f32, 30.0]);

    let summary = run(&config(SampleKind::F32, 0.0, 4), &[low.clone(), high.clone()]).unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(std::fs::read(output_of(&low)).unwrap(), vec![0, 85]);
    assert_eq!(std::fs::read(output_of(&high)).unwrap(), vec![170, 255]);
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<f32> = (0..10_000).map(|i| ((i * 7) % 997) as f32 * 0.5 - 100.0).collect();
    let input = write_raw(dir.path(), "vol.raw", &samples);
    let config = config(SampleKind::F32, 0.002, 4096);

    run(&config, &[input.clone()]).unwrap();
    let first = std::fs::read(output_of(&input)).unwrap();
    run(&config, &[input.clone()]).unwrap();
    let second = std::fs::read(output_of(&input)).unwrap();

    assert_eq!(first.len(), samples.len());
    assert_eq!(first, second);
}

#[test]
fn test_parallel_histogram_gives_same_output() {
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<u16> = (0..600_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 16) as u16).collect();
    let input = write_raw(dir.path(), "big.raw", &samples);

    let mut sequential = config(SampleKind::U16, 0.01, 65536);
    sequential.buffer_count = NonZeroUsize::new(600_000).unwrap();
    let mut parallel = sequential.clone();
    parallel.parallel_histogram = true;

    let a = run(&sequential, &[input.clone()]).unwrap();
    let first = std::fs::read(output_of(&input)).unwrap();
    let b = run(&parallel, &[input.clone()]).unwrap();
    let second = std::fs::read(output_of(&input)).unwrap();

    assert_eq!(a.window, b.window);
    assert_eq!(first, second);
}

#[test]
fn test_auto_naming_from_vgi() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw(dir.path(), "scan.vol", &[1.0f32, 2.0, 3.0]);
    std::fs::write(dir.path().join("scan.vgi"), "[representation]\nsize = 3 1 1\n").unwrap();

    let mut config = config(SampleKind::F32, 0.0, 16);
    config.suffix = SuffixPolicy::FromVolumeInfo {
        fallback: ".8bit.scaled.raw".to_string(),
    };
    let summary = run(&config, &[input.clone()]).unwrap();

    let mut expected = input.into_os_string();
    expected.push("3x1x1x8bit.raw");
    assert_eq!(summary.files[0].output, PathBuf::from(expected));
    assert!(summary.files[0].output.exists());
}

#[test]
fn test_unreadable_input_aborts_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_raw(dir.path(), "good.raw", &[1.0f32, 2.0]);
    let missing = dir.path().join("missing.raw");

    let result = run(&config(SampleKind::F32, 0.0, 4), &[good.clone(), missing]);

    assert_matches!(result, Err(RescaleError::UnreadableInput { .. }));
    assert!(!output_of(&good).exists());
}

#[test]
fn test_leading_nan_does_not_poison_extent() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw(dir.path(), "nan.raw", &[f32::NAN, 0.0, 10.0, 20.0, 30.0]);

    let summary = run(&config(SampleKind::F32, 0.0, 4), &[input.clone()]).unwrap();

    assert_eq!(summary.extent, Extent::new(0.0, 30.0));
    assert_eq!(summary.window, PercentileWindow::new(0.0, 30.0));
    assert_eq!(std::fs::read(output_of(&input)).unwrap(), vec![0, 0, 85, 170, 255]);
}
