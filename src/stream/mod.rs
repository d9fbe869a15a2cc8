//! Buffered sequential reading of raw sample files
//!
//! Every pass is a reduction over fixed-size chunks of one file at a time.
//! The buffers are allocated once by the orchestrator and reused for every
//! file and every pass.

mod progress;

pub use progress::{Pass, Progress};

use crate::error::RescaleError;
use crate::sample::Sample;
use std::fs::File;
use std::io::{self, Read};
use std::mem::size_of;
use std::num::NonZeroUsize;
use std::path::Path;

/// Reusable input sample buffer and output byte buffer of equal length
pub struct SampleBuffers<S: Sample> {
    pub samples: Vec<S>,
    pub bytes: Vec<u8>,
}

impl<S: Sample> SampleBuffers<S> {
    #[must_use]
    pub fn new(count: NonZeroUsize) -> Self {
        Self {
            samples: vec![S::zeroed(); count.get()],
            bytes: vec![0u8; count.get()],
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}

/// Stream `path` through `buffer`, calling `on_chunk` with every chunk read
///
/// Chunks hold up to `buffer.len()` samples; only the last one may be
/// shorter. An empty file produces no calls. Returns the number of bytes
/// read. Any read failure other than a clean end of file aborts.
pub fn for_each_chunk<S, F>(
    path: &Path,
    buffer: &mut [S],
    progress: &Progress,
    mut on_chunk: F,
) -> Result<u64, RescaleError>
where
    S: Sample,
    F: FnMut(&[S]) -> Result<(), RescaleError>,
{
    let mut file = File::open(path).map_err(|source| RescaleError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    progress.start_file(path);

    let width = size_of::<S>();
    let mut total = 0u64;

    loop {
        let filled = fill(&mut file, bytemuck::cast_slice_mut(buffer)).map_err(|source| {
            RescaleError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if filled % width != 0 {
            return Err(RescaleError::ReadFailed {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("file ends inside a {width}-byte sample"),
                ),
            });
        }

        let count = filled / width;
        if count == 0 {
            break;
        }

        on_chunk(&buffer[..count])?;
        total += filled as u64;
        progress.advance(filled as u64);

        if count < buffer.len() {
            break;
        }
    }

    Ok(total)
}

/// Read exactly one sample from the start of `path`
pub fn read_first_sample<S: Sample>(path: &Path) -> Result<S, RescaleError> {
    let mut file = File::open(path).map_err(|source| RescaleError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut value = S::zeroed();
    file.read_exact(bytemuck::bytes_of_mut(&mut value))
        .map_err(|source| RescaleError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(value)
}

/// Fill `buf` from `reader` until it is full or the reader is exhausted
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
