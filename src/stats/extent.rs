use crate::sample::Sample;
use crate::types::Extent;

/// Running minimum/maximum in the sample type's own ordering
#[derive(Debug, Clone, Copy)]
pub struct RunningExtent<S: Sample> {
    min: S,
    max: S,
}

impl<S: Sample> RunningExtent<S> {
    #[must_use]
    pub fn seeded(first: S) -> Self {
        Self {
            min: first,
            max: first,
        }
    }

    // Hot path: every sample of pass 1
    #[inline]
    pub fn update(&mut self, mut chunk: &[S]) {
        // A NaN seed compares false against everything; restart from the next ordered value
        if is_unordered(self.min) {
            match chunk.iter().position(|&v| !is_unordered(v)) {
                Some(start) => {
                    *self = Self::seeded(chunk[start]);
                    chunk = &chunk[start + 1..];
                }
                None => return,
            }
        }

        for &value in chunk {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
    }

    #[must_use]
    pub fn min(&self) -> S {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> S {
        self.max
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        Extent::new(self.min.to_f64(), self.max.to_f64())
    }
}

fn is_unordered<S: Sample>(value: S) -> bool {
    value.partial_cmp(&value).is_none()
}
