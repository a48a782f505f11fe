//! Built-in task kinds.
//!
//! Both kinds pay a simulated fetch when the prototype is built and then run
//! for a random duration, standing in for real I/O-bound work.

pub mod email;
pub mod image;

pub use email::EmailTask;
pub use image::ImageProcessingTask;

use std::time::Duration;

use rand::Rng;

/// Inclusive range a task's simulated run time is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRange {
    pub min: Duration,
    pub max: Duration,
}

impl DurationRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Always the same duration.
    pub fn fixed(duration: Duration) -> Self {
        Self::new(duration, duration)
    }

    /// Draw a duration uniformly from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}
