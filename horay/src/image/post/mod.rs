//! Post-processing effects applied to decoded rasters.

pub mod blur;
pub mod invert;
pub mod workers;

pub use blur::{GaussianBlur, GrayscaleGaussianBlur, gaussian_coefficients};
pub use invert::ColorInvert;

use super::bitmap::{ColorBitmap, MonochromeBitmap};
use std::time::Duration;

/// Whether every worker of an effect reported back in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Complete,
    /// `unfinished` partitions kept their unfiltered data after waiting `waited`.
    TimedOut { unfinished: usize, waited: Duration },
}

impl ProcessOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub(crate) fn from_wait(unfinished: usize, waited: Duration) -> Self {
        if unfinished == 0 {
            Self::Complete
        } else {
            Self::TimedOut { unfinished, waited }
        }
    }
}

/// An effect applied in place to a raster.
pub trait PostProcessor: Send {
    /// Short identifier used in logs and events.
    fn name(&self) -> &'static str;

    /// Filters the whole bitmap, possibly in parallel.
    fn process(&mut self, bitmap: &mut ColorBitmap) -> ProcessOutcome;

    /// Filters a single channel on the calling thread.
    fn process_channel(&mut self, channel: &mut MonochromeBitmap);
}
