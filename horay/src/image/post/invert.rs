use super::workers::{DEFAULT_TIMEOUT, fan_out};
use super::{PostProcessor, ProcessOutcome};
use crate::image::bitmap::{ColorBitmap, MonochromeBitmap, RgbBitmap};
use std::time::Duration;

fn invert_values(values: &mut [f32]) {
    for value in values {
        *value = 1.0 - *value;
    }
}

/// Replaces every channel value `c` with `1 - c`, one worker per channel.
pub struct ColorInvert {
    timeout: Duration,
}

impl Default for ColorInvert {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorInvert {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PostProcessor for ColorInvert {
    fn name(&self) -> &'static str {
        "color_invert"
    }

    fn process(&mut self, bitmap: &mut ColorBitmap) -> ProcessOutcome {
        let originals = bitmap.to_channels().into_channels();
        let result = fan_out(
            self.name(),
            originals.to_vec(),
            self.timeout,
            |mut channel: MonochromeBitmap| {
                invert_values(channel.channel_mut());
                channel
            },
        );

        let unfinished = result.unfinished();
        if unfinished > 0 {
            log::error!(
                "{}: timed out after {:?} - {} channel(s) unfinished",
                self.name(),
                result.waited,
                unfinished
            );
        }

        let waited = result.waited;
        let [r, g, b] = originals;
        let mut outputs = result.outputs.into_iter();
        let mut pick = |original: MonochromeBitmap| outputs.next().flatten().unwrap_or(original);
        let rgb = RgbBitmap {
            r: pick(r),
            g: pick(g),
            b: pick(b),
        };
        bitmap.copy_from_channels(&rgb);
        ProcessOutcome::from_wait(unfinished, waited)
    }

    fn process_channel(&mut self, channel: &mut MonochromeBitmap) {
        invert_values(channel.channel_mut());
    }
}
