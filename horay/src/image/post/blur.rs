//! Separable Gaussian blur.
//!
//! Weights come from the raised-cosine approximation of the normal distribution,
//! `w(x) = (1 + cos x) / 2π`, sampled at `taps + 1` evenly spaced points over `[0, π)`. The
//! weights are not renormalized, so a blurred image is slightly darker than its input.
//!
//! Rows are blurred, the channel is transposed, rows are blurred again and the channel is
//! transposed back. Taps that fall off the end of a row are skipped.

use super::workers::{DEFAULT_TIMEOUT, fan_out};
use super::{PostProcessor, ProcessOutcome};
use crate::error::{HorayError, Result};
use crate::image::bitmap::{ColorBitmap, MonochromeBitmap, RgbBitmap};
use crate::image::color::Rgb;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Duration;

/// `taps + 1` weights, centre first.
pub fn gaussian_coefficients(taps: usize) -> Vec<f32> {
    let count = taps + 1;
    let step = PI / count as f32;
    (0..count)
        .map(|i| (1.0 + (i as f32 * step).cos()) / (2.0 * PI))
        .collect()
}

/// Blurs each `width`-long row of `values` independently.
fn blur_rows(values: &[f32], width: usize, coefficients: &[f32]) -> Vec<f32> {
    if width == 0 || values.is_empty() || coefficients.is_empty() {
        return values.to_vec();
    }
    let taps = coefficients.len() - 1;
    let mut blurred = vec![0.0; values.len()];
    for (source, target) in values.chunks(width).zip(blurred.chunks_mut(width)) {
        let len = source.len();
        for (j, value) in target.iter_mut().enumerate() {
            let first = j.saturating_sub(taps);
            let last = (j + taps).min(len - 1);
            *value = (first..=last)
                .map(|s| coefficients[j.abs_diff(s)] * source[s])
                .sum();
        }
    }
    blurred
}

/// Full two-pass blur of one channel on the calling thread.
pub fn blur_channel(channel: &mut MonochromeBitmap, coefficients: &[f32]) {
    for _ in 0..2 {
        let width = channel.width();
        let blurred = blur_rows(channel.channel(), width, coefficients);
        channel.channel_mut().copy_from_slice(&blurred);
        channel.transpose();
    }
}

fn validated_coefficients(taps: usize) -> Result<Arc<[f32]>> {
    if taps == 0 {
        return Err(HorayError::InvalidArgument(
            "Gaussian blur needs at least one tap".to_string(),
        ));
    }
    let coefficients = gaussian_coefficients(taps);
    log::debug!("Gaussian coefficients ({} taps): {:?}", taps, coefficients);
    Ok(coefficients.into())
}

/// Blurs each color channel on its own worker.
pub struct GaussianBlur {
    coefficients: Arc<[f32]>,
    timeout: Duration,
}

impl GaussianBlur {
    pub const DEFAULT_TAPS: usize = 2;

    pub fn new(taps: usize) -> Result<Self> {
        Ok(Self {
            coefficients: validated_coefficients(taps)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn taps(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }
}

impl PostProcessor for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn process(&mut self, bitmap: &mut ColorBitmap) -> ProcessOutcome {
        let originals = bitmap.to_channels().into_channels();
        let coefficients = Arc::clone(&self.coefficients);
        let result = fan_out(
            self.name(),
            originals.to_vec(),
            self.timeout,
            move |mut channel: MonochromeBitmap| {
                blur_channel(&mut channel, &coefficients);
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
        blur_channel(channel, &self.coefficients);
    }
}

/// Blurs only the red channel, split into row bands, and replicates it into green and blue.
///
/// Only meaningful for grayscale images, where the three channels are identical.
pub struct GrayscaleGaussianBlur {
    coefficients: Arc<[f32]>,
    bands: usize,
    timeout: Duration,
}

impl GrayscaleGaussianBlur {
    pub const DEFAULT_TAPS: usize = 5;

    pub fn new(taps: usize) -> Result<Self> {
        Ok(Self {
            coefficients: validated_coefficients(taps)?,
            bands: 4,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_bands(mut self, bands: usize) -> Self {
        self.bands = bands.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn taps(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// One horizontal pass with rows partitioned across workers. Returns unfinished bands.
    /// Blurs every row band of `channel`, returning the unfinished band count and the time
    /// spent waiting for them.
    fn blur_bands(&self, channel: &mut MonochromeBitmap) -> (usize, Duration) {
        let (width, height) = (channel.width(), channel.height());
        if width == 0 || height == 0 {
            return (0, Duration::ZERO);
        }
        let rows_per_band = height.div_ceil(self.bands.min(height));
        let inputs: Vec<(usize, Vec<f32>)> = channel
            .channel()
            .chunks(rows_per_band * width)
            .enumerate()
            .map(|(band, rows)| (band * rows_per_band, rows.to_vec()))
            .collect();

        let coefficients = Arc::clone(&self.coefficients);
        let result = fan_out(
            self.name(),
            inputs,
            self.timeout,
            move |(first_row, rows): (usize, Vec<f32>)| {
                (first_row, blur_rows(&rows, width, &coefficients))
            },
        );

        let unfinished = result.unfinished();
        if unfinished > 0 {
            log::error!(
                "{}: timed out after {:?} - {} band(s) unfinished",
                self.name(),
                result.waited,
                unfinished
            );
        }
        let waited = result.waited;
        for (first_row, rows) in result.outputs.into_iter().flatten() {
            channel.write_rows(first_row, &rows);
        }
        (unfinished, waited)
    }
}

impl PostProcessor for GrayscaleGaussianBlur {
    fn name(&self) -> &'static str {
        "grayscale_gaussian_blur"
    }

    fn process(&mut self, bitmap: &mut ColorBitmap) -> ProcessOutcome {
        let [mut red, _, _] = bitmap.to_channels().into_channels();

        let mut unfinished = 0;
        let mut waited = Duration::ZERO;
        for _ in 0..2 {
            let (pass_unfinished, pass_waited) = self.blur_bands(&mut red);
            unfinished += pass_unfinished;
            waited += pass_waited;
            red.transpose();
        }

        for (pixel, &value) in bitmap.pixels_mut().iter_mut().zip(red.channel()) {
            *pixel = Rgb::gray(value);
        }
        ProcessOutcome::from_wait(unfinished, waited)
    }

    fn process_channel(&mut self, channel: &mut MonochromeBitmap) {
        blur_channel(channel, &self.coefficients);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(width: usize, height: usize, row: usize, col: usize) -> MonochromeBitmap {
        let mut channel = MonochromeBitmap::new(width, height);
        channel.channel_mut()[row * width + col] = 1.0;
        channel
    }

    #[test]
    fn test_coefficients() {
        let coefficients = gaussian_coefficients(2);
        assert_eq!(coefficients.len(), 3);
        assert!((coefficients[0] - 1.0 / PI).abs() < 1e-6);
        assert!(coefficients.windows(2).all(|w| w[1] < w[0]));
        assert!(coefficients.iter().all(|&c| c > 0.0));
    }

    #[test]
    fn test_zero_taps_rejected() {
        assert!(GaussianBlur::new(0).is_err());
        assert!(GrayscaleGaussianBlur::new(0).is_err());
        assert_eq!(GaussianBlur::new(3).unwrap().taps(), 3);
    }

    #[test]
    fn test_row_taps_do_not_wrap() {
        let coefficients = gaussian_coefficients(2);
        // Impulse at the end of the first row must not leak into the second.
        let values = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let blurred = blur_rows(&values, 3, &coefficients);
        assert_eq!(&blurred[3..], &[0.0, 0.0, 0.0]);
        assert!((blurred[2] - coefficients[0]).abs() < 1e-6);
        assert!((blurred[1] - coefficients[1]).abs() < 1e-6);
        assert!((blurred[0] - coefficients[2]).abs() < 1e-6);
    }

    #[test]
    fn test_separable_blur_is_symmetric() {
        let coefficients = gaussian_coefficients(2);
        let mut channel = impulse(5, 5, 2, 2);
        blur_channel(&mut channel, &coefficients);
        assert_eq!((channel.width(), channel.height()), (5, 5));

        let mut transposed = channel.clone();
        transposed.transpose();
        for (a, b) in channel.channel().iter().zip(transposed.channel()) {
            assert!((a - b).abs() < 1e-6);
        }
        let center = channel.channel()[12];
        assert!((center - coefficients[0] * coefficients[0]).abs() < 1e-6);
    }

    #[test]
    fn test_color_blur_matches_single_channel_blur() {
        let mut bitmap = ColorBitmap::new(7, 4, Rgb::BLACK);
        bitmap.pixels_mut()[10] = Rgb::new(1.0, 0.5, 0.25);
        let mut blur = GaussianBlur::new(2).unwrap();
        assert_eq!(blur.process(&mut bitmap), ProcessOutcome::Complete);

        let mut red = impulse(7, 4, 1, 3);
        blur.process_channel(&mut red);
        for (pixel, &expected) in bitmap.pixels().iter().zip(red.channel()) {
            assert!((pixel.r - expected).abs() < 1e-6);
            assert!((pixel.g - expected * 0.5).abs() < 1e-6);
            assert!((pixel.b - expected * 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_grayscale_blur_matches_full_blur_and_replicates_red() {
        let mut bitmap = ColorBitmap::new(9, 6, Rgb::BLACK);
        bitmap.pixels_mut()[22] = Rgb::gray(1.0);
        bitmap.pixels_mut()[40] = Rgb::gray(0.5);

        let mut reference = bitmap.clone();
        GaussianBlur::new(3).unwrap().process(&mut reference);

        let mut blur = GrayscaleGaussianBlur::new(3).unwrap().with_bands(4);
        assert!(blur.process(&mut bitmap).is_complete());

        for (pixel, expected) in bitmap.pixels().iter().zip(reference.pixels()) {
            assert!(pixel.approx_eq(expected, 1e-6));
            assert_eq!(pixel.r, pixel.g);
            assert_eq!(pixel.r, pixel.b);
        }
    }
}
