//! Raster buffers.
//!
//! A [`ColorBitmap`] stores interleaved RGB triples and is what decoders write and display sinks
//! consume. Post-processing works on an [`RgbBitmap`] instead: three decoupled
//! [`MonochromeBitmap`] channels that can be filtered independently (and in parallel).
//!
//! All buffers are row-major: pixel `(row, col)` lives at `row * width + col`.

use super::color::Rgb;
use crate::error::{HorayError, Result};

fn check_len(width: usize, height: usize, actual: usize) -> Result<()> {
    let expected = width * height;
    if expected != actual {
        return Err(HorayError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Interleaved RGB raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBitmap {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl ColorBitmap {
    /// Creates a bitmap filled with `fill`.
    pub fn new(width: usize, height: usize, fill: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Wraps existing pixels; fails unless `pixels.len() == width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels.get(row * self.width + col).copied()
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    /// Splits into three independent channels. `self` is left untouched.
    pub fn to_channels(&self) -> RgbBitmap {
        let mut r = Vec::with_capacity(self.pixels.len());
        let mut g = Vec::with_capacity(self.pixels.len());
        let mut b = Vec::with_capacity(self.pixels.len());
        for pixel in &self.pixels {
            r.push(pixel.r);
            g.push(pixel.g);
            b.push(pixel.b);
        }
        RgbBitmap {
            r: MonochromeBitmap::unchecked(self.width, self.height, r),
            g: MonochromeBitmap::unchecked(self.width, self.height, g),
            b: MonochromeBitmap::unchecked(self.width, self.height, b),
        }
    }

    /// Overwrites this bitmap with the joined channels, adopting their dimensions.
    pub fn copy_from_channels(&mut self, rgb: &RgbBitmap) {
        self.width = rgb.width();
        self.height = rgb.height();
        self.pixels = rgb
            .r
            .channel
            .iter()
            .zip(&rgb.g.channel)
            .zip(&rgb.b.channel)
            .map(|((&r, &g), &b)| Rgb::new(r, g, b))
            .collect();
    }

    /// 8-bit RGB bytes, row-major, three bytes per pixel.
    pub fn to_rgb8_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgb8()).collect()
    }
}

/// A single channel (or a grayscale image).
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeBitmap {
    width: usize,
    height: usize,
    channel: Vec<f32>,
}

impl MonochromeBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self::unchecked(width, height, vec![0.0; width * height])
    }

    pub fn from_channel(width: usize, height: usize, channel: Vec<f32>) -> Result<Self> {
        check_len(width, height, channel.len())?;
        Ok(Self::unchecked(width, height, channel))
    }

    fn unchecked(width: usize, height: usize, channel: Vec<f32>) -> Self {
        debug_assert_eq!(width * height, channel.len());
        Self {
            width,
            height,
            channel,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel(&self) -> &[f32] {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut [f32] {
        &mut self.channel
    }

    pub fn into_channel(self) -> Vec<f32> {
        self.channel
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.width;
        &self.channel[start..start + self.width]
    }

    /// Replaces the rows `[first_row, first_row + rows.len() / width)` with `rows`.
    pub(crate) fn write_rows(&mut self, first_row: usize, rows: &[f32]) {
        let start = first_row * self.width;
        self.channel[start..start + rows.len()].copy_from_slice(rows);
    }

    /// Swaps rows and columns. Width and height are exchanged; applying it twice is the identity.
    pub fn transpose(&mut self) {
        let (width, height) = (self.width, self.height);
        let mut transposed = vec![0.0; self.channel.len()];
        for row in 0..height {
            for col in 0..width {
                transposed[col * height + row] = self.channel[row * width + col];
            }
        }
        self.channel = transposed;
        self.width = height;
        self.height = width;
    }
}

/// Three decoupled channels sharing identical dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbBitmap {
    pub(crate) r: MonochromeBitmap,
    pub(crate) g: MonochromeBitmap,
    pub(crate) b: MonochromeBitmap,
}

impl RgbBitmap {
    pub fn new(r: MonochromeBitmap, g: MonochromeBitmap, b: MonochromeBitmap) -> Result<Self> {
        for other in [&g, &b] {
            if other.width != r.width || other.height != r.height {
                return Err(HorayError::DimensionMismatch {
                    expected: r.channel.len(),
                    actual: other.channel.len(),
                });
            }
        }
        Ok(Self { r, g, b })
    }

    pub fn width(&self) -> usize {
        self.r.width
    }

    pub fn height(&self) -> usize {
        self.r.height
    }

    pub fn red(&self) -> &MonochromeBitmap {
        &self.r
    }

    pub fn green(&self) -> &MonochromeBitmap {
        &self.g
    }

    pub fn blue(&self) -> &MonochromeBitmap {
        &self.b
    }

    pub fn into_channels(self) -> [MonochromeBitmap; 3] {
        [self.r, self.g, self.b]
    }

    /// Rebuilds from three channels produced by per-channel workers.
    pub fn from_channels(channels: [MonochromeBitmap; 3]) -> Result<Self> {
        let [r, g, b] = channels;
        Self::new(r, g, b)
    }
}
