//! B-mode decoding: scan-plane samples to a raster.
//!
//! The probe apex sits at the bottom-centre of the image and depth grows upward. The image
//! spans `max_distance` world units along its shorter side, so the whole fan fits regardless
//! of aspect ratio.

use super::bitmap::ColorBitmap;
use super::color::Rgb;
use crate::config::DecoderDesc;
use crate::error::Result;
use crate::math::Vec2;
use crate::scan::{ScanFrame, ScanPoint};

/// Color mapping from echo brightness to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Classic B-mode: white echoes on black.
    #[default]
    WhiteOnBlack,
    /// Inverted: dark echoes on white.
    BlackOnWhite,
    /// Echoes tinted by the tissue's display color, on black.
    Tissue,
}

impl Palette {
    pub fn background(&self) -> Rgb {
        match self {
            Self::WhiteOnBlack | Self::Tissue => Rgb::BLACK,
            Self::BlackOnWhite => Rgb::WHITE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WhiteOnBlack => "white on black",
            Self::BlackOnWhite => "black on white",
            Self::Tissue => "tissue",
        }
    }
}

/// Maps a scan-plane position to a row-major pixel index.
///
/// Returns `None` for positions that fall outside the image, including ones that would wrap
/// onto a neighbouring row.
pub fn pixel_index(
    width: usize,
    height: usize,
    projected: Vec2,
    max_distance: f32,
) -> Option<usize> {
    if width == 0 || height == 0 || max_distance <= 0.0 {
        return None;
    }
    let pixels_per_unit = width.min(height) as f32 / max_distance;
    let x_center = (width / 2) as f32;

    let col = (x_center - pixels_per_unit * projected.x).floor();
    let row = height as f32 - (pixels_per_unit * projected.y).ceil();
    if !col.is_finite() || !row.is_finite() {
        return None;
    }
    if col < 0.0 || col >= width as f32 || row < 0.0 || row >= height as f32 {
        return None;
    }
    Some(row as usize * width + col as usize)
}

/// Turns scan frames into color rasters.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    desc: DecoderDesc,
}

impl ImageDecoder {
    pub fn new(desc: DecoderDesc) -> Result<Self> {
        desc.validate()?;
        Ok(Self { desc })
    }

    pub fn desc(&self) -> &DecoderDesc {
        &self.desc
    }

    pub fn palette(&self) -> Palette {
        self.desc.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.desc.palette = palette;
    }

    pub fn background(&self) -> Rgb {
        self.desc.palette.background()
    }

    /// Pixel color of a single sample under the current palette.
    pub fn point_color(&self, point: &ScanPoint) -> Rgb {
        let brightness = point.brightness();
        match self.desc.palette {
            Palette::WhiteOnBlack => Rgb::WHITE * brightness.max(self.desc.brightness_floor),
            Palette::BlackOnWhite => Rgb::BLACK + Rgb::WHITE * (1.0 - brightness),
            Palette::Tissue => point.tint() * brightness.max(self.desc.brightness_floor),
        }
    }

    /// Decodes `frame` into a freshly allocated bitmap of the configured size.
    pub fn decode(&self, frame: &ScanFrame) -> ColorBitmap {
        let mut bitmap = ColorBitmap::new(self.desc.width, self.desc.height, self.background());
        self.draw(frame, &mut bitmap);
        bitmap
    }

    /// Decodes into an existing bitmap, reallocating only if its size differs.
    pub fn decode_into(&self, frame: &ScanFrame, bitmap: &mut ColorBitmap) {
        if bitmap.width() != self.desc.width || bitmap.height() != self.desc.height {
            *bitmap = ColorBitmap::new(self.desc.width, self.desc.height, self.background());
        } else {
            bitmap.fill(self.background());
        }
        self.draw(frame, bitmap);
    }

    fn draw(&self, frame: &ScanFrame, bitmap: &mut ColorBitmap) {
        let (width, height) = (bitmap.width(), bitmap.height());
        let max_distance = frame.config().max_distance();
        let mut dropped = 0usize;

        let pixels = bitmap.pixels_mut();
        for point in frame.points() {
            match pixel_index(width, height, point.projected_position(), max_distance) {
                Some(index) => pixels[index] = self.point_color(point),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::trace!("Decoder dropped {dropped} sample(s) outside the image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::scan::build_scanning_plane;
    use crate::scene::OrganId;

    #[test]
    fn test_pixel_mapping_reference_points() {
        assert_eq!(
            pixel_index(640, 480, Vec2::new(0.0, 10.0), 10.0),
            Some(320)
        );
        assert_eq!(
            pixel_index(640, 480, Vec2::new(0.0, 0.0001), 10.0),
            Some(479 * 640 + 320)
        );
    }

    #[test]
    fn test_pixel_mapping_rejects_outside() {
        assert_eq!(pixel_index(640, 480, Vec2::new(0.0, 0.0), 10.0), None);
        assert_eq!(pixel_index(640, 480, Vec2::new(0.0, 10.5), 10.0), None);
        // Would wrap onto the previous row if columns were not checked.
        assert_eq!(pixel_index(640, 480, Vec2::new(-7.0, 5.0), 10.0), None);
        assert_eq!(pixel_index(640, 480, Vec2::new(7.0, 5.0), 10.0), None);
    }

    #[test]
    fn test_positive_x_maps_left_of_center() {
        let index = pixel_index(100, 100, Vec2::new(1.0, 5.0), 10.0).unwrap();
        assert!(index % 100 < 50);
    }

    #[test]
    fn test_empty_frame_equals_background() {
        let frame = build_scanning_plane(&ProbeConfig::default());
        for palette in [Palette::WhiteOnBlack, Palette::Tissue] {
            let decoder = ImageDecoder::new(DecoderDesc::default().with_palette(palette)).unwrap();
            let bitmap = decoder.decode(&frame);
            assert!(bitmap.pixels().iter().all(|&p| p == Rgb::BLACK));
        }

        let inverted =
            ImageDecoder::new(DecoderDesc::default().with_palette(Palette::BlackOnWhite)).unwrap();
        let bitmap = inverted.decode(&frame);
        assert!(bitmap.pixels().iter().all(|&p| p == Rgb::WHITE));
    }

    #[test]
    fn test_palettes() {
        let mut point = ScanPoint::new(crate::math::Vec3::ZERO, Vec2::new(0.0, 5.0));
        point.set_echo(OrganId(0), 0.25, Rgb::RED);

        let white = ImageDecoder::new(DecoderDesc::default()).unwrap();
        assert!(white.point_color(&point).approx_eq(&Rgb::gray(0.25), 1e-6));

        let black = ImageDecoder::new(DecoderDesc::default().with_palette(Palette::BlackOnWhite))
            .unwrap();
        assert!(black.point_color(&point).approx_eq(&Rgb::gray(0.75), 1e-6));

        let tissue =
            ImageDecoder::new(DecoderDesc::default().with_palette(Palette::Tissue)).unwrap();
        assert!(tissue.point_color(&point).approx_eq(&Rgb::new(0.25, 0.0, 0.0), 1e-6));

        let floored = ImageDecoder::new(DecoderDesc::default().with_brightness_floor(0.1)).unwrap();
        let silent = ScanPoint::new(crate::math::Vec3::ZERO, Vec2::new(0.0, 5.0));
        assert!(floored.point_color(&silent).approx_eq(&Rgb::gray(0.1), 1e-6));
    }

    #[test]
    fn test_decode_into_resizes_and_clears() {
        let decoder = ImageDecoder::new(DecoderDesc::default().with_size(64, 48)).unwrap();
        let frame = build_scanning_plane(&ProbeConfig::default());
        let mut bitmap = ColorBitmap::new(2, 2, Rgb::RED);
        decoder.decode_into(&frame, &mut bitmap);
        assert_eq!((bitmap.width(), bitmap.height()), (64, 48));
        assert!(bitmap.pixels().iter().all(|&p| p == Rgb::BLACK));

        bitmap.fill(Rgb::GREEN);
        decoder.decode_into(&frame, &mut bitmap);
        assert!(bitmap.pixels().iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(ImageDecoder::new(DecoderDesc::default().with_size(0, 0)).is_err());
    }
}
