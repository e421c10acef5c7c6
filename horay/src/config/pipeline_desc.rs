use crate::error::{HorayError, Result};
use crate::image::decoder::Palette;
use std::time::Duration;

/// Raster layout and color mapping of the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderDesc {
    /// Output width in pixels
    pub width: usize,
    /// Output height in pixels
    pub height: usize,
    pub palette: Palette,
    /// Lower bound applied to echo brightness by the white-on-black palettes.
    ///
    /// 0.0 keeps the strict `base * brightness` product, so an echo-free frame decodes to pure
    /// background. Raising it lifts every drawn sample, which outlines the scanning fan.
    pub brightness_floor: f32,
}

impl Default for DecoderDesc {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            palette: Palette::WhiteOnBlack,
            brightness_floor: 0.0,
        }
    }
}

impl DecoderDesc {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_brightness_floor(mut self, floor: f32) -> Self {
        self.brightness_floor = floor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HorayError::InvalidArgument(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.brightness_floor) {
            return Err(HorayError::Configuration(format!(
                "brightness floor must be in [0, 1], got {}",
                self.brightness_floor
            )));
        }
        Ok(())
    }
}

/// Budget and memory of the organ culler.
#[derive(Debug, Clone, PartialEq)]
pub struct CullerDesc {
    /// Scanlines raycast per frame. Values at or above the scanline count examine every line.
    pub scanlines_per_frame: usize,
    /// How long an organ stays a candidate after it was last seen.
    pub expiration: Duration,
}

impl Default for CullerDesc {
    fn default() -> Self {
        Self {
            scanlines_per_frame: 8,
            expiration: Duration::from_secs(2),
        }
    }
}

impl CullerDesc {
    pub fn with_scanlines_per_frame(mut self, count: usize) -> Self {
        self.scanlines_per_frame = count;
        self
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scanlines_per_frame == 0 {
            return Err(HorayError::InvalidArgument(
                "culler must examine at least one scanline per frame".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration descriptor for an [`UltrasoundPipeline`](crate::UltrasoundPipeline).
///
/// # Example
///
/// ```
/// use horay::{DecoderDesc, Palette, PipelineDesc};
///
/// let desc = PipelineDesc::default()
///     .with_decoder(DecoderDesc::default().with_size(320, 240).with_palette(Palette::BlackOnWhite))
///     .with_blur(4);
/// assert!(desc.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    pub decoder: DecoderDesc,
    pub culler: CullerDesc,
    /// Gaussian blur taps; `None` disables the blur.
    pub blur_taps: Option<usize>,
    /// Blur only the red channel and replicate it (cheaper, for grayscale palettes).
    pub grayscale_blur: bool,
    /// Appends a color inversion after the blur.
    pub invert: bool,
    /// Bounded wait for post-processing workers.
    pub post_timeout: Duration,
    /// Number of row bands the grayscale blur is split into.
    pub worker_bands: usize,
}

impl Default for PipelineDesc {
    fn default() -> Self {
        Self {
            decoder: DecoderDesc::default(),
            culler: CullerDesc::default(),
            blur_taps: None,
            grayscale_blur: false,
            invert: false,
            post_timeout: Duration::from_millis(500),
            worker_bands: 4,
        }
    }
}

impl PipelineDesc {
    pub fn with_decoder(mut self, decoder: DecoderDesc) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_culler(mut self, culler: CullerDesc) -> Self {
        self.culler = culler;
        self
    }

    pub fn with_blur(mut self, taps: usize) -> Self {
        self.blur_taps = Some(taps);
        self
    }

    pub fn with_grayscale_blur(mut self, taps: usize) -> Self {
        self.blur_taps = Some(taps);
        self.grayscale_blur = true;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_post_timeout(mut self, timeout: Duration) -> Self {
        self.post_timeout = timeout;
        self
    }

    /// Checks every field and the constraints between them.
    pub fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        self.culler.validate()?;
        if self.blur_taps == Some(0) {
            return Err(HorayError::InvalidArgument(
                "blur needs at least one tap".to_string(),
            ));
        }
        if self.grayscale_blur && self.blur_taps.is_none() {
            return Err(HorayError::Configuration(
                "grayscale_blur is set but no blur taps are configured".to_string(),
            ));
        }
        if self.grayscale_blur && self.decoder.palette == Palette::Tissue {
            return Err(HorayError::Configuration(
                "grayscale blur would discard the tissue palette's color".to_string(),
            ));
        }
        if self.post_timeout.is_zero() {
            return Err(HorayError::Configuration(
                "post-processing timeout must be non-zero".to_string(),
            ));
        }
        if self.worker_bands == 0 {
            return Err(HorayError::Configuration(
                "worker_bands must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let desc = PipelineDesc::default();
        assert!(desc.validate().is_ok());
        assert_eq!(desc.post_timeout, Duration::from_millis(500));
        assert_eq!(desc.decoder.width, 640);
        assert_eq!(desc.decoder.height, 480);
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let zero_size = PipelineDesc::default().with_decoder(DecoderDesc::default().with_size(0, 10));
        assert!(matches!(
            zero_size.validate(),
            Err(HorayError::InvalidArgument(_))
        ));

        let zero_taps = PipelineDesc::default().with_blur(0);
        assert!(zero_taps.validate().is_err());

        let zero_budget =
            PipelineDesc::default().with_culler(CullerDesc::default().with_scanlines_per_frame(0));
        assert!(zero_budget.validate().is_err());
    }

    #[test]
    fn test_cross_field_constraints() {
        let mut desc = PipelineDesc::default();
        desc.grayscale_blur = true;
        assert!(matches!(
            desc.validate(),
            Err(HorayError::Configuration(_))
        ));

        let tissue_gray = PipelineDesc::default()
            .with_decoder(DecoderDesc::default().with_palette(Palette::Tissue))
            .with_grayscale_blur(3);
        assert!(tissue_gray.validate().is_err());

        let ok = PipelineDesc::default().with_grayscale_blur(3).with_invert(true);
        assert!(ok.validate().is_ok());
    }
}
