//! Tissue properties used by the HORAY shading model.
//!
//! A material describes how strongly a tissue echoes the pulse back (echogenicity) and how
//! much pulse energy it absorbs on the way through (attenuation). Neither is a physical unit;
//! both are tuned so that a handful of organs along a scanline produce a readable image.

use crate::error::{HorayError, Result};
use crate::image::color::Rgb;

/// Acoustic-ish properties of a tissue.
///
/// # Example
///
/// ```
/// use horay::scene::TissueMaterial;
///
/// let liver = TissueMaterial::LIVER;
/// assert!(liver.validate().is_ok());
///
/// let custom = TissueMaterial::new(0.6, 0.1, horay::Rgb::new(0.8, 0.3, 0.3));
/// assert!(custom.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TissueMaterial {
    /// Fraction of the remaining pulse reflected back as brightness (≥ 0).
    pub echogenicity: f32,

    /// Pulse energy lost per traversed sample (≥ 0). Also darkens the echo slightly.
    pub attenuation: f32,

    /// Display tint used by the tissue palette.
    pub color: Rgb,
}

impl TissueMaterial {
    pub const SOFT_TISSUE: Self = Self::new(0.5, 0.05, Rgb::new(0.85, 0.75, 0.7));

    /// Bright, strongly attenuating. Casts an acoustic shadow behind it.
    pub const BONE: Self = Self::new(1.0, 1.5, Rgb::new(0.95, 0.95, 0.9));

    pub const LIVER: Self = Self::new(0.6, 0.08, Rgb::new(0.6, 0.25, 0.2));

    pub const KIDNEY: Self = Self::new(0.45, 0.06, Rgb::new(0.7, 0.35, 0.35));

    pub const FAT: Self = Self::new(0.8, 0.12, Rgb::new(0.95, 0.9, 0.55));

    /// Anechoic: fluid-filled structures show up black.
    pub const FLUID: Self = Self::new(0.02, 0.005, Rgb::new(0.2, 0.3, 0.8));

    pub const fn new(echogenicity: f32, attenuation: f32, color: Rgb) -> Self {
        Self {
            echogenicity,
            attenuation,
            color,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.echogenicity.is_finite() || self.echogenicity < 0.0 {
            return Err(HorayError::InvalidArgument(format!(
                "echogenicity must be a finite value >= 0, got {}",
                self.echogenicity
            )));
        }
        if !self.attenuation.is_finite() || self.attenuation < 0.0 {
            return Err(HorayError::InvalidArgument(format!(
                "attenuation must be a finite value >= 0, got {}",
                self.attenuation
            )));
        }
        Ok(())
    }
}

impl Default for TissueMaterial {
    fn default() -> Self {
        Self::SOFT_TISSUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for material in [
            TissueMaterial::SOFT_TISSUE,
            TissueMaterial::BONE,
            TissueMaterial::LIVER,
            TissueMaterial::KIDNEY,
            TissueMaterial::FAT,
            TissueMaterial::FLUID,
        ] {
            assert!(material.validate().is_ok(), "{material:?}");
        }
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(TissueMaterial::new(-0.1, 0.0, Rgb::WHITE).validate().is_err());
        assert!(TissueMaterial::new(0.1, -1.0, Rgb::WHITE).validate().is_err());
        assert!(
            TissueMaterial::new(f32::NAN, 0.0, Rgb::WHITE)
                .validate()
                .is_err()
        );
    }
}
