use crate::image::color::Rgb;
use crate::math::{Vec2, Vec3};
use crate::scene::OrganId;
use std::cmp::Ordering;

/// One sample of the scanning plane.
///
/// `projected` is the position within the plane: `x` across the arc, `y` along the beam
/// (positive for any arc narrower than 180°).
#[derive(Debug, Clone, Copy)]
pub struct ScanPoint {
    world: Vec3,
    projected: Vec2,
    brightness: f32,
    organ: Option<OrganId>,
    tint: Rgb,
}

impl ScanPoint {
    pub fn new(world: Vec3, projected: Vec2) -> Self {
        Self {
            world,
            projected,
            brightness: 0.0,
            organ: None,
            tint: Rgb::WHITE,
        }
    }

    pub fn world_position(&self) -> Vec3 {
        self.world
    }

    pub fn projected_position(&self) -> Vec2 {
        self.projected
    }

    /// Echo intensity in [0, 1].
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Clamped to [0, 1]; NaN becomes 0.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = if brightness.is_nan() {
            0.0
        } else {
            brightness.clamp(0.0, 1.0)
        };
    }

    /// Organ that produced the echo, if any.
    pub fn organ(&self) -> Option<OrganId> {
        self.organ
    }

    /// Display tint of the echoing tissue. White when nothing was hit.
    pub fn tint(&self) -> Rgb {
        self.tint
    }

    pub fn set_echo(&mut self, organ: OrganId, brightness: f32, tint: Rgb) {
        self.organ = Some(organ);
        self.tint = tint;
        self.set_brightness(brightness);
    }

    /// Nothing was hit and no brightness was recorded.
    pub fn is_empty(&self) -> bool {
        self.organ.is_none() && self.brightness == 0.0
    }

    /// Distance from the probe face, i.e. the magnitude of the projected position.
    pub fn range(&self) -> f32 {
        self.projected.length()
    }

    /// Orders points near-to-far.
    pub fn cmp_range(&self, other: &Self) -> Ordering {
        self.range().total_cmp(&other.range())
    }
}

/// Points are the same sample when they occupy the same place; echo data is ignored.
impl PartialEq for ScanPoint {
    fn eq(&self, other: &Self) -> bool {
        self.world == other.world && self.projected == other.projected
    }
}
