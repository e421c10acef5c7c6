use super::point::ScanPoint;
use crate::math::{Vec2, Vec3};

/// A single beam of the scanning fan, with its points ordered near to far.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanline {
    origin: Vec3,
    angle_degrees: f32,
    trajectory: Vec2,
    points: Vec<ScanPoint>,
}

/// Unit beam direction in plane space for an angle off the centre line.
///
/// The forward component is clamped at zero: the edge beams of a 180° fan run along
/// the transducer face, never behind it.
pub(crate) fn beam_direction(angle_degrees: f32) -> Vec2 {
    let radians = angle_degrees.to_radians();
    Vec2::new(radians.sin(), radians.cos().max(0.0))
}

impl Scanline {
    pub fn new(origin: Vec3, angle_degrees: f32) -> Self {
        Self {
            origin,
            angle_degrees,
            trajectory: beam_direction(angle_degrees),
            points: Vec::new(),
        }
    }

    pub fn with_capacity(origin: Vec3, angle_degrees: f32, capacity: usize) -> Self {
        let mut scanline = Self::new(origin, angle_degrees);
        scanline.points.reserve(capacity);
        scanline
    }

    /// World position of the transducer element emitting this beam.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Angle from the plane's centre line, in degrees (negative to the left).
    pub fn angle_degrees(&self) -> f32 {
        self.angle_degrees
    }

    /// Unit direction within the scanning plane.
    pub fn trajectory(&self) -> Vec2 {
        self.trajectory
    }

    pub fn push(&mut self, point: ScanPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [ScanPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ScanPoint> {
        self.points.first()
    }

    /// The farthest sample, where the culler's raycast ends.
    pub fn terminal(&self) -> Option<&ScanPoint> {
        self.points.last()
    }
}
