//! Analytic solids for the reference scene.

use crate::math::{Aabb, Quat, Vec3};
use glam::Mat3;

/// A closed convex solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// Box with arbitrary orientation.
    Cuboid {
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
    },
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    pub fn cuboid(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self::Cuboid {
            center,
            half_extents: half_extents.abs(),
            rotation: rotation.normalize(),
        }
    }

    pub fn axis_aligned_box(center: Vec3, half_extents: Vec3) -> Self {
        Self::cuboid(center, half_extents, Quat::IDENTITY)
    }

    pub fn center(&self) -> Vec3 {
        match *self {
            Self::Sphere { center, .. } | Self::Cuboid { center, .. } => center,
        }
    }

    /// Tight world-space bounds.
    pub fn bounds(&self) -> Aabb {
        match *self {
            Self::Sphere { center, radius } => {
                Aabb::from_center_half_extents(center, Vec3::splat(radius))
            }
            Self::Cuboid {
                center,
                half_extents,
                rotation,
            } => {
                let axes = Mat3::from_quat(rotation);
                let extent = axes.x_axis.abs() * half_extents.x
                    + axes.y_axis.abs() * half_extents.y
                    + axes.z_axis.abs() * half_extents.z;
                Aabb::from_center_half_extents(center, extent)
            }
        }
    }

    /// Exact point-in-solid test (boundary inclusive).
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Sphere { center, radius } => point.distance_squared(center) <= radius * radius,
            Self::Cuboid {
                center,
                half_extents,
                rotation,
            } => {
                let local = rotation.inverse() * (point - center);
                local.abs().cmple(half_extents).all()
            }
        }
    }

    /// Distance along `direction` to where the ray enters the solid, within `max_distance`.
    ///
    /// An origin already inside the solid reports `Some(0.0)`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        if self.contains(origin) {
            return Some(0.0);
        }
        let entry = match *self {
            Self::Sphere { center, radius } => ray_sphere(origin, direction, center, radius),
            Self::Cuboid {
                center,
                half_extents,
                rotation,
            } => {
                let inverse = rotation.inverse();
                ray_box(
                    inverse * (origin - center),
                    inverse * direction,
                    half_extents,
                )
            }
        }?;
        (entry <= max_distance).then_some(entry)
    }
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let oc = origin - center;
    let half_b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-half_b - discriminant.sqrt()) / a;
    (t >= 0.0).then_some(t)
}

/// Slab test in the box's local frame.
fn ray_box(origin: Vec3, direction: Vec3, half_extents: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];
        if d.abs() <= f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
        if t_near > t_far {
            return None;
        }
    }
    (t_near >= 0.0 && t_near.is_finite()).then_some(t_near)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_entry_distance() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let hit = sphere.raycast(Vec3::ZERO, Vec3::Z, 100.0).unwrap();
        assert!((hit - 8.0).abs() < 1e-5);
        assert_eq!(sphere.raycast(Vec3::ZERO, Vec3::Z, 7.9), None);
        assert_eq!(sphere.raycast(Vec3::ZERO, -Vec3::Z, 100.0), None);
    }

    #[test]
    fn test_origin_inside_hits_at_zero() {
        let cuboid = Shape::axis_aligned_box(Vec3::ZERO, Vec3::ONE);
        assert_eq!(cuboid.raycast(Vec3::ZERO, Vec3::X, 5.0), Some(0.0));
    }

    #[test]
    fn test_rotated_cuboid() {
        let cuboid = Shape::cuboid(
            Vec3::ZERO,
            Vec3::new(2.0, 0.5, 0.5),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        // Long axis now runs along Z.
        assert!(cuboid.contains(Vec3::new(0.0, 0.0, 1.9)));
        assert!(!cuboid.contains(Vec3::new(1.9, 0.0, 0.0)));

        let hit = cuboid
            .raycast(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, 100.0)
            .unwrap();
        assert!((hit - 8.0).abs() < 1e-4);

        let bounds = cuboid.bounds();
        assert!((bounds.max - Vec3::new(0.5, 0.5, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_ray_parallel_to_slab_outside_misses() {
        let cuboid = Shape::axis_aligned_box(Vec3::ZERO, Vec3::ONE);
        assert_eq!(
            cuboid.raycast(Vec3::new(-5.0, 2.0, 0.0), Vec3::X, 100.0),
            None
        );
    }
}
