//! Math types for HORAY

pub use glam::{Quat, Vec2, Vec3};

/// Position and orientation of the probe in world space.
///
/// The scanning plane is the probe's local XZ plane: local +Z is the beam's "forward"
/// direction and local +X spans the arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Direction the centre scanline points at.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Maps a point of the scanning plane (x across the arc, y along the beam) to world space.
    pub fn plane_to_world(&self, projected: Vec2) -> Vec3 {
        self.rotation * Vec3::new(projected.x, 0.0, projected.y) + self.position
    }

    /// Inverse of [`Pose::plane_to_world`], discarding the out-of-plane component.
    pub fn world_to_plane(&self, world: Vec3) -> Vec2 {
        let local = self.rotation.inverse() * (world - self.position);
        Vec2::new(local.x, local.z)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_round_trip_under_rotation() {
        let pose = Pose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_3),
        );
        let projected = Vec2::new(-0.75, 4.5);
        let world = pose.plane_to_world(projected);
        let back = pose.world_to_plane(world);
        assert!((back - projected).length() < 1e-5);
    }

    #[test]
    fn test_identity_plane_embeds_in_xz() {
        let pose = Pose::identity();
        assert_eq!(
            pose.plane_to_world(Vec2::new(2.0, 5.0)),
            Vec3::new(2.0, 0.0, 5.0)
        );
        assert_eq!(pose.forward(), Vec3::Z);
    }

    #[test]
    fn test_aabb_contains_is_inclusive() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains(Vec3::ONE));
        assert!(aabb.contains(Vec3::ZERO));
        assert!(!aabb.contains(Vec3::new(1.01, 0.0, 0.0)));
        assert_eq!(aabb.center(), Vec3::ZERO);
        assert_eq!(Aabb::new(Vec3::ONE, -Vec3::ONE), aabb);
    }
}
