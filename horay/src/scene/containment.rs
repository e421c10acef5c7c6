//! Point-in-organ approximation from a handful of inward raycasts.
//!
//! The scene only exposes surface raycasts, so "inside" is decided by shooting rays at the
//! point from fixed directions. A ray that starts outside and reaches the organ's surface
//! before it reaches the point has crossed into the solid; if every direction agrees, the
//! point is taken to be inside. This is exact for convex solids and a reasonable guess for
//! mildly concave ones.

use super::query::{OrganId, SceneQuery};
use crate::math::Vec3;

/// How far away from the tested point each probe ray starts.
pub const PROBE_RAY_LENGTH: f32 = 100.0;

/// The five probe directions (before normalization).
const RAW_DIRECTIONS: [[f32; 3]; 5] = [
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [-1.41, 0.0, -0.5],
    [1.41, 0.0, -0.5],
];

/// Normalized probe directions.
pub fn probe_directions() -> [Vec3; 5] {
    RAW_DIRECTIONS.map(|[x, y, z]| Vec3::new(x, y, z).normalize())
}

/// Whether `point` lies inside `organ`.
///
/// Points outside the organ's bounding box are rejected without casting anything.
pub fn is_contained(scene: &dyn SceneQuery, organ: OrganId, point: Vec3) -> bool {
    if !scene.bounds_contains(organ, point) {
        return false;
    }
    probe_directions().into_iter().all(|direction| {
        let origin = point - direction * PROBE_RAY_LENGTH;
        scene
            .raycast_organ(organ, origin, direction, PROBE_RAY_LENGTH)
            .is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{OrganScene, Shape, TissueMaterial};

    fn sphere_scene() -> (OrganScene, OrganId) {
        let mut scene = OrganScene::new();
        let id = scene
            .add_organ(
                "sphere",
                Shape::sphere(Vec3::new(1.0, 2.0, 3.0), 2.0),
                TissueMaterial::SOFT_TISSUE,
            )
            .unwrap();
        (scene, id)
    }

    #[test]
    fn test_directions_are_normalized() {
        for direction in probe_directions() {
            assert!((direction.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_outside_bounds_never_contained() {
        let (scene, id) = sphere_scene();
        assert!(!is_contained(&scene, id, Vec3::new(1.0, 2.0, 5.5)));
        assert!(!is_contained(&scene, id, Vec3::new(-20.0, 0.0, 0.0)));
    }

    #[test]
    fn test_center_of_convex_solid_contained() {
        let (scene, id) = sphere_scene();
        assert!(is_contained(&scene, id, Vec3::new(1.0, 2.0, 3.0)));
        assert!(is_contained(&scene, id, Vec3::new(1.5, 2.5, 3.5)));

        let mut boxes = OrganScene::new();
        let cuboid = boxes
            .add_organ(
                "box",
                Shape::axis_aligned_box(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)),
                TissueMaterial::SOFT_TISSUE,
            )
            .unwrap();
        assert!(is_contained(&boxes, cuboid, Vec3::ZERO));
        assert!(is_contained(&boxes, cuboid, Vec3::new(0.9, -1.9, 2.9)));
    }

    #[test]
    fn test_bounding_box_corner_of_sphere_not_contained() {
        let (scene, id) = sphere_scene();
        let corner = Vec3::new(1.0, 2.0, 3.0) + Vec3::splat(2.0 * 0.95);
        assert!(scene.bounds_contains(id, corner));
        assert!(!is_contained(&scene, id, corner));
    }

    #[test]
    fn test_unknown_organ_not_contained() {
        let (scene, _) = sphere_scene();
        assert!(!is_contained(&scene, OrganId(7), Vec3::new(1.0, 2.0, 3.0)));
    }
}
