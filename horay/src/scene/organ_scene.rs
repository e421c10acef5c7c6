//! In-memory reference scene built from analytic shapes.

use super::material::TissueMaterial;
use super::query::{OrganId, RayHit, SceneQuery};
use super::shapes::Shape;
use crate::error::{HorayError, Result};
use crate::math::Vec3;

/// One volume of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Organ {
    pub name: String,
    pub shape: Shape,
    pub material: TissueMaterial,
    /// Only tagged organs are culled, shaded and imaged. Untagged ones still block raycasts.
    pub tagged: bool,
}

/// A flat list of organs answering [`SceneQuery`] by brute force.
///
/// # Example
///
/// ```
/// use horay::math::Vec3;
/// use horay::scene::{OrganScene, SceneQuery, Shape, TissueMaterial};
///
/// let mut scene = OrganScene::new();
/// let liver = scene.add_organ("liver", Shape::sphere(Vec3::new(0.0, 0.0, 5.0), 2.0), TissueMaterial::LIVER)?;
/// assert_eq!(scene.organs(), vec![liver]);
/// # Ok::<(), horay::HorayError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrganScene {
    organs: Vec<Organ>,
}

impl OrganScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tagged organ.
    ///
    /// # Errors
    ///
    /// Returns an error if the material's properties are invalid
    pub fn add_organ(
        &mut self,
        name: impl Into<String>,
        shape: Shape,
        material: TissueMaterial,
    ) -> Result<OrganId> {
        self.add(Organ {
            name: name.into(),
            shape,
            material,
            tagged: true,
        })
    }

    /// Adds geometry that is not imaged.
    pub fn add_untagged(
        &mut self,
        name: impl Into<String>,
        shape: Shape,
        material: TissueMaterial,
    ) -> Result<OrganId> {
        self.add(Organ {
            name: name.into(),
            shape,
            material,
            tagged: false,
        })
    }

    fn add(&mut self, organ: Organ) -> Result<OrganId> {
        organ.material.validate()?;
        let id = OrganId(self.organs.len());
        log::debug!("Added {} '{}' (tagged: {})", id, organ.name, organ.tagged);
        self.organs.push(organ);
        Ok(id)
    }

    pub fn get(&self, organ: OrganId) -> Option<&Organ> {
        self.organs.get(organ.0)
    }

    fn get_mut(&mut self, organ: OrganId) -> Result<&mut Organ> {
        self.organs
            .get_mut(organ.0)
            .ok_or_else(|| HorayError::Scene(format!("unknown {organ}")))
    }

    pub fn set_shape(&mut self, organ: OrganId, shape: Shape) -> Result<()> {
        self.get_mut(organ)?.shape = shape;
        Ok(())
    }

    pub fn set_material(&mut self, organ: OrganId, material: TissueMaterial) -> Result<()> {
        material.validate()?;
        self.get_mut(organ)?.material = material;
        Ok(())
    }

    pub fn set_tagged(&mut self, organ: OrganId, tagged: bool) -> Result<()> {
        self.get_mut(organ)?.tagged = tagged;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<OrganId> {
        self.organs
            .iter()
            .position(|organ| organ.name == name)
            .map(OrganId)
    }

    /// Iterates over every organ, tagged or not.
    pub fn iter(&self) -> impl Iterator<Item = (OrganId, &Organ)> {
        self.organs
            .iter()
            .enumerate()
            .map(|(index, organ)| (OrganId(index), organ))
    }

    pub fn len(&self) -> usize {
        self.organs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organs.is_empty()
    }
}

impl SceneQuery for OrganScene {
    fn organs(&self) -> Vec<OrganId> {
        self.iter()
            .filter(|(_, organ)| organ.tagged)
            .map(|(id, _)| id)
            .collect()
    }

    fn bounds_contains(&self, organ: OrganId, point: Vec3) -> bool {
        self.get(organ)
            .is_some_and(|organ| organ.shape.bounds().contains(point))
    }

    fn raycast_organ(
        &self,
        organ: OrganId,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<RayHit> {
        let entry = self.get(organ)?;
        let distance = entry.shape.raycast(origin, direction, max_distance)?;
        Some(RayHit {
            organ,
            distance,
            material: entry.material,
        })
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .iter()
            .filter_map(|(id, _)| self.raycast_organ(id, origin, direction, max_distance))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn material(&self, organ: OrganId) -> Option<TissueMaterial> {
        self.get(organ).map(|organ| organ.material)
    }

    fn is_tagged(&self, organ: OrganId) -> bool {
        self.get(organ).is_some_and(|organ| organ.tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> (OrganScene, OrganId, OrganId) {
        let mut scene = OrganScene::new();
        let near = scene
            .add_organ(
                "near",
                Shape::sphere(Vec3::new(0.0, 0.0, 3.0), 1.0),
                TissueMaterial::LIVER,
            )
            .unwrap();
        let wall = scene
            .add_untagged(
                "wall",
                Shape::axis_aligned_box(Vec3::new(0.0, 0.0, 8.0), Vec3::splat(1.0)),
                TissueMaterial::BONE,
            )
            .unwrap();
        (scene, near, wall)
    }

    #[test]
    fn test_only_tagged_organs_enumerated() {
        let (scene, near, wall) = scene();
        assert_eq!(scene.organs(), vec![near]);
        assert!(scene.is_tagged(near));
        assert!(!scene.is_tagged(wall));
    }

    #[test]
    fn test_raycast_reports_all_hits_sorted() {
        let (scene, near, wall) = scene();
        let hits = scene.raycast(Vec3::ZERO, Vec3::Z, 20.0);
        let organs: Vec<_> = hits.iter().map(|hit| hit.organ).collect();
        assert_eq!(organs, vec![near, wall]);
        assert!((hits[0].distance - 2.0).abs() < 1e-5);
        assert!((hits[1].distance - 7.0).abs() < 1e-5);
        assert_eq!(hits[1].material, TissueMaterial::BONE);
    }

    #[test]
    fn test_unknown_organ_is_scene_error() {
        let (mut scene, ..) = scene();
        assert!(matches!(
            scene.set_tagged(OrganId(42), true),
            Err(HorayError::Scene(_))
        ));
    }

    #[test]
    fn test_invalid_material_rejected() {
        let mut scene = OrganScene::new();
        let result = scene.add_organ(
            "bad",
            Shape::sphere(Vec3::ZERO, 1.0),
            TissueMaterial::new(-1.0, 0.0, crate::Rgb::WHITE),
        );
        assert!(matches!(result, Err(HorayError::InvalidArgument(_))));
        assert!(scene.is_empty());
    }
}
