//! Scene query trait.
//!
//! The image-formation core never owns geometry. Whatever holds the organ volumes (a game
//! engine, a physics library, or the bundled [`OrganScene`](super::OrganScene)) answers these
//! queries on its behalf.

use super::material::TissueMaterial;
use crate::math::Vec3;

/// Opaque handle of an organ volume inside a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrganId(pub usize);

impl std::fmt::Display for OrganId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "organ#{}", self.0)
    }
}

/// A single ray/organ intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub organ: OrganId,

    /// Distance from the ray origin to the first surface crossing.
    ///
    /// Zero when the origin already lies inside the organ.
    pub distance: f32,

    pub material: TissueMaterial,
}

/// Geometry queries issued by the culler, the containment test and the shader.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: a scene is shared with the pipeline by reference
/// and may be read while post-processing workers run.
///
/// # Example
///
/// ```
/// use horay::math::Vec3;
/// use horay::scene::{OrganId, RayHit, SceneQuery, TissueMaterial};
///
/// struct Empty;
///
/// impl SceneQuery for Empty {
///     fn organs(&self) -> Vec<OrganId> {
///         Vec::new()
///     }
///     fn bounds_contains(&self, _organ: OrganId, _point: Vec3) -> bool {
///         false
///     }
///     fn raycast_organ(&self, _: OrganId, _: Vec3, _: Vec3, _: f32) -> Option<RayHit> {
///         None
///     }
///     fn raycast(&self, _: Vec3, _: Vec3, _: f32) -> Vec<RayHit> {
///         Vec::new()
///     }
///     fn material(&self, _organ: OrganId) -> Option<TissueMaterial> {
///         None
///     }
/// }
/// ```
pub trait SceneQuery: Send + Sync {
    /// Organs tagged for ultrasound imaging. Untagged geometry is never reported here.
    fn organs(&self) -> Vec<OrganId>;

    /// Whether `point` lies inside the axis-aligned bounds of `organ`.
    fn bounds_contains(&self, organ: OrganId, point: Vec3) -> bool;

    /// Intersects a ray with one organ only.
    ///
    /// # Parameters
    ///
    /// * `direction` - normalized
    /// * `max_distance` - hits further than this are ignored
    fn raycast_organ(
        &self,
        organ: OrganId,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<RayHit>;

    /// Every organ the ray crosses within `max_distance`, tagged or not.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RayHit>;

    fn material(&self, organ: OrganId) -> Option<TissueMaterial>;

    /// Whether `organ` takes part in imaging. Defaults to membership in [`SceneQuery::organs`].
    fn is_tagged(&self, organ: OrganId) -> bool {
        self.organs().contains(&organ)
    }
}
