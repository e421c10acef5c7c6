pub mod containment;
pub mod material;
pub mod organ_scene;
pub mod query;
pub mod shapes;

pub use containment::is_contained;
pub use material::TissueMaterial;
pub use organ_scene::{Organ, OrganScene};
pub use query::{OrganId, RayHit, SceneQuery};
pub use shapes::Shape;
