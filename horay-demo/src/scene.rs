use horay::math::{Quat, Vec3};
use horay::scene::{OrganScene, Shape, TissueMaterial};
use horay::HorayError;

/// Reference abdomen: a liver, a kidney, a gallbladder and a rib that shadows part of the view.
pub fn abdomen() -> Result<OrganScene, HorayError> {
    let mut scene = OrganScene::new();
    scene.add_organ(
        "liver",
        Shape::sphere(Vec3::new(-1.5, 0.0, 6.0), 2.5),
        TissueMaterial::LIVER,
    )?;
    scene.add_organ(
        "kidney",
        Shape::cuboid(
            Vec3::new(2.2, 0.0, 7.0),
            Vec3::new(0.8, 1.5, 1.2),
            Quat::from_rotation_y(0.4),
        ),
        TissueMaterial::KIDNEY,
    )?;
    scene.add_organ(
        "gallbladder",
        Shape::sphere(Vec3::new(0.6, 0.0, 4.0), 0.7),
        TissueMaterial::FLUID,
    )?;
    scene.add_organ(
        "rib",
        Shape::cuboid(
            Vec3::new(2.0, 0.0, 2.2),
            Vec3::new(0.6, 2.0, 0.2),
            Quat::from_rotation_y(-0.2),
        ),
        TissueMaterial::BONE,
    )?;
    scene.add_untagged(
        "diaphragm",
        Shape::axis_aligned_box(Vec3::new(0.0, 0.0, 9.8), Vec3::new(6.0, 3.0, 0.1)),
        TissueMaterial::SOFT_TISSUE,
    )?;
    Ok(scene)
}
