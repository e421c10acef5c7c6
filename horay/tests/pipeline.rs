use horay::math::{Pose, Quat, Vec3};
use horay::scene::{OrganScene, SceneQuery, Shape, TissueMaterial};
use horay::*;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn abdomen() -> OrganScene {
    let mut scene = OrganScene::new();
    scene
        .add_organ(
            "liver",
            Shape::sphere(Vec3::new(-1.5, 0.0, 6.0), 2.5),
            TissueMaterial::LIVER,
        )
        .unwrap();
    scene
        .add_organ(
            "kidney",
            Shape::cuboid(
                Vec3::new(2.0, 0.0, 7.0),
                Vec3::new(0.8, 1.5, 1.2),
                Quat::from_rotation_y(0.4),
            ),
            TissueMaterial::KIDNEY,
        )
        .unwrap();
    scene
        .add_organ(
            "gallbladder",
            Shape::sphere(Vec3::new(0.5, 0.0, 4.0), 0.7),
            TissueMaterial::FLUID,
        )
        .unwrap();
    scene
}

#[test]
fn sweeping_probe_culls_and_renders() {
    init_logging();
    let scene = abdomen();
    let desc = PipelineDesc::default()
        .with_decoder(DecoderDesc::default().with_size(160, 120))
        .with_culler(
            CullerDesc::default()
                .with_scanlines_per_frame(8)
                .with_expiration(Duration::from_millis(400)),
        )
        .with_blur(2);
    let mut pipeline = UltrasoundPipeline::new(desc, &scene, ProbeConfig::default()).unwrap();

    // Coverage of every scanline takes a handful of frames at 8 lines per frame.
    for frame in 0..6 {
        pipeline.render_frame_at(&scene, Duration::from_millis(frame * 16));
    }
    let entered: Vec<OrganId> = pipeline
        .poll_events()
        .iter()
        .filter(|e| matches!(e, HorayEvent::OrganEntered { .. }))
        .filter_map(HorayEvent::organ)
        .collect();
    assert_eq!(entered.len(), scene.organs().len());

    let timings = pipeline.poll_timing_events();
    assert_eq!(timings.len(), 6);
    assert_eq!(timings.last().unwrap().candidates, 3);
    assert!(pipeline.last_image().pixels().iter().any(|p| p.r > 0.0));

    // Turn the probe away: nothing is hit and every organ expires.
    pipeline
        .probe_config_mut()
        .set_pose(Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::PI)));
    let mut now = Duration::from_millis(100);
    for _ in 0..4 {
        now += Duration::from_millis(200);
        pipeline.render_frame_at(&scene, now);
    }
    let expired = pipeline
        .poll_events()
        .into_iter()
        .filter(|e| matches!(e, HorayEvent::OrganExpired { .. }))
        .count();
    assert_eq!(expired, 3);
    let timings = pipeline.poll_timing_events();
    assert_eq!(timings.len(), 4);
    assert_eq!(timings.last().unwrap().candidates, 0);
    assert_eq!(timings.last().unwrap().echoes, 0);
}

#[test]
fn shading_is_bounded_and_attenuates_with_depth() {
    init_logging();
    let mut scene = OrganScene::new();
    scene
        .add_organ(
            "slab",
            Shape::axis_aligned_box(Vec3::new(0.0, 0.0, 6.0), Vec3::new(10.0, 10.0, 5.5)),
            TissueMaterial::FAT,
        )
        .unwrap();

    let probe = ProbeConfig::default().with_gain(1.5).with_scanlines(9);
    let mut output = HorayProbeOutput::new(
        probe,
        &scene,
        CullerDesc::default().with_scanlines_per_frame(64),
    )
    .unwrap();
    let frame = output.scan(&scene, Duration::ZERO);

    assert!(frame.points().all(|p| (0.0..=1.0).contains(&p.brightness())));
    for scanline in frame.scanlines() {
        let points = scanline.points();
        assert!(points.windows(2).all(|w| w[1].brightness() <= w[0].brightness()));
        assert!(points[0].brightness() > points[points.len() - 1].brightness());
    }
}

#[test]
fn inverted_palette_on_empty_scene_is_white() {
    init_logging();
    let scene = OrganScene::new();
    let desc = PipelineDesc::default()
        .with_decoder(DecoderDesc::default().with_size(64, 48).with_palette(Palette::BlackOnWhite));
    let mut pipeline = UltrasoundPipeline::new(desc, &scene, ProbeConfig::default()).unwrap();
    let image = pipeline.render_frame(&scene);
    assert!(image.pixels().iter().all(|&p| p == Rgb::WHITE));
}
