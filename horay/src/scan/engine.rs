use super::frame::ScanFrame;
use super::plane::ScanningPlane;
use super::shader::{apply_noise, shade_points};
use crate::config::{CullerDesc, ProbeConfig};
use crate::culler::OrganCuller;
use crate::error::Result;
use crate::events::HorayEvent;
use crate::scene::SceneQuery;
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

/// Timing and counts of the last [`ScanEngine::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanStats {
    pub plane_time_us: u64,
    pub cull_time_us: u64,
    pub shade_time_us: u64,
    pub candidates: usize,
    pub echoes: usize,
}

/// The HORAY probe: lays out the scanning plane, culls the scene and shades every point.
pub struct ScanEngine {
    plane: ScanningPlane,
    culler: OrganCuller,
}

impl ScanEngine {
    pub fn new(scene: &dyn SceneQuery, culler: CullerDesc) -> Result<Self> {
        Ok(Self {
            plane: ScanningPlane::new(),
            culler: OrganCuller::new(scene, culler)?,
        })
    }

    pub fn with_event_sender(mut self, sender: Sender<HorayEvent>) -> Self {
        self.culler.set_event_sender(sender);
        self
    }

    pub fn culler(&self) -> &OrganCuller {
        &self.culler
    }

    pub fn culler_mut(&mut self) -> &mut OrganCuller {
        &mut self.culler
    }

    pub fn plane(&self) -> &ScanningPlane {
        &self.plane
    }

    /// Produces one shaded frame for `config`.
    ///
    /// A scene without visible organs yields a valid frame of empty points.
    pub fn scan(
        &mut self,
        config: &ProbeConfig,
        scene: &dyn SceneQuery,
        now: Duration,
    ) -> (ScanFrame, ScanStats) {
        let started = Instant::now();
        let mut frame = self.plane.build(config);
        let plane_time_us = started.elapsed().as_micros() as u64;

        let started = Instant::now();
        let candidates = self.culler.hitable_organs(scene, &frame, now);
        let cull_time_us = started.elapsed().as_micros() as u64;

        let started = Instant::now();
        let echoes = shade_points(&mut frame, scene, &candidates);
        apply_noise(&mut frame);
        let shade_time_us = started.elapsed().as_micros() as u64;

        log::trace!(
            "Scanned {} points against {} candidate(s): {} echo(es)",
            frame.point_count(),
            candidates.len(),
            echoes
        );

        let stats = ScanStats {
            plane_time_us,
            cull_time_us,
            shade_time_us,
            candidates: candidates.len(),
            echoes,
        };
        (frame, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Pose, Quat, Vec3};
    use crate::scene::{OrganScene, Shape, TissueMaterial};

    #[test]
    fn test_empty_scene_yields_silent_frame() {
        let scene = OrganScene::new();
        let mut engine = ScanEngine::new(&scene, CullerDesc::default()).unwrap();
        let (frame, stats) = engine.scan(&ProbeConfig::default(), &scene, Duration::ZERO);
        assert_eq!(frame.point_count(), 1600);
        assert!(frame.is_silent());
        assert_eq!(stats.candidates, 0);
        assert_eq!(stats.echoes, 0);
    }

    #[test]
    fn test_organ_in_view_echoes() {
        let mut scene = OrganScene::new();
        let liver = scene
            .add_organ(
                "liver",
                Shape::sphere(Vec3::new(0.0, 0.0, 6.0), 2.0),
                TissueMaterial::LIVER,
            )
            .unwrap();
        let mut engine = ScanEngine::new(
            &scene,
            CullerDesc::default().with_scanlines_per_frame(64),
        )
        .unwrap();

        let (frame, stats) = engine.scan(&ProbeConfig::default(), &scene, Duration::ZERO);
        assert_eq!(stats.candidates, 1);
        assert!(stats.echoes > 0);
        assert!(frame.points().any(|p| p.organ() == Some(liver)));
        assert!(
            frame
                .points()
                .filter(|p| p.organ() == Some(liver))
                .all(|p| p.world_position().distance(Vec3::new(0.0, 0.0, 6.0)) <= 2.0 + 1e-4)
        );
    }

    #[test]
    fn test_probe_facing_away_sees_nothing() {
        let mut scene = OrganScene::new();
        scene
            .add_organ(
                "liver",
                Shape::sphere(Vec3::new(0.0, 0.0, 6.0), 2.0),
                TissueMaterial::LIVER,
            )
            .unwrap();
        let mut engine = ScanEngine::new(
            &scene,
            CullerDesc::default().with_scanlines_per_frame(64),
        )
        .unwrap();
        let config = ProbeConfig::default()
            .with_pose(Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::PI)));

        let (frame, stats) = engine.scan(&config, &scene, Duration::ZERO);
        assert_eq!(stats.candidates, 0);
        assert!(frame.is_silent());
    }
}
