//! Sources of scan frames.

use super::engine::{ScanEngine, ScanStats};
use super::frame::ScanFrame;
use super::point::ScanPoint;
use super::scanline::Scanline;
use crate::config::{CullerDesc, ProbeConfig};
use crate::error::Result;
use crate::events::HorayEvent;
use crate::math::Vec2;
use crate::scene::SceneQuery;
use crossbeam_channel::Sender;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Anything that yields one [`ScanFrame`] per rendered frame.
pub trait ProbeOutput: Send {
    /// Live configuration; the next frame snapshots it.
    fn probe_config(&self) -> &ProbeConfig;

    fn probe_config_mut(&mut self) -> &mut ProbeConfig;

    /// Scans `scene` at time `now`.
    fn scan(&mut self, scene: &dyn SceneQuery, now: Duration) -> ScanFrame;

    /// Statistics of the most recent scan.
    fn last_stats(&self) -> ScanStats {
        ScanStats::default()
    }

    /// Where to report culling events. Outputs without a culler ignore it.
    fn set_event_sender(&mut self, _sender: Sender<HorayEvent>) {}
}

/// Probe output backed by the HORAY scan engine.
pub struct HorayProbeOutput {
    config: ProbeConfig,
    engine: ScanEngine,
    last_stats: ScanStats,
}

impl HorayProbeOutput {
    pub fn new(config: ProbeConfig, scene: &dyn SceneQuery, culler: CullerDesc) -> Result<Self> {
        Ok(Self {
            config,
            engine: ScanEngine::new(scene, culler)?,
            last_stats: ScanStats::default(),
        })
    }

    pub fn with_event_sender(mut self, sender: Sender<HorayEvent>) -> Self {
        self.engine = self.engine.with_event_sender(sender);
        self
    }

    pub fn engine(&self) -> &ScanEngine {
        &self.engine
    }
}

impl ProbeOutput for HorayProbeOutput {
    fn probe_config(&self) -> &ProbeConfig {
        &self.config
    }

    fn probe_config_mut(&mut self) -> &mut ProbeConfig {
        &mut self.config
    }

    fn scan(&mut self, scene: &dyn SceneQuery, now: Duration) -> ScanFrame {
        let snapshot = self.config.clone();
        let (frame, stats) = self.engine.scan(&snapshot, scene, now);
        self.last_stats = stats;
        frame
    }

    fn last_stats(&self) -> ScanStats {
        self.last_stats
    }

    fn set_event_sender(&mut self, sender: Sender<HorayEvent>) {
        self.engine.culler_mut().set_event_sender(sender);
    }
}

/// Synthetic wedge of noisy samples for exercising decoders without a scene.
///
/// The wedge spans `x` in [-4, 4] at the far edge and narrows linearly toward the near edge,
/// sampled every 0.1 units. Brightness is uniform noise from a seeded generator, so a given
/// seed always produces the same sequence of frames.
pub struct TestProbeOutput {
    config: ProbeConfig,
    rng: ChaCha8Rng,
}

impl TestProbeOutput {
    pub const HALF_WIDTH: f32 = 4.0;
    pub const NEAR: f32 = 1.0;
    pub const FAR: f32 = 9.0;
    pub const STEP: f32 = 0.1;

    pub fn new(seed: u64) -> Self {
        Self {
            config: ProbeConfig::default().with_distances(Self::NEAR, Self::FAR),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn samples(from: f32, to: f32) -> impl Iterator<Item = f32> {
        let count = ((to - from) / Self::STEP).round() as usize + 1;
        (0..count).map(move |i| from + i as f32 * Self::STEP)
    }
}

impl ProbeOutput for TestProbeOutput {
    fn probe_config(&self) -> &ProbeConfig {
        &self.config
    }

    fn probe_config_mut(&mut self) -> &mut ProbeConfig {
        &mut self.config
    }

    fn scan(&mut self, _scene: &dyn SceneQuery, _now: Duration) -> ScanFrame {
        let pose = self.config.pose();
        let mut frame = ScanFrame::new(self.config.clone());
        for x in Self::samples(-Self::HALF_WIDTH, Self::HALF_WIDTH) {
            let angle_degrees = x.atan2(Self::FAR).to_degrees();
            let mut scanline = Scanline::new(pose.position, angle_degrees);
            for y in Self::samples(Self::NEAR, Self::FAR) {
                let projected = Vec2::new(x * (y / Self::FAR), y);
                let mut point = ScanPoint::new(pose.plane_to_world(projected), projected);
                point.set_brightness(self.rng.gen_range(0.0..1.0));
                scanline.push(point);
            }
            frame.push_scanline(scanline);
        }
        frame
    }
}
