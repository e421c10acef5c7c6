//! Scanning-plane geometry.
//!
//! The plane is a fan of `N` scanlines spread evenly over the arc, each sampled at `M` depths
//! between the near and far distances. Layout in plane coordinates only depends on those four
//! numbers, so it is computed once and reused until they change; the probe pose is applied
//! every frame.

use super::frame::ScanFrame;
use super::point::ScanPoint;
use super::scanline::{Scanline, beam_direction};
use crate::config::ProbeConfig;
use crate::math::Vec2;

/// Angle of scanline `index` out of `count`, in degrees.
///
/// Both extremes of the arc are included; a single scanline points straight ahead.
pub fn scanline_angle(index: usize, count: usize, arc_degrees: f32) -> f32 {
    if count <= 1 {
        return 0.0;
    }
    -arc_degrees / 2.0 + index as f32 * arc_degrees / (count - 1) as f32
}

/// Depth of sample `index` out of `count` along a scanline.
///
/// Both `near` and `far` are sampled; a single sample sits at `near`.
pub fn sample_depth(index: usize, count: usize, near: f32, far: f32) -> f32 {
    if count <= 1 {
        return near;
    }
    near + index as f32 * (far - near) / (count - 1) as f32
}

#[derive(Debug, Clone)]
struct LineLayout {
    angle_degrees: f32,
    projected: Vec<Vec2>,
}

/// Cached plane-space layout of the scanning fan.
#[derive(Debug, Clone, Default)]
pub struct ScanningPlane {
    geometry: Option<ProbeConfig>,
    lines: Vec<LineLayout>,
    rebuilds: usize,
}

impl ScanningPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the layout has been recomputed.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    fn ensure_layout(&mut self, config: &ProbeConfig) {
        if self
            .geometry
            .as_ref()
            .is_some_and(|cached| cached.same_geometry(config))
        {
            return;
        }

        let scanlines = config.scanlines();
        let points = config.points_per_scanline();
        log::debug!(
            "Rebuilding scanning plane: {} scanlines x {} points, arc {}°, depth {}..{}",
            scanlines,
            points,
            config.arc_degrees(),
            config.min_distance(),
            config.max_distance()
        );

        self.lines = (0..scanlines)
            .map(|i| {
                let angle_degrees = scanline_angle(i, scanlines, config.arc_degrees());
                let trajectory = beam_direction(angle_degrees);
                let projected = (0..points)
                    .map(|j| {
                        trajectory
                            * sample_depth(j, points, config.min_distance(), config.max_distance())
                    })
                    .collect();
                LineLayout {
                    angle_degrees,
                    projected,
                }
            })
            .collect();
        self.geometry = Some(config.clone());
        self.rebuilds += 1;
    }

    /// Lays out a frame of empty points for `config`, placed at the configured pose.
    pub fn build(&mut self, config: &ProbeConfig) -> ScanFrame {
        self.ensure_layout(config);

        let pose = config.pose();
        let mut frame = ScanFrame::new(config.clone());
        for line in &self.lines {
            let mut scanline =
                Scanline::with_capacity(pose.position, line.angle_degrees, line.projected.len());
            for &projected in &line.projected {
                scanline.push(ScanPoint::new(pose.plane_to_world(projected), projected));
            }
            frame.push_scanline(scanline);
        }
        frame
    }
}

/// One-shot layout without caching.
pub fn build_scanning_plane(config: &ProbeConfig) -> ScanFrame {
    ScanningPlane::new().build(config)
}
