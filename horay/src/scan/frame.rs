use super::point::ScanPoint;
use super::scanline::Scanline;
use crate::config::ProbeConfig;

/// All scanlines of one frame together with the configuration that produced them.
///
/// The configuration snapshot cannot be changed after construction; scanlines can only be
/// appended.
#[derive(Debug, Clone)]
pub struct ScanFrame {
    config: ProbeConfig,
    scanlines: Vec<Scanline>,
}

impl ScanFrame {
    pub fn new(config: ProbeConfig) -> Self {
        let capacity = config.scanlines();
        Self {
            config,
            scanlines: Vec::with_capacity(capacity),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn push_scanline(&mut self, scanline: Scanline) {
        self.scanlines.push(scanline);
    }

    pub fn scanlines(&self) -> &[Scanline] {
        &self.scanlines
    }

    pub fn scanlines_mut(&mut self) -> &mut [Scanline] {
        &mut self.scanlines
    }

    pub fn points(&self) -> impl Iterator<Item = &ScanPoint> {
        self.scanlines.iter().flat_map(|scanline| scanline.points())
    }

    pub fn point_count(&self) -> usize {
        self.scanlines.iter().map(Scanline::len).sum()
    }

    /// True when no point carries an echo.
    pub fn is_silent(&self) -> bool {
        self.points().all(ScanPoint::is_empty)
    }

    pub fn mean_brightness(&self) -> f32 {
        let count = self.point_count();
        if count == 0 {
            return 0.0;
        }
        self.points().map(ScanPoint::brightness).sum::<f32>() / count as f32
    }
}
