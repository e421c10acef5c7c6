use crate::math::{Pose, Quat, Vec3};

/// Smallest allowed gap between the near and far scan distances.
pub const MIN_DISTANCE_GAP: f32 = 1e-3;
pub const MAX_ARC_DEGREES: f32 = 180.0;

/// Logs a clamped write. Release builds clamp silently.
fn report_clamp<T: std::fmt::Debug + PartialEq>(field: &str, requested: T, applied: T) {
    if cfg!(debug_assertions) && requested != applied {
        log::warn!("ProbeConfig::{field}: requested {requested:?}, clamped to {applied:?}");
    }
}

/// Scan parameters of a probe.
///
/// Every field is validated on write: out-of-range values are clamped, so a `ProbeConfig`
/// always describes a scannable plane. The type is a plain value; a clone taken at the start
/// of a frame is unaffected by later edits to the live configuration.
///
/// # Example
///
/// ```
/// use horay::ProbeConfig;
///
/// let config = ProbeConfig::default()
///     .with_arc_degrees(60.0)
///     .with_scanlines(64)
///     .with_distances(0.5, 12.0);
/// assert_eq!(config.scanlines(), 64);
///
/// let mut clamped = config.clone();
/// clamped.set_arc_degrees(400.0);
/// assert_eq!(clamped.arc_degrees(), 180.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pose: Pose,
    min_distance: f32,
    max_distance: f32,
    arc_degrees: f32,
    scanlines: usize,
    points_per_scanline: usize,
    gain: f32,
    noise_level: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            min_distance: 1.0,
            max_distance: 10.0,
            arc_degrees: 75.0,
            scanlines: 40,
            points_per_scanline: 40,
            gain: 1.0,
            noise_level: 0.0,
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn rotation(&self) -> Quat {
        self.pose.rotation
    }

    /// Near edge of the scanning plane.
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Far edge of the scanning plane; also the decoder's vertical extent.
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn arc_degrees(&self) -> f32 {
        self.arc_degrees
    }

    pub fn scanlines(&self) -> usize {
        self.scanlines
    }

    pub fn points_per_scanline(&self) -> usize {
        self.points_per_scanline
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn noise_level(&self) -> f32 {
        self.noise_level
    }

    pub fn set_pose(&mut self, pose: Pose) {
        let rotation = pose.rotation.normalize();
        self.pose = if rotation.is_finite() {
            Pose::new(pose.position, rotation)
        } else {
            report_clamp("pose", pose.rotation, Quat::IDENTITY);
            Pose::new(pose.position, Quat::IDENTITY)
        };
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.set_pose(Pose::new(position, self.pose.rotation));
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.set_pose(Pose::new(self.pose.position, rotation));
    }

    /// Clamped to `[f32::EPSILON, max_distance - MIN_DISTANCE_GAP]`.
    pub fn set_min_distance(&mut self, distance: f32) {
        let upper = (self.max_distance - MIN_DISTANCE_GAP).max(f32::EPSILON);
        let applied = if distance.is_nan() {
            f32::EPSILON
        } else {
            distance.clamp(f32::EPSILON, upper)
        };
        report_clamp("min_distance", distance, applied);
        self.min_distance = applied;
    }

    /// Clamped to `[min_distance + MIN_DISTANCE_GAP, f32::MAX]`.
    pub fn set_max_distance(&mut self, distance: f32) {
        let lower = self.min_distance + MIN_DISTANCE_GAP;
        let applied = if distance.is_nan() {
            lower
        } else {
            distance.clamp(lower, f32::MAX)
        };
        report_clamp("max_distance", distance, applied);
        self.max_distance = applied;
    }

    /// Sets both distances, ordering the writes so a valid pair is never rejected by the
    /// other bound.
    pub fn set_distances(&mut self, min: f32, max: f32) {
        if min >= self.max_distance {
            self.set_max_distance(max);
            self.set_min_distance(min);
        } else {
            self.set_min_distance(min);
            self.set_max_distance(max);
        }
    }

    /// Clamped to `[0, 180]` degrees.
    pub fn set_arc_degrees(&mut self, degrees: f32) {
        let applied = if degrees.is_nan() {
            0.0
        } else {
            degrees.clamp(0.0, MAX_ARC_DEGREES)
        };
        report_clamp("arc_degrees", degrees, applied);
        self.arc_degrees = applied;
    }

    /// At least one scanline.
    pub fn set_scanlines(&mut self, count: usize) {
        let applied = count.max(1);
        report_clamp("scanlines", count, applied);
        self.scanlines = applied;
    }

    /// At least one point per scanline.
    pub fn set_points_per_scanline(&mut self, count: usize) {
        let applied = count.max(1);
        report_clamp("points_per_scanline", count, applied);
        self.points_per_scanline = applied;
    }

    /// Non-negative.
    pub fn set_gain(&mut self, gain: f32) {
        let applied = if gain.is_nan() { 0.0 } else { gain.max(0.0) };
        report_clamp("gain", gain, applied);
        self.gain = applied;
    }

    /// Clamped to `[0, 1]`.
    pub fn set_noise_level(&mut self, noise: f32) {
        let applied = if noise.is_nan() {
            0.0
        } else {
            noise.clamp(0.0, 1.0)
        };
        report_clamp("noise_level", noise, applied);
        self.noise_level = applied;
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.set_pose(pose);
        self
    }

    pub fn with_distances(mut self, min: f32, max: f32) -> Self {
        self.set_distances(min, max);
        self
    }

    pub fn with_arc_degrees(mut self, degrees: f32) -> Self {
        self.set_arc_degrees(degrees);
        self
    }

    pub fn with_scanlines(mut self, count: usize) -> Self {
        self.set_scanlines(count);
        self
    }

    pub fn with_points_per_scanline(mut self, count: usize) -> Self {
        self.set_points_per_scanline(count);
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.set_gain(gain);
        self
    }

    pub fn with_noise_level(mut self, noise: f32) -> Self {
        self.set_noise_level(noise);
        self
    }

    /// Whether both configurations lay out the same scanning plane, ignoring pose and
    /// shading parameters.
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.min_distance == other.min_distance
            && self.max_distance == other.max_distance
            && self.arc_degrees == other.arc_degrees
            && self.scanlines == other.scanlines
            && self.points_per_scanline == other.points_per_scanline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.min_distance(), 1.0);
        assert_eq!(config.max_distance(), 10.0);
        assert_eq!(config.arc_degrees(), 75.0);
        assert_eq!(config.scanlines(), 40);
        assert_eq!(config.points_per_scanline(), 40);
        assert_eq!(config.gain(), 1.0);
        assert_eq!(config.noise_level(), 0.0);
    }

    #[test]
    fn test_distances_stay_ordered() {
        let mut config = ProbeConfig::default();
        config.set_min_distance(50.0);
        assert!(config.min_distance() < config.max_distance());
        assert!((config.min_distance() - (10.0 - MIN_DISTANCE_GAP)).abs() < 1e-6);

        config.set_max_distance(-3.0);
        assert!(config.max_distance() > config.min_distance());

        config.set_min_distance(0.0);
        assert_eq!(config.min_distance(), f32::EPSILON);
    }

    #[test]
    fn test_set_distances_accepts_any_valid_pair() {
        let config = ProbeConfig::default().with_distances(20.0, 30.0);
        assert_eq!(config.min_distance(), 20.0);
        assert_eq!(config.max_distance(), 30.0);

        let config = config.with_distances(0.5, 2.0);
        assert_eq!(config.min_distance(), 0.5);
        assert_eq!(config.max_distance(), 2.0);
    }

    #[test]
    fn test_counts_and_scalars_clamped() {
        let config = ProbeConfig::default()
            .with_scanlines(0)
            .with_points_per_scanline(0)
            .with_arc_degrees(-10.0)
            .with_gain(-2.0)
            .with_noise_level(3.0);
        assert_eq!(config.scanlines(), 1);
        assert_eq!(config.points_per_scanline(), 1);
        assert_eq!(config.arc_degrees(), 0.0);
        assert_eq!(config.gain(), 0.0);
        assert_eq!(config.noise_level(), 1.0);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut live = ProbeConfig::default();
        let snapshot = live.clone();
        live.set_scanlines(3);
        live.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(snapshot.scanlines(), 40);
        assert_eq!(snapshot.position(), Vec3::ZERO);
    }

    #[test]
    fn test_same_geometry_ignores_pose_and_gain() {
        let a = ProbeConfig::default();
        let b = a
            .clone()
            .with_gain(0.3)
            .with_pose(Pose::from_position(Vec3::ONE));
        assert!(a.same_geometry(&b));
        assert!(!a.same_geometry(&b.with_scanlines(7)));
    }
}
