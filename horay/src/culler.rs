//! Organ culling.
//!
//! Testing every point against every organ in the scene is the dominant cost of a frame. The
//! culler narrows the candidate list with a sliding time-window presence cache: each frame a
//! few scanlines are raycast end to end, every tagged organ they cross is stamped "seen now",
//! and organs not seen for longer than the expiration window drop out. An organ therefore only
//! has to be *found* once per window, not every frame.
//!
//! The examined scanlines advance by a stride coprime with the scanline count, so the rotating
//! cursor reaches every scanline within `ceil(N / K)` frames.

use crate::config::CullerDesc;
use crate::error::Result;
use crate::events::HorayEvent;
use crate::scan::{ScanFrame, Scanline};
use crate::scene::{OrganId, SceneQuery};
use crossbeam_channel::Sender;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Step between examined scanlines when `budget` of `scanlines` are raycast per frame.
///
/// Never divides `scanlines` evenly and shares no factor with it.
pub fn culling_stride(scanlines: usize, budget: usize) -> usize {
    let budget = budget.max(1);
    let mut stride = (scanlines / budget).max(2);
    while scanlines % stride == 0 || gcd(stride, scanlines) != 1 {
        stride += 1;
    }
    stride
}

pub struct OrganCuller {
    desc: CullerDesc,
    tagged: HashSet<OrganId>,
    /// Last-seen time (nanoseconds) -> organ. Keys are unique; collisions are nudged forward.
    by_time: BTreeMap<u64, OrganId>,
    by_organ: HashMap<OrganId, u64>,
    cursor: usize,
    event_sender: Option<Sender<HorayEvent>>,
}

impl OrganCuller {
    /// Creates a culler over the organs `scene` currently tags.
    pub fn new(scene: &dyn SceneQuery, desc: CullerDesc) -> Result<Self> {
        desc.validate()?;
        let tagged: HashSet<OrganId> = scene.organs().into_iter().collect();
        log::info!(
            "Organ culler tracking {} tagged organ(s), {} scanline(s)/frame, expiration {:?}",
            tagged.len(),
            desc.scanlines_per_frame,
            desc.expiration
        );
        Ok(Self {
            desc,
            tagged,
            by_time: BTreeMap::new(),
            by_organ: HashMap::new(),
            cursor: 0,
            event_sender: None,
        })
    }

    /// Reports cache insertions and evictions to `sender`.
    pub fn with_event_sender(mut self, sender: Sender<HorayEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn set_event_sender(&mut self, sender: Sender<HorayEvent>) {
        self.event_sender = Some(sender);
    }

    pub fn desc(&self) -> &CullerDesc {
        &self.desc
    }

    /// Re-reads the tagged organ set, for scenes whose tagging changed.
    pub fn retag(&mut self, scene: &dyn SceneQuery) {
        self.tagged = scene.organs().into_iter().collect();
        let stale: Vec<OrganId> = self
            .by_organ
            .keys()
            .filter(|organ| !self.tagged.contains(organ))
            .copied()
            .collect();
        for organ in stale {
            if let Some(timestamp) = self.by_organ.remove(&organ) {
                self.by_time.remove(&timestamp);
            }
        }
    }

    /// Cached organs, oldest sighting first.
    pub fn cached(&self) -> Vec<OrganId> {
        self.by_time.values().copied().collect()
    }

    pub fn contains(&self, organ: OrganId) -> bool {
        self.by_organ.contains_key(&organ)
    }

    pub fn len(&self) -> usize {
        self.by_organ.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_organ.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_time.clear();
        self.by_organ.clear();
        self.cursor = 0;
    }

    /// Indices of the scanlines to raycast this frame, advancing the cursor.
    pub fn next_scanlines(&mut self, scanlines: usize) -> Vec<usize> {
        if scanlines == 0 {
            return Vec::new();
        }
        let budget = self.desc.scanlines_per_frame;
        if budget >= scanlines {
            return (0..scanlines).collect();
        }

        let stride = culling_stride(scanlines, budget);
        let start = self.cursor % scanlines;
        let indices = (0..budget)
            .map(|step| (start + step * stride) % scanlines)
            .collect();
        self.cursor = (start + budget * stride) % scanlines;
        indices
    }

    /// Updates the presence cache from this frame's scanlines and returns the candidate
    /// organs, oldest sighting first.
    ///
    /// `now` is any monotonic clock reading; only differences between calls matter.
    pub fn hitable_organs(
        &mut self,
        scene: &dyn SceneQuery,
        frame: &ScanFrame,
        now: Duration,
    ) -> Vec<OrganId> {
        let now_nanos = now.as_nanos() as u64;
        let scanlines = frame.scanlines();

        for index in self.next_scanlines(scanlines.len()) {
            for organ in self.organs_on(scene, &scanlines[index]) {
                self.touch(organ, now_nanos);
            }
        }
        self.evict(now_nanos);

        self.cached()
    }

    fn organs_on(&self, scene: &dyn SceneQuery, scanline: &Scanline) -> Vec<OrganId> {
        let Some(terminal) = scanline.terminal() else {
            return Vec::new();
        };
        let origin = scanline.origin();
        let span = terminal.world_position() - origin;
        let length = span.length();
        if length <= f32::EPSILON {
            return Vec::new();
        }

        scene
            .raycast(origin, span / length, length)
            .into_iter()
            .map(|hit| hit.organ)
            .filter(|organ| self.tagged.contains(organ))
            .collect()
    }

    fn touch(&mut self, organ: OrganId, now_nanos: u64) {
        let previous = self.by_organ.remove(&organ);
        if let Some(timestamp) = previous {
            self.by_time.remove(&timestamp);
        }

        let mut timestamp = now_nanos;
        while self.by_time.contains_key(&timestamp) {
            timestamp += 1;
        }
        self.by_time.insert(timestamp, organ);
        self.by_organ.insert(organ, timestamp);

        if previous.is_none() {
            log::debug!("Culler: {organ} entered the candidate list");
            self.emit(HorayEvent::OrganEntered { organ });
        }
    }

    fn evict(&mut self, now_nanos: u64) {
        let window = self.desc.expiration.as_nanos() as u64;
        while let Some((&timestamp, &organ)) = self.by_time.first_key_value() {
            if now_nanos.saturating_sub(timestamp) <= window {
                break;
            }
            self.by_time.pop_first();
            self.by_organ.remove(&organ);
            log::debug!("Culler: {organ} expired");
            self.emit(HorayEvent::OrganExpired {
                organ,
                last_seen: Duration::from_nanos(timestamp),
            });
        }
    }

    fn emit(&self, event: HorayEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::math::Vec3;
    use crate::scan::build_scanning_plane;
    use crate::scene::{OrganScene, Shape, TissueMaterial};
    use crossbeam_channel::unbounded;

    fn every_line() -> CullerDesc {
        CullerDesc::default()
            .with_scanlines_per_frame(usize::MAX)
            .with_expiration(Duration::from_secs(2))
    }

    fn in_front() -> Shape {
        Shape::sphere(Vec3::new(0.0, 0.0, 5.0), 1.5)
    }

    fn far_away() -> Shape {
        Shape::sphere(Vec3::new(0.0, 500.0, 0.0), 1.5)
    }

    #[test]
    fn test_stride_is_coprime_and_non_dividing() {
        assert_eq!(culling_stride(40, 8), 7);
        assert_eq!(culling_stride(10, 9), 3);
        for n in 2..64 {
            for k in 1..n {
                let stride = culling_stride(n, k);
                assert!(stride >= 2);
                assert_ne!(n % stride, 0);
                assert_eq!(gcd(stride, n), 1);
            }
        }
    }

    #[test]
    fn test_rotating_cursor_covers_all_scanlines() {
        let scene = OrganScene::new();
        let mut culler = OrganCuller::new(
            &scene,
            CullerDesc::default().with_scanlines_per_frame(8),
        )
        .unwrap();

        let mut seen = HashSet::new();
        for _ in 0..5 {
            let indices = culler.next_scanlines(40);
            assert_eq!(indices.len(), 8);
            seen.extend(indices);
        }
        assert_eq!(seen.len(), 40);
    }

    #[test]
    fn test_budget_above_count_examines_everything() {
        let scene = OrganScene::new();
        let mut culler = OrganCuller::new(&scene, every_line()).unwrap();
        assert_eq!(culler.next_scanlines(5), vec![0, 1, 2, 3, 4]);
        assert!(culler.next_scanlines(0).is_empty());
    }

    #[test]
    fn test_eviction_and_refresh() {
        let mut scene = OrganScene::new();
        let organ = scene
            .add_organ("target", in_front(), TissueMaterial::LIVER)
            .unwrap();
        let frame = build_scanning_plane(&ProbeConfig::default());
        let mut culler = OrganCuller::new(&scene, every_line()).unwrap();

        assert_eq!(
            culler.hitable_organs(&scene, &frame, Duration::ZERO),
            vec![organ]
        );

        // Out of view but still inside the window.
        scene.set_shape(organ, far_away()).unwrap();
        assert_eq!(
            culler.hitable_organs(&scene, &frame, Duration::from_millis(1500)),
            vec![organ]
        );

        // Re-observed before expiry: refreshed, so it survives past the original deadline.
        scene.set_shape(organ, in_front()).unwrap();
        culler.hitable_organs(&scene, &frame, Duration::from_millis(1900));
        scene.set_shape(organ, far_away()).unwrap();
        assert_eq!(
            culler.hitable_organs(&scene, &frame, Duration::from_millis(3500)),
            vec![organ]
        );

        // Not seen for longer than the window.
        assert!(
            culler
                .hitable_organs(&scene, &frame, Duration::from_millis(4000))
                .is_empty()
        );
        assert!(!culler.contains(organ));
    }

    #[test]
    fn test_collisions_are_nudged_and_untagged_ignored() {
        let mut scene = OrganScene::new();
        let near = scene
            .add_organ(
                "near",
                Shape::sphere(Vec3::new(0.0, 0.0, 3.0), 1.0),
                TissueMaterial::LIVER,
            )
            .unwrap();
        let far = scene
            .add_organ(
                "far",
                Shape::sphere(Vec3::new(0.0, 0.0, 7.0), 1.0),
                TissueMaterial::KIDNEY,
            )
            .unwrap();
        scene
            .add_untagged(
                "table",
                Shape::sphere(Vec3::new(0.0, 0.0, 9.0), 0.5),
                TissueMaterial::BONE,
            )
            .unwrap();

        let frame = build_scanning_plane(&ProbeConfig::default());
        let mut culler = OrganCuller::new(&scene, every_line()).unwrap();
        let now = Duration::from_secs(10);
        let candidates = culler.hitable_organs(&scene, &frame, now);

        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains(&near) && candidates.contains(&far));
        assert_eq!(culler.by_time.len(), 2);
        assert!(culler.by_time.keys().all(|&t| t >= now.as_nanos() as u64));
    }

    #[test]
    fn test_retag_drops_untagged_organs() {
        let mut scene = OrganScene::new();
        let organ = scene
            .add_organ("target", in_front(), TissueMaterial::LIVER)
            .unwrap();
        let frame = build_scanning_plane(&ProbeConfig::default());
        let mut culler = OrganCuller::new(&scene, every_line()).unwrap();
        culler.hitable_organs(&scene, &frame, Duration::ZERO);
        assert!(culler.contains(organ));

        scene.set_tagged(organ, false).unwrap();
        culler.retag(&scene);
        assert!(culler.is_empty());
        assert!(
            culler
                .hitable_organs(&scene, &frame, Duration::from_millis(10))
                .is_empty()
        );
    }

    #[test]
    fn test_clear_empties_cache_and_rewinds_cursor() {
        let mut scene = OrganScene::new();
        let organ = scene
            .add_organ("target", in_front(), TissueMaterial::LIVER)
            .unwrap();
        let frame = build_scanning_plane(&ProbeConfig::default());
        let mut culler = OrganCuller::new(
            &scene,
            CullerDesc::default().with_scanlines_per_frame(8),
        )
        .unwrap();

        let first = culler.next_scanlines(40);
        assert_eq!(first[0], 0);
        assert_ne!(culler.next_scanlines(40)[0], 0);
        culler.hitable_organs(&scene, &frame, Duration::ZERO);

        culler.clear();
        assert!(culler.is_empty());
        assert!(!culler.contains(organ));
        assert!(culler.cached().is_empty());
        assert_eq!(culler.next_scanlines(40), first);
    }

    #[test]
    fn test_events_reported() {
        let mut scene = OrganScene::new();
        let organ = scene
            .add_organ("target", in_front(), TissueMaterial::LIVER)
            .unwrap();
        let frame = build_scanning_plane(&ProbeConfig::default());
        let (sender, receiver) = unbounded();
        let mut culler = OrganCuller::new(&scene, every_line())
            .unwrap()
            .with_event_sender(sender);

        culler.hitable_organs(&scene, &frame, Duration::ZERO);
        culler.hitable_organs(&scene, &frame, Duration::from_millis(100));
        scene.set_shape(organ, far_away()).unwrap();
        culler.hitable_organs(&scene, &frame, Duration::from_secs(5));

        let events: Vec<HorayEvent> = receiver.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], HorayEvent::OrganEntered { organ });
        assert!(matches!(events[1], HorayEvent::OrganExpired { organ: o, .. } if o == organ));
    }
}
