use crate::config::AwarenessConfig;
use crate::types::{AlertLevel, ThreatLevel, TrackCandidate, TrackedObject, Timestamp};
use std::f32::consts::PI;

/// Tolerances that decide when an update belongs to an existing track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    /// Radians
    pub merge_bearing_tolerance: f32,
    /// Meters
    pub merge_distance_tolerance: f32,
    pub stale_after_secs: f64,
    pub critical_distance: f32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&AwarenessConfig::default())
    }
}

impl From<&AwarenessConfig> for TrackerSettings {
    fn from(config: &AwarenessConfig) -> Self {
        Self {
            merge_bearing_tolerance: config.merge_bearing_tolerance,
            merge_distance_tolerance: config.merge_distance_tolerance,
            stale_after_secs: config.stale_after_secs,
            critical_distance: config.critical_distance,
        }
    }
}

/// Live set of objects around the user.
///
/// Updates are associated to tracks by proximity in polar coordinates: an
/// update merges into the first track (in creation order) whose bearing and
/// distance are both within tolerance, so replaying the same sequence always
/// produces the same tracks and ids.
pub struct ObjectTracker {
    settings: TrackerSettings,
    tracks: Vec<TrackedObject>,
    next_id: u64,
}

impl ObjectTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    /// Merge a candidate into the live set. Returns the id of the track it
    /// landed in.
    pub fn ingest(&mut self, candidate: &TrackCandidate, now: Timestamp) -> u64 {
        let distance = candidate.distance();
        let bearing = candidate.bearing();

        if let Some(track) = self.tracks.iter_mut().find(|t| {
            bearing_difference(t.bearing, bearing) < self.settings.merge_bearing_tolerance
                && (t.distance - distance).abs() < self.settings.merge_distance_tolerance
        }) {
            *track = TrackedObject::new(track.id, candidate, now);
            return track.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tracks.push(TrackedObject::new(id, candidate, now));
        log::debug!(
            "new track {} ({:?}) at {:.1}m, threat {:?}",
            id,
            candidate.category,
            distance,
            candidate.threat
        );
        id
    }

    /// Drop every track not refreshed within the staleness window.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        let stale_after = self.settings.stale_after_secs;
        let before = self.tracks.len();
        self.tracks.retain(|t| now - t.last_seen <= stale_after);
        before - self.tracks.len()
    }

    /// Drop tracks last refreshed by a surface the provider no longer reports.
    pub fn remove_anchor(&mut self, anchor_id: u64) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.source_anchor != anchor_id);
        before - self.tracks.len()
    }

    /// Worst-case hazard over the current tracks.
    pub fn aggregate_level(&self) -> AlertLevel {
        let max_threat = self
            .tracks
            .iter()
            .map(|t| t.threat)
            .max()
            .unwrap_or(ThreatLevel::None);

        match max_threat {
            ThreatLevel::None => AlertLevel::None,
            ThreatLevel::Low => AlertLevel::Info,
            ThreatLevel::Medium => AlertLevel::Caution,
            ThreatLevel::High => {
                let close_high = self.tracks.iter().any(|t| {
                    t.threat == ThreatLevel::High && t.distance < self.settings.critical_distance
                });
                if close_high {
                    AlertLevel::Critical
                } else {
                    AlertLevel::Warning
                }
            }
        }
    }

    /// Closest track rated at least `min_threat`; equal distances go to the
    /// older track.
    pub fn nearest_qualifying(&self, min_threat: ThreatLevel) -> Option<&TrackedObject> {
        self.tracks
            .iter()
            .filter(|t| t.threat >= min_threat)
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)))
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

/// Absolute angular difference in radians, wrapped into [0, PI].
fn bearing_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(2.0 * PI);
    diff.min(2.0 * PI - diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectCategory;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn tracker() -> ObjectTracker {
        ObjectTracker::new(TrackerSettings::default())
    }

    fn candidate(
        anchor_id: u64,
        category: ObjectCategory,
        position: Vec3,
        threat: ThreatLevel,
    ) -> TrackCandidate {
        TrackCandidate {
            anchor_id,
            category,
            position,
            closing_speed: 0.0,
            threat,
        }
    }

    fn ahead(distance: f32) -> Vec3 {
        Vec3::new(0.0, 0.0, distance)
    }

    #[test]
    fn test_same_update_twice_is_one_track() {
        let mut tracker = tracker();
        let update = candidate(1, ObjectCategory::Obstacle, ahead(4.0), ThreatLevel::Low);
        let first = tracker.ingest(&update, 0.0);
        let second = tracker.ingest(&update, 0.1);
        assert_eq!(first, second);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.objects()[0].last_seen, 0.1);
    }

    #[test]
    fn test_merge_overwrites_fields_keeps_id() {
        let mut tracker = tracker();
        let id = tracker.ingest(
            &candidate(1, ObjectCategory::Unknown, ahead(6.0), ThreatLevel::None),
            0.0,
        );
        tracker.ingest(
            &candidate(2, ObjectCategory::Vehicle, Vec3::new(0.5, 0.0, 5.0), ThreatLevel::Medium),
            0.2,
        );

        let track = &tracker.objects()[0];
        assert_eq!(tracker.len(), 1);
        assert_eq!(track.id, id);
        assert_eq!(track.category, ObjectCategory::Vehicle);
        assert_eq!(track.source_anchor, 2);
        assert_relative_eq!(track.distance, Vec3::new(0.5, 0.0, 5.0).length());
    }

    #[test]
    fn test_outside_window_creates_new_track() {
        let mut tracker = tracker();
        tracker.ingest(&candidate(1, ObjectCategory::Obstacle, ahead(4.0), ThreatLevel::Low), 0.0);
        // same bearing, 2m further: outside the linear tolerance
        tracker.ingest(&candidate(2, ObjectCategory::Obstacle, ahead(6.0), ThreatLevel::None), 0.0);
        // same distance, off to the right
        tracker.ingest(
            &candidate(3, ObjectCategory::Obstacle, Vec3::new(4.0, 0.0, 0.0), ThreatLevel::Low),
            0.0,
        );
        assert_eq!(tracker.len(), 3);
        let ids: Vec<u64> = tracker.objects().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_across_bearing_wrap() {
        let mut tracker = tracker();
        // directly behind, slightly left and slightly right
        tracker.ingest(
            &candidate(1, ObjectCategory::Obstacle, Vec3::new(0.05, 0.0, -4.0), ThreatLevel::Low),
            0.0,
        );
        tracker.ingest(
            &candidate(1, ObjectCategory::Obstacle, Vec3::new(-0.05, 0.0, -4.0), ThreatLevel::Low),
            0.1,
        );
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_expire_drops_stale_tracks_idempotently() {
        let mut tracker = tracker();
        tracker.ingest(&candidate(1, ObjectCategory::Obstacle, ahead(4.0), ThreatLevel::Low), 0.0);
        tracker.ingest(
            &candidate(2, ObjectCategory::Obstacle, Vec3::new(-4.0, 0.0, 0.0), ThreatLevel::Low),
            1.5,
        );

        assert_eq!(tracker.expire(2.0), 0);
        assert_eq!(tracker.expire(2.5), 1);
        assert_eq!(tracker.expire(2.5), 0);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.expire(10.0), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_remove_anchor() {
        let mut tracker = tracker();
        tracker.ingest(&candidate(7, ObjectCategory::Obstacle, ahead(4.0), ThreatLevel::Low), 0.0);
        assert_eq!(tracker.remove_anchor(8), 0);
        assert_eq!(tracker.remove_anchor(7), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_aggregate_level_mapping() {
        let mut tracker = tracker();
        assert_eq!(tracker.aggregate_level(), AlertLevel::None);

        tracker.ingest(&candidate(1, ObjectCategory::Pedestrian, ahead(1.5), ThreatLevel::Low), 0.0);
        assert_eq!(tracker.aggregate_level(), AlertLevel::Info);

        tracker.ingest(
            &candidate(2, ObjectCategory::Obstacle, Vec3::new(2.5, 0.0, 0.0), ThreatLevel::Medium),
            0.0,
        );
        assert_eq!(tracker.aggregate_level(), AlertLevel::Caution);

        tracker.ingest(
            &candidate(3, ObjectCategory::Vehicle, Vec3::new(-8.0, 0.0, 0.0), ThreatLevel::High),
            0.0,
        );
        assert_eq!(tracker.aggregate_level(), AlertLevel::Warning);
    }

    #[test]
    fn test_critical_needs_close_high_threat() {
        let mut tracker = tracker();
        tracker.ingest(
            &candidate(1, ObjectCategory::Vehicle, ahead(8.0), ThreatLevel::High),
            0.0,
        );
        // a close object that is not itself high does not escalate
        tracker.ingest(
            &candidate(2, ObjectCategory::Pedestrian, Vec3::new(-1.0, 0.0, 0.0), ThreatLevel::Low),
            0.0,
        );
        assert_eq!(tracker.aggregate_level(), AlertLevel::Warning);

        tracker.ingest(
            &candidate(3, ObjectCategory::Bicycle, Vec3::new(2.5, 0.0, 0.0), ThreatLevel::High),
            0.0,
        );
        assert_eq!(tracker.aggregate_level(), AlertLevel::Critical);
    }

    #[test]
    fn test_nearest_qualifying() {
        let mut tracker = tracker();
        tracker.ingest(&candidate(1, ObjectCategory::Pedestrian, ahead(1.5), ThreatLevel::Low), 0.0);
        tracker.ingest(
            &candidate(2, ObjectCategory::Vehicle, Vec3::new(9.0, 0.0, 0.0), ThreatLevel::Medium),
            0.0,
        );
        tracker.ingest(
            &candidate(3, ObjectCategory::Obstacle, Vec3::new(-2.0, 0.0, 0.0), ThreatLevel::Medium),
            0.0,
        );

        let nearest = tracker.nearest_qualifying(ThreatLevel::Medium).unwrap();
        assert_eq!(nearest.source_anchor, 3);
        assert_eq!(
            tracker.nearest_qualifying(ThreatLevel::Low).map(|t| t.source_anchor),
            Some(1)
        );
        assert!(tracker.nearest_qualifying(ThreatLevel::High).is_none());
    }

    #[test]
    fn test_nearest_tie_goes_to_lower_id() {
        let mut tracker = tracker();
        tracker.ingest(
            &candidate(1, ObjectCategory::Obstacle, Vec3::new(2.0, 0.0, 0.0), ThreatLevel::Medium),
            0.0,
        );
        tracker.ingest(
            &candidate(2, ObjectCategory::Obstacle, Vec3::new(-2.0, 0.0, 0.0), ThreatLevel::Medium),
            0.0,
        );
        assert_eq!(tracker.nearest_qualifying(ThreatLevel::Medium).map(|t| t.id), Some(1));
    }
}
