pub mod phrases;

pub use phrases::*;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Seconds on the pipeline clock.
pub type Timestamp = f64;

/// Object categories the classifier can assign to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectCategory {
    Pedestrian,
    Bicycle,
    Vehicle,
    Obstacle,
    Unknown,
}

/// Threat rating of a single tracked object, ordered none < low < medium < high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    None,
    Low,
    Medium,
    High,
}

/// Scene-wide hazard rating, ordered none < info < caution < warning < critical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Info,
    Caution,
    Warning,
    Critical,
}

impl AlertLevel {
    /// Feedback strength handed to the audio/haptic layer, in [0, 1].
    pub fn haptic_intensity(self) -> f32 {
        match self {
            AlertLevel::None => 0.0,
            AlertLevel::Info => 0.2,
            AlertLevel::Caution => 0.5,
            AlertLevel::Warning => 0.8,
            AlertLevel::Critical => 1.0,
        }
    }

    /// Name of the sound asset for this level.
    pub fn sound_name(self) -> Option<&'static str> {
        match self {
            AlertLevel::None => None,
            AlertLevel::Info => Some("alert_info"),
            AlertLevel::Caution => Some("alert_caution"),
            AlertLevel::Warning => Some("alert_warning"),
            AlertLevel::Critical => Some("alert_critical"),
        }
    }
}

/// A detected physical entity near the user.
///
/// Position is user-relative: +x right, +y up, +z straight ahead.
/// `distance` and `bearing` are derived from `position` in [`TrackedObject::new`]
/// and are never written on their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: u64,
    pub category: ObjectCategory,
    pub position: Vec3,
    pub distance: f32,
    /// Radians, 0 straight ahead, increasing clockwise.
    pub bearing: f32,
    /// Meters per second towards the user, 0 when unknown.
    pub closing_speed: f32,
    pub threat: ThreatLevel,
    pub last_seen: Timestamp,
    /// Surface anchor that last refreshed this track.
    pub source_anchor: u64,
}

impl TrackedObject {
    pub fn new(
        id: u64,
        candidate: &TrackCandidate,
        last_seen: Timestamp,
    ) -> Self {
        Self {
            id,
            category: candidate.category,
            position: candidate.position,
            distance: candidate.distance(),
            bearing: candidate.bearing(),
            closing_speed: candidate.closing_speed.max(0.0),
            threat: candidate.threat,
            last_seen,
            source_anchor: candidate.anchor_id,
        }
    }

    pub fn bearing_degrees(&self) -> f64 {
        (self.bearing as f64).to_degrees()
    }

    /// Polar coordinates for a radar display: angle as a fraction of a full
    /// turn and distance as a fraction of the scan radius (capped at 1).
    pub fn radar_coordinates(&self, scan_radius: f32) -> (f32, f32) {
        let angle = self.bearing / (2.0 * PI);
        let range = if scan_radius > 0.0 {
            (self.distance / scan_radius).min(1.0)
        } else {
            1.0
        };
        (angle, range)
    }
}

/// Classified and assessed fields of a single surface update, before it is
/// merged into the tracked set.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackCandidate {
    pub anchor_id: u64,
    pub category: ObjectCategory,
    pub position: Vec3,
    pub closing_speed: f32,
    pub threat: ThreatLevel,
}

impl TrackCandidate {
    pub fn distance(&self) -> f32 {
        self.position.length()
    }

    pub fn bearing(&self) -> f32 {
        bearing_of(self.position)
    }
}

/// Clockwise angle from straight ahead, in radians.
pub fn bearing_of(position: Vec3) -> f32 {
    position.x.atan2(position.z)
}

/// Compass-relative octant around the user, each spanning 45 degrees
/// centered on its cardinal bearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Front,
    FrontRight,
    Right,
    BackRight,
    Back,
    BackLeft,
    Left,
    FrontLeft,
}

impl Direction {
    const OCTANTS: [Direction; 8] = [
        Direction::Front,
        Direction::FrontRight,
        Direction::Right,
        Direction::BackRight,
        Direction::Back,
        Direction::BackLeft,
        Direction::Left,
        Direction::FrontLeft,
    ];

    /// Octant for a bearing in degrees; any real angle is accepted.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Direction::Front;
        }
        let normalized = degrees.rem_euclid(360.0);
        let index = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::OCTANTS[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn candidate_at(position: Vec3) -> TrackCandidate {
        TrackCandidate {
            anchor_id: 7,
            category: ObjectCategory::Obstacle,
            position,
            closing_speed: -1.0,
            threat: ThreatLevel::Low,
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(ThreatLevel::None < ThreatLevel::Low);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(AlertLevel::Info < AlertLevel::Caution);
        assert!(AlertLevel::Warning < AlertLevel::Critical);
        assert_eq!(
            [ThreatLevel::Medium, ThreatLevel::High, ThreatLevel::None]
                .iter()
                .max(),
            Some(&ThreatLevel::High)
        );
    }

    #[test]
    fn test_haptic_intensity_table() {
        assert_eq!(AlertLevel::Info.haptic_intensity(), 0.2);
        assert_eq!(AlertLevel::Caution.haptic_intensity(), 0.5);
        assert_eq!(AlertLevel::Warning.haptic_intensity(), 0.8);
        assert_eq!(AlertLevel::Critical.haptic_intensity(), 1.0);
        assert_eq!(AlertLevel::None.sound_name(), None);
    }

    #[test]
    fn test_tracked_object_derives_distance_and_bearing() {
        let object = TrackedObject::new(1, &candidate_at(Vec3::new(3.0, 0.0, 4.0)), 10.0);
        assert_relative_eq!(object.distance, 5.0);
        assert_relative_eq!(object.bearing, 3.0f32.atan2(4.0));
        assert_eq!(object.closing_speed, 0.0);
        assert_eq!(object.source_anchor, 7);
    }

    #[test]
    fn test_bearing_is_clockwise_from_ahead() {
        assert_relative_eq!(bearing_of(Vec3::new(0.0, 0.0, 5.0)), 0.0);
        assert_relative_eq!(bearing_of(Vec3::new(5.0, 0.0, 0.0)), PI / 2.0);
        assert_relative_eq!(bearing_of(Vec3::new(-5.0, 0.0, 0.0)), -PI / 2.0);
    }

    #[test]
    fn test_radar_coordinates_clamp_range() {
        let near = TrackedObject::new(1, &candidate_at(Vec3::new(0.0, 0.0, 15.0)), 0.0);
        let far = TrackedObject::new(2, &candidate_at(Vec3::new(0.0, 0.0, 45.0)), 0.0);
        assert_relative_eq!(near.radar_coordinates(30.0).1, 0.5);
        assert_relative_eq!(far.radar_coordinates(30.0).1, 1.0);
    }

    #[test]
    fn test_direction_octants() {
        assert_eq!(Direction::from_degrees(0.0), Direction::Front);
        assert_eq!(Direction::from_degrees(22.4), Direction::Front);
        assert_eq!(Direction::from_degrees(22.5), Direction::FrontRight);
        assert_eq!(Direction::from_degrees(90.0), Direction::Right);
        assert_eq!(Direction::from_degrees(135.0), Direction::BackRight);
        assert_eq!(Direction::from_degrees(180.0), Direction::Back);
        assert_eq!(Direction::from_degrees(-180.0), Direction::Back);
        assert_eq!(Direction::from_degrees(225.0), Direction::BackLeft);
        assert_eq!(Direction::from_degrees(-90.0), Direction::Left);
        assert_eq!(Direction::from_degrees(-30.0), Direction::FrontLeft);
        assert_eq!(Direction::from_degrees(337.5), Direction::Front);
        assert_eq!(Direction::from_degrees(720.0 + 45.0), Direction::FrontRight);
    }
}
