use crate::types::{ObjectCategory, ThreatLevel};

/// Closing speeds at or below this (m/s) are treated as no approach.
pub const CLOSING_SPEED_EPSILON: f32 = 0.1;

/// Seconds until contact at the current closing speed, infinite when the
/// object is not approaching.
pub fn time_to_contact(distance: f32, closing_speed: f32, epsilon: f32) -> f32 {
    if closing_speed > epsilon {
        distance / closing_speed
    } else {
        f32::INFINITY
    }
}

/// Rate one object. Total over all inputs: NaN compares false everywhere and
/// falls through to the most lenient branch of its category.
pub fn assess_threat(category: ObjectCategory, distance: f32, closing_speed: f32) -> ThreatLevel {
    assess_threat_with(category, distance, closing_speed, CLOSING_SPEED_EPSILON)
}

/// [`assess_threat`] with a configurable approach epsilon.
pub fn assess_threat_with(
    category: ObjectCategory,
    distance: f32,
    closing_speed: f32,
    epsilon: f32,
) -> ThreatLevel {
    let ttc = time_to_contact(distance, closing_speed, epsilon);

    match category {
        ObjectCategory::Vehicle => {
            if ttc < 3.0 {
                ThreatLevel::High
            } else if distance < 10.0 {
                ThreatLevel::Medium
            } else {
                ThreatLevel::Low
            }
        }
        ObjectCategory::Bicycle => {
            if ttc < 2.0 {
                ThreatLevel::High
            } else if distance < 5.0 {
                ThreatLevel::Medium
            } else {
                ThreatLevel::Low
            }
        }
        ObjectCategory::Pedestrian => {
            if distance < 2.0 {
                ThreatLevel::Low
            } else {
                ThreatLevel::None
            }
        }
        ObjectCategory::Obstacle => {
            if distance < 3.0 {
                ThreatLevel::Medium
            } else if distance < 5.0 {
                ThreatLevel::Low
            } else {
                ThreatLevel::None
            }
        }
        ObjectCategory::Unknown => ThreatLevel::None,
    }
}
