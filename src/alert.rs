use crate::config::{AwarenessConfig, LevelDurations};
use crate::types::{compose_alert_message, AlertLevel, Locale, ObjectCategory, Timestamp, TrackedObject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The single user-facing notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub level: AlertLevel,
    /// Bearing of the triggering object in degrees, clockwise from ahead.
    pub direction: f64,
    pub message: String,
    pub category: ObjectCategory,
    pub distance: f32,
    pub triggered_at: Timestamp,
    /// Auto-dismiss deadline
    pub dismiss_at: Timestamp,
    pub visible: bool,
}

/// What the audio/haptic layer is told when an alert fires.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackCue {
    pub level: AlertLevel,
    /// In [0, 1]
    pub intensity: f32,
    /// Sound asset to play, `None` when sound is muted.
    pub sound: Option<&'static str>,
    pub haptic: bool,
}

/// Receiver for alert cues. Called on the pipeline's tick, so implementations
/// should hand work off rather than block.
pub trait FeedbackSink: Send {
    fn on_alert(&mut self, cue: &FeedbackCue);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    /// Auto-dismiss deadline elapsed
    Expired,
    /// Scene level fell to none
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AlertEvent {
    Triggered { alert: ActiveAlert, cue: FeedbackCue },
    Dismissed { level: AlertLevel, reason: DismissReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebouncerState {
    Idle,
    Alerting,
}

/// Last trigger time per alert level. Entries are only ever overwritten;
/// they age out by comparison against the level's cooldown.
#[derive(Clone, Debug, Default)]
pub struct CooldownTable {
    last_triggered: HashMap<AlertLevel, Timestamp>,
}

impl CooldownTable {
    pub fn is_cooling_down(&self, level: AlertLevel, now: Timestamp, cooldown: f64) -> bool {
        self.last_triggered
            .get(&level)
            .is_some_and(|last| now - last < cooldown)
    }

    pub fn record(&mut self, level: AlertLevel, now: Timestamp) {
        self.last_triggered.insert(level, now);
    }

    pub fn last_triggered(&self, level: AlertLevel) -> Option<Timestamp> {
        self.last_triggered.get(&level).copied()
    }
}

/// Turns the scene level and nearest threat into a rate-limited alert stream.
///
/// Idle -> Alerting when the level is above none, a candidate exists and the
/// level's cooldown has elapsed. While alerting, any trigger that clears its
/// own cooldown replaces the active alert. Alerting -> Idle when the
/// auto-dismiss deadline passes or the level drops to none.
pub struct AlertDebouncer {
    cooldowns: LevelDurations,
    auto_dismiss: LevelDurations,
    locale: Locale,
    sound_enabled: bool,
    haptic_enabled: bool,
    table: CooldownTable,
    active: Option<ActiveAlert>,
}

impl AlertDebouncer {
    pub fn new(config: &AwarenessConfig) -> Self {
        Self {
            cooldowns: config.cooldowns,
            auto_dismiss: config.auto_dismiss,
            locale: config.locale,
            sound_enabled: config.sound_enabled,
            haptic_enabled: config.haptic_enabled,
            table: CooldownTable::default(),
            active: None,
        }
    }

    pub fn state(&self) -> DebouncerState {
        if self.active.is_some() {
            DebouncerState::Alerting
        } else {
            DebouncerState::Idle
        }
    }

    pub fn active_alert(&self) -> Option<&ActiveAlert> {
        self.active.as_ref()
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.table
    }

    /// Apply the auto-dismiss deadline only.
    pub fn tick(&mut self, now: Timestamp) -> Option<AlertEvent> {
        let expired = self.active.as_ref().is_some_and(|a| now >= a.dismiss_at);
        if !expired {
            return None;
        }
        self.active.take().map(|alert| {
            log::debug!("{:?} alert auto-dismissed", alert.level);
            AlertEvent::Dismissed {
                level: alert.level,
                reason: DismissReason::Expired,
            }
        })
    }

    /// Feed one scene evaluation. Returns the transitions it caused in order:
    /// an expiry of the previous alert can precede a new trigger in the same
    /// call.
    pub fn evaluate(
        &mut self,
        level: AlertLevel,
        candidate: Option<&TrackedObject>,
        now: Timestamp,
    ) -> Vec<AlertEvent> {
        let mut events: Vec<AlertEvent> = self.tick(now).into_iter().collect();

        if level == AlertLevel::None {
            events.extend(self.dismiss(DismissReason::Cleared));
            return events;
        }

        let Some(object) = candidate else {
            log::debug!("scene at {:?} but no object qualifies for an alert", level);
            return events;
        };

        let cooldown = self.cooldowns.get(level);
        if self.table.is_cooling_down(level, now, cooldown) {
            return events;
        }

        events.push(self.trigger(level, object, now));
        events
    }

    /// Force idle without touching the cooldown table.
    pub fn reset(&mut self) {
        self.active = None;
    }

    fn dismiss(&mut self, reason: DismissReason) -> Option<AlertEvent> {
        self.active.take().map(|alert| AlertEvent::Dismissed {
            level: alert.level,
            reason,
        })
    }

    fn trigger(&mut self, level: AlertLevel, object: &TrackedObject, now: Timestamp) -> AlertEvent {
        let direction = object.bearing_degrees();
        let alert = ActiveAlert {
            level,
            direction,
            message: compose_alert_message(self.locale, direction, object.distance, object.category),
            category: object.category,
            distance: object.distance,
            triggered_at: now,
            dismiss_at: now + self.auto_dismiss.get(level),
            visible: true,
        };

        if let Some(previous) = &self.active {
            log::debug!("{:?} alert replaced by {:?}", previous.level, level);
        }
        log::info!("{:?} alert: {}", level, alert.message);

        self.table.record(level, now);
        self.active = Some(alert.clone());

        let cue = FeedbackCue {
            level,
            intensity: level.haptic_intensity(),
            sound: if self.sound_enabled { level.sound_name() } else { None },
            haptic: self.haptic_enabled,
        };
        AlertEvent::Triggered { alert, cue }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ThreatLevel, TrackCandidate};
    use glam::Vec3;

    fn object(category: ObjectCategory, position: Vec3, threat: ThreatLevel) -> TrackedObject {
        TrackedObject::new(
            1,
            &TrackCandidate {
                anchor_id: 1,
                category,
                position,
                closing_speed: 0.0,
                threat,
            },
            0.0,
        )
    }

    fn obstacle_ahead() -> TrackedObject {
        object(ObjectCategory::Obstacle, Vec3::new(0.0, 0.0, 2.0), ThreatLevel::Medium)
    }

    fn debouncer() -> AlertDebouncer {
        AlertDebouncer::new(&AwarenessConfig::default())
    }

    #[test]
    fn test_trigger_composes_alert() {
        let mut debouncer = debouncer();
        let target = object(ObjectCategory::Vehicle, Vec3::new(6.0, 0.0, 6.0), ThreatLevel::High);

        let events = debouncer.evaluate(AlertLevel::Warning, Some(&target), 1.0);
        let [AlertEvent::Triggered { alert, cue }] = events.as_slice() else {
            panic!("expected a trigger, got {events:?}");
        };
        assert_eq!(alert.message, "front-right 8m - vehicle");
        assert!(alert.visible);
        assert_eq!(alert.dismiss_at, 6.0);
        assert_eq!(cue.intensity, 0.8);
        assert_eq!(cue.sound, Some("alert_warning"));
        assert!(cue.haptic);
        assert_eq!(debouncer.state(), DebouncerState::Alerting);
        assert_eq!(debouncer.cooldowns().last_triggered(AlertLevel::Warning), Some(1.0));
    }

    #[test]
    fn test_caution_retrigger_suppressed_within_cooldown() {
        let mut debouncer = debouncer();
        let target = obstacle_ahead();

        assert_eq!(debouncer.evaluate(AlertLevel::Caution, Some(&target), 0.0).len(), 1);
        assert!(debouncer.evaluate(AlertLevel::Caution, Some(&target), 3.0).is_empty());
        assert_eq!(debouncer.active_alert().map(|a| a.triggered_at), Some(0.0));

        // first alert's 4s auto-dismiss
        assert!(debouncer.evaluate(AlertLevel::Caution, Some(&target), 3.9).is_empty());
        assert_eq!(
            debouncer.evaluate(AlertLevel::Caution, Some(&target), 4.0),
            vec![AlertEvent::Dismissed {
                level: AlertLevel::Caution,
                reason: DismissReason::Expired
            }]
        );
        assert_eq!(debouncer.state(), DebouncerState::Idle);

        // cooldown over at 5s
        assert!(matches!(
            debouncer.evaluate(AlertLevel::Caution, Some(&target), 5.0).as_slice(),
            [AlertEvent::Triggered { .. }]
        ));
    }

    #[test]
    fn test_level_none_dismisses_immediately() {
        let mut debouncer = debouncer();
        let target = obstacle_ahead();
        debouncer.evaluate(AlertLevel::Critical, Some(&target), 0.0);

        let events = debouncer.evaluate(AlertLevel::None, None, 0.2);
        assert_eq!(
            events,
            vec![AlertEvent::Dismissed {
                level: AlertLevel::Critical,
                reason: DismissReason::Cleared
            }]
        );
        assert!(debouncer.active_alert().is_none());
        assert!(debouncer.evaluate(AlertLevel::None, None, 0.3).is_empty());
    }

    #[test]
    fn test_different_level_replaces_active_alert() {
        let mut debouncer = debouncer();
        let target = obstacle_ahead();
        debouncer.evaluate(AlertLevel::Caution, Some(&target), 0.0);

        let events = debouncer.evaluate(AlertLevel::Critical, Some(&target), 1.0);
        assert!(matches!(events.as_slice(), [AlertEvent::Triggered { .. }]));
        let active = debouncer.active_alert().unwrap();
        assert_eq!(active.level, AlertLevel::Critical);
        assert_eq!(active.dismiss_at, 9.0);

        // caution's own cooldown still applies when the scene calms down
        assert!(debouncer.evaluate(AlertLevel::Caution, Some(&target), 2.0).is_empty());
        assert_eq!(debouncer.active_alert().unwrap().level, AlertLevel::Critical);
    }

    #[test]
    fn test_missing_candidate_is_silent() {
        let mut debouncer = debouncer();
        assert!(debouncer.evaluate(AlertLevel::Info, None, 0.0).is_empty());
        assert_eq!(debouncer.state(), DebouncerState::Idle);
        assert_eq!(debouncer.cooldowns().last_triggered(AlertLevel::Info), None);
    }

    #[test]
    fn test_muted_sound_still_reports_intensity() {
        let config = AwarenessConfig {
            sound_enabled: false,
            haptic_enabled: false,
            locale: Locale::Ja,
            ..Default::default()
        };
        let mut debouncer = AlertDebouncer::new(&config);
        let events = debouncer.evaluate(AlertLevel::Critical, Some(&obstacle_ahead()), 0.0);
        let [AlertEvent::Triggered { alert, cue }] = events.as_slice() else {
            panic!("expected a trigger");
        };
        assert_eq!(cue.sound, None);
        assert!(!cue.haptic);
        assert_eq!(cue.intensity, 1.0);
        assert_eq!(alert.message, "前方 2m - 障害物");
    }

    #[test]
    fn test_reset_keeps_cooldowns() {
        let mut debouncer = debouncer();
        let target = obstacle_ahead();
        debouncer.evaluate(AlertLevel::Warning, Some(&target), 0.0);
        debouncer.reset();
        assert_eq!(debouncer.state(), DebouncerState::Idle);
        assert!(debouncer.evaluate(AlertLevel::Warning, Some(&target), 1.0).is_empty());
        assert_eq!(debouncer.evaluate(AlertLevel::Warning, Some(&target), 2.0).len(), 1);
    }

    #[test]
    fn test_expiry_and_new_trigger_in_same_evaluation() {
        let mut debouncer = debouncer();
        debouncer.evaluate(AlertLevel::Caution, Some(&obstacle_ahead()), 0.0);

        let vehicle = object(ObjectCategory::Vehicle, Vec3::new(0.0, 0.0, 8.0), ThreatLevel::High);
        let events = debouncer.evaluate(AlertLevel::Warning, Some(&vehicle), 4.0);

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            AlertEvent::Dismissed {
                level: AlertLevel::Caution,
                reason: DismissReason::Expired
            }
        );
        assert!(matches!(&events[1], AlertEvent::Triggered { alert, .. } if alert.level == AlertLevel::Warning));
        assert_eq!(debouncer.active_alert().unwrap().level, AlertLevel::Warning);
    }

    #[test]
    fn test_expiry_then_clear_reports_expiry_once() {
        let mut debouncer = debouncer();
        debouncer.evaluate(AlertLevel::Caution, Some(&obstacle_ahead()), 0.0);
        let events = debouncer.evaluate(AlertLevel::None, None, 4.0);
        assert_eq!(
            events,
            vec![AlertEvent::Dismissed {
                level: AlertLevel::Caution,
                reason: DismissReason::Expired
            }]
        );
    }
}
