use crate::error::{AwarenessError, AwarenessResult};
use crate::types::{AlertLevel, Locale, ThreatLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SCAN_RADIUS: f32 = 30.0;
pub const MAX_SCAN_RADIUS: f32 = 50.0;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_STALE_AFTER_SECS: f64 = 2.0;
pub const DEFAULT_CRITICAL_DISTANCE: f32 = 3.0;

/// How closing speed is obtained for each surface update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityMode {
    /// Always zero; threat comes from distance alone.
    #[default]
    Disabled,
    /// Range rate from the recent distance history of each anchor.
    MultiFrame,
}

/// One duration (seconds) per alert level above `none`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelDurations {
    pub info: f64,
    pub caution: f64,
    pub warning: f64,
    pub critical: f64,
}

impl LevelDurations {
    pub fn get(&self, level: AlertLevel) -> f64 {
        match level {
            AlertLevel::None => 0.0,
            AlertLevel::Info => self.info,
            AlertLevel::Caution => self.caution,
            AlertLevel::Warning => self.warning,
            AlertLevel::Critical => self.critical,
        }
    }

    fn all(&self) -> [f64; 4] {
        [self.info, self.caution, self.warning, self.critical]
    }

    pub fn default_cooldowns() -> Self {
        Self {
            info: 10.0,
            caution: 5.0,
            warning: 2.0,
            critical: 0.5,
        }
    }

    pub fn default_auto_dismiss() -> Self {
        Self {
            info: 3.0,
            caution: 4.0,
            warning: 5.0,
            critical: 8.0,
        }
    }
}

/// Tunables for the whole pipeline. Every field has a default, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwarenessConfig {
    /// Updates farther than this (meters) are ignored.
    pub scan_radius: f32,
    pub tick_interval_ms: u64,
    /// Tracks not refreshed for this long are dropped.
    pub stale_after_secs: f64,
    /// Radians
    pub merge_bearing_tolerance: f32,
    /// Meters
    pub merge_distance_tolerance: f32,
    /// High threats closer than this escalate the scene to critical.
    pub critical_distance: f32,
    pub closing_speed_epsilon: f32,
    /// Weakest threat that can be named in an alert.
    pub min_alert_threat: ThreatLevel,
    pub cooldowns: LevelDurations,
    pub auto_dismiss: LevelDurations,
    pub locale: Locale,
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
    pub velocity_mode: VelocityMode,
    /// Silence longer than this is reported as a sensor gap.
    pub sensor_gap_secs: f64,
    pub feed_capacity: usize,
}

impl Default for AwarenessConfig {
    fn default() -> Self {
        Self {
            scan_radius: DEFAULT_SCAN_RADIUS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            merge_bearing_tolerance: 0.2,
            merge_distance_tolerance: 2.0,
            critical_distance: DEFAULT_CRITICAL_DISTANCE,
            closing_speed_epsilon: 0.1,
            min_alert_threat: ThreatLevel::Medium,
            cooldowns: LevelDurations::default_cooldowns(),
            auto_dismiss: LevelDurations::default_auto_dismiss(),
            locale: Locale::En,
            sound_enabled: true,
            haptic_enabled: true,
            velocity_mode: VelocityMode::Disabled,
            sensor_gap_secs: 2.0,
            feed_capacity: 1024,
        }
    }
}

impl AwarenessConfig {
    /// Load overrides from a JSON file and validate the result.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AwarenessResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> AwarenessResult<Self> {
        let config: AwarenessConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> AwarenessResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Scan radius actually applied, capped at the hardware range.
    pub fn effective_scan_radius(&self) -> f32 {
        self.scan_radius.min(MAX_SCAN_RADIUS)
    }

    pub fn validate(&self) -> AwarenessResult<()> {
        if !(self.scan_radius.is_finite() && self.scan_radius > 0.0) {
            return Err(AwarenessError::InvalidConfig(format!(
                "scan_radius must be positive, got {}",
                self.scan_radius
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(AwarenessError::InvalidConfig(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if !(self.stale_after_secs.is_finite() && self.stale_after_secs > 0.0) {
            return Err(AwarenessError::InvalidConfig(format!(
                "stale_after_secs must be positive, got {}",
                self.stale_after_secs
            )));
        }
        let tolerances = [
            self.merge_bearing_tolerance,
            self.merge_distance_tolerance,
            self.critical_distance,
            self.closing_speed_epsilon,
        ];
        if tolerances.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(AwarenessError::InvalidConfig(
                "merge tolerances, critical_distance and closing_speed_epsilon must be non-negative"
                    .to_string(),
            ));
        }
        for (name, table) in [("cooldowns", &self.cooldowns), ("auto_dismiss", &self.auto_dismiss)] {
            if table.all().iter().any(|d| !d.is_finite() || *d < 0.0) {
                return Err(AwarenessError::InvalidConfig(format!(
                    "{name} durations must be non-negative"
                )));
            }
        }
        if self.feed_capacity == 0 {
            return Err(AwarenessError::InvalidConfig(
                "feed_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AwarenessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cooldowns.get(AlertLevel::Caution), 5.0);
        assert_eq!(config.auto_dismiss.get(AlertLevel::Critical), 8.0);
        assert_eq!(config.min_alert_threat, ThreatLevel::Medium);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = AwarenessConfig::from_json(
            r#"{"scan_radius": 20.0, "locale": "ko", "velocity_mode": "multi_frame"}"#,
        )
        .unwrap();
        assert_eq!(config.scan_radius, 20.0);
        assert_eq!(config.locale, Locale::Ko);
        assert_eq!(config.velocity_mode, VelocityMode::MultiFrame);
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_scan_radius_capped() {
        let config = AwarenessConfig {
            scan_radius: 80.0,
            ..Default::default()
        };
        assert_eq!(config.effective_scan_radius(), MAX_SCAN_RADIUS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AwarenessConfig::from_json(r#"{"tick_interval_ms": 0}"#).unwrap_err();
        assert!(matches!(err, AwarenessError::InvalidConfig(_)));

        let negative = AwarenessConfig {
            cooldowns: LevelDurations {
                warning: -1.0,
                ..LevelDurations::default_cooldowns()
            },
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "awarewalk_config_{}.json",
            std::process::id()
        ));
        let config = AwarenessConfig {
            locale: Locale::Ja,
            sound_enabled: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = AwarenessConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
