use crate::alert::ActiveAlert;
use crate::types::{AlertLevel, TrackedObject};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read-only view of the pipeline for the presentation layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HudState {
    pub running: bool,
    pub objects: Vec<TrackedObject>,
    pub level: AlertLevel,
    pub alert: Option<ActiveAlert>,
}

impl HudState {
    pub fn idle() -> Self {
        Self {
            running: false,
            objects: Vec::new(),
            level: AlertLevel::None,
            alert: None,
        }
    }

    pub fn alert_visible(&self) -> bool {
        self.alert.as_ref().is_some_and(|a| a.visible)
    }
}

impl Default for HudState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Running counters for one pipeline instance.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: f64,
    pub ticks: u64,
    pub updates_ingested: u64,
    pub updates_malformed: u64,
    pub updates_out_of_range: u64,
    pub anchors_removed: u64,
    pub tracks_expired: u64,
    pub active_tracks: usize,
    pub level: Option<AlertLevel>,
    pub alerts_triggered: u64,
    pub alerts_dismissed: u64,
    pub sensor_healthy: bool,
    pub sensor_gaps: u32,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            sensor_healthy: true,
            ..Default::default()
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
