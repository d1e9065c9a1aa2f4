use crate::types::Timestamp;

/// Watches the sensor feed for silence.
///
/// A gap is not an error: tracks simply age out through the tracker. The
/// monitor only makes the gap visible in the logs and the live status, once
/// when it starts and once when updates resume.
#[derive(Clone, Debug)]
pub struct SensorHealth {
    pub name: String,
    pub silence_threshold: f64,
    last_update: Option<Timestamp>,
    started_at: Option<Timestamp>,
    in_gap: bool,
    gap_count: u32,
}

impl SensorHealth {
    pub fn new(name: &str, silence_threshold_secs: f64) -> Self {
        SensorHealth {
            name: name.to_string(),
            silence_threshold: silence_threshold_secs,
            last_update: None,
            started_at: None,
            in_gap: false,
            gap_count: 0,
        }
    }

    /// Begin watching; silence is measured from here until the first update.
    pub fn arm(&mut self, now: Timestamp) {
        self.started_at = Some(now);
        self.last_update = None;
        self.in_gap = false;
    }

    pub fn disarm(&mut self) {
        self.started_at = None;
        self.last_update = None;
        self.in_gap = false;
    }

    pub fn update(&mut self, now: Timestamp) {
        self.last_update = Some(now);
    }

    pub fn time_since_last_update(&self, now: Timestamp) -> Option<f64> {
        self.last_update.or(self.started_at).map(|t| now - t)
    }

    pub fn is_silent(&self, now: Timestamp) -> bool {
        self.time_since_last_update(now)
            .map(|d| d > self.silence_threshold)
            .unwrap_or(false)
    }

    /// Evaluate at `now`, logging gap transitions. Returns true while healthy.
    pub fn check(&mut self, now: Timestamp) -> bool {
        let silent = self.is_silent(now);
        if silent && !self.in_gap {
            self.in_gap = true;
            self.gap_count += 1;
            log::warn!(
                "[HEALTH] {} silent for {:.1}s, tracks will age out",
                self.name,
                self.time_since_last_update(now).unwrap_or_default()
            );
        } else if !silent && self.in_gap {
            self.in_gap = false;
            log::info!("[HEALTH] {} updates resumed", self.name);
        }
        !silent
    }

    pub fn gap_count(&self) -> u32 {
        self.gap_count
    }
}
