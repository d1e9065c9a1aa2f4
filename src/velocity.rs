use crate::config::VelocityMode;
use crate::types::Timestamp;
use std::collections::{HashMap, VecDeque};

const RANGE_HISTORY_SIZE: usize = 10;
const MIN_HISTORY_SPAN_SECS: f64 = 0.05;

/// Closing-speed source for surface updates.
///
/// In [`VelocityMode::Disabled`] every object reports zero closing speed, so
/// threats come from distance alone. [`VelocityMode::MultiFrame`] keeps a short
/// range history per anchor and reports the range rate across it.
pub struct ClosingSpeedEstimator {
    mode: VelocityMode,
    history: HashMap<u64, AnchorHistory>,
}

struct AnchorHistory {
    /// Sensor-time range samples, oldest first.
    samples: VecDeque<(Timestamp, f32)>,
    /// Pipeline time of the newest sample.
    last_seen: Timestamp,
}

impl ClosingSpeedEstimator {
    pub fn new(mode: VelocityMode) -> Self {
        Self {
            mode,
            history: HashMap::new(),
        }
    }

    pub fn mode(&self) -> VelocityMode {
        self.mode
    }

    /// Record a range sample for an anchor and return its closing speed (m/s, >= 0).
    ///
    /// `timestamp` is the sensor's sample time and drives the rate; `now` is
    /// the pipeline clock used to age out silent anchors.
    pub fn observe(
        &mut self,
        anchor_id: u64,
        now: Timestamp,
        timestamp: Timestamp,
        distance: f32,
    ) -> f32 {
        if self.mode == VelocityMode::Disabled {
            return 0.0;
        }

        let entry = self.history.entry(anchor_id).or_insert_with(|| AnchorHistory {
            samples: VecDeque::with_capacity(RANGE_HISTORY_SIZE),
            last_seen: now,
        });
        entry.last_seen = now;
        let samples = &mut entry.samples;

        // Out-of-order samples would produce a negative span; start over.
        if samples.back().is_some_and(|(t, _)| timestamp < *t) {
            samples.clear();
        }
        samples.push_back((timestamp, distance));
        if samples.len() > RANGE_HISTORY_SIZE {
            samples.pop_front();
        }

        let (Some(&(t0, d0)), Some(&(t1, d1))) = (samples.front(), samples.back()) else {
            return 0.0;
        };
        let span = t1 - t0;
        if span < MIN_HISTORY_SPAN_SECS {
            return 0.0;
        }

        let rate = (d0 - d1) as f64 / span;
        if rate.is_finite() {
            rate.max(0.0) as f32
        } else {
            0.0
        }
    }

    /// Drop histories of anchors not observed within `max_age` of `now`.
    /// Returns how many were dropped.
    pub fn expire(&mut self, now: Timestamp, max_age: f64) -> usize {
        let before = self.history.len();
        self.history.retain(|_, h| now - h.last_seen <= max_age);
        before - self.history.len()
    }

    pub fn forget(&mut self, anchor_id: u64) {
        self.history.remove(&anchor_id);
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn tracked_anchors(&self) -> usize {
        self.history.len()
    }
}
