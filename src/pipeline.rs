// The pipeline is the single owner of all awareness state. Producers only
// ever touch the sensor queue; every track mutation and alert transition
// happens inside `tick`, one call at a time, so a track can never age out
// and be refreshed concurrently.

use crate::alert::{AlertDebouncer, AlertEvent, FeedbackSink};
use crate::classifier::{GeometryClassifier, ObjectClassifier, SurfaceDescriptor};
use crate::config::AwarenessConfig;
use crate::error::{AwarenessError, AwarenessResult};
use crate::health_monitor::SensorHealth;
use crate::live_status::{current_timestamp, HudState, LiveStatus};
use crate::sensor_receiver::{SensorEvent, SensorFeed, SensorQueue};
use crate::sensors::SensorProvider;
use crate::threat::assess_threat_with;
use crate::tracker::{ObjectTracker, TrackerSettings};
use crate::types::{AlertLevel, Timestamp, TrackCandidate};
use crate::velocity::ClosingSpeedEstimator;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub now: Timestamp,
    pub ingested: usize,
    pub malformed: usize,
    pub out_of_range: usize,
    pub removed: usize,
    pub expired: usize,
    pub level: Option<AlertLevel>,
    /// Alert transitions in the order they happened.
    pub alerts: Vec<AlertEvent>,
}

/// Sensor updates in, tracked objects and alerts out.
pub struct AwarenessPipeline {
    config: AwarenessConfig,
    provider: Box<dyn SensorProvider>,
    classifier: Box<dyn ObjectClassifier>,
    feedback: Option<Box<dyn FeedbackSink>>,
    queue: SensorQueue,
    tracker: ObjectTracker,
    velocity: ClosingSpeedEstimator,
    debouncer: AlertDebouncer,
    health: SensorHealth,
    status: LiveStatus,
    level: AlertLevel,
    running: bool,
    started_at: Timestamp,
}

impl AwarenessPipeline {
    pub fn new(config: AwarenessConfig, provider: Box<dyn SensorProvider>) -> AwarenessResult<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            classifier: Box::new(GeometryClassifier::new()),
            feedback: None,
            queue: SensorQueue::new(config.feed_capacity),
            tracker: ObjectTracker::new(TrackerSettings::from(&config)),
            velocity: ClosingSpeedEstimator::new(config.velocity_mode),
            debouncer: AlertDebouncer::new(&config),
            health: SensorHealth::new("scene reconstruction", config.sensor_gap_secs),
            status: LiveStatus::new(),
            level: AlertLevel::None,
            running: false,
            started_at: 0.0,
            config,
        })
    }

    /// Replace the geometry heuristic with another classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn ObjectClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_feedback(mut self, sink: Box<dyn FeedbackSink>) -> Self {
        self.feedback = Some(sink);
        self
    }

    /// Producer handle for sensor callbacks.
    pub fn feed(&self) -> SensorFeed {
        self.queue.feed()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &AwarenessConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn debouncer(&self) -> &AlertDebouncer {
        &self.debouncer
    }

    pub fn velocity(&self) -> &ClosingSpeedEstimator {
        &self.velocity
    }

    pub fn status(&self) -> &LiveStatus {
        &self.status
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Start the sensor session. Starting a running pipeline does nothing.
    /// On failure the pipeline stays stopped and the error is returned once.
    pub fn start(&mut self, now: Timestamp) -> AwarenessResult<()> {
        if self.running {
            log::debug!("awareness pipeline already running");
            return Ok(());
        }

        if let Some(reason) = self.provider.capabilities().missing() {
            log::error!("awareness engine unavailable: {}", reason);
            return Err(AwarenessError::NotSupported(reason.to_string()));
        }

        let stale = self.queue.clear();
        if stale > 0 {
            log::debug!("discarded {} updates queued before start", stale);
        }

        self.provider.start(self.queue.feed()).map_err(|e| {
            log::error!("sensor session failed to start: {}", e);
            match e {
                AwarenessError::NotSupported(_) | AwarenessError::SessionFailed(_) => e,
                other => AwarenessError::SessionFailed(other.to_string()),
            }
        })?;

        self.running = true;
        self.started_at = now;
        self.level = AlertLevel::None;
        self.health.arm(now);
        self.status = LiveStatus::new();
        log::info!(
            "awareness pipeline started (scan radius {:.0}m, velocity {:?})",
            self.config.effective_scan_radius(),
            self.velocity.mode()
        );
        Ok(())
    }

    /// Stop the session and drop all state. Stopping twice does nothing.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }

        self.provider.stop();
        let discarded = self.queue.clear();
        self.tracker.clear();
        self.velocity.clear();
        self.debouncer.reset();
        self.health.disarm();
        self.level = AlertLevel::None;
        self.running = false;
        log::info!(
            "awareness pipeline stopped ({} pending updates discarded)",
            discarded
        );
    }

    /// Process everything queued since the last tick and re-evaluate alerts.
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let mut report = TickReport {
            now,
            ..Default::default()
        };
        if !self.running {
            return report;
        }

        let events = self.queue.drain();
        if !events.is_empty() {
            self.health.update(now);
        }
        for event in &events {
            self.apply_event(event, now, &mut report);
        }

        report.expired = self.tracker.expire(now);
        let forgotten = self.velocity.expire(now, self.config.stale_after_secs);
        if forgotten > 0 {
            log::debug!("dropped range history of {} silent anchors", forgotten);
        }
        self.level = self.tracker.aggregate_level();
        report.level = Some(self.level);

        let candidate = self.tracker.nearest_qualifying(self.config.min_alert_threat);
        report.alerts = self.debouncer.evaluate(self.level, candidate, now);

        if let Some(sink) = self.feedback.as_mut() {
            for event in &report.alerts {
                if let AlertEvent::Triggered { cue, .. } = event {
                    sink.on_alert(cue);
                }
            }
        }

        let healthy = self.health.check(now);
        self.record(&report, healthy);
        report
    }

    /// Snapshot for the presentation layer.
    pub fn state(&self) -> HudState {
        HudState {
            running: self.running,
            objects: self.tracker.objects().to_vec(),
            level: self.level,
            alert: self.debouncer.active_alert().cloned(),
        }
    }

    fn apply_event(&mut self, event: &SensorEvent, now: Timestamp, report: &mut TickReport) {
        if event.is_removal() {
            report.removed += self.tracker.remove_anchor(event.anchor_id);
            self.velocity.forget(event.anchor_id);
            return;
        }

        if !event.is_well_formed() {
            log::warn!(
                "dropping malformed update for anchor {} (position {:?}, timestamp {})",
                event.anchor_id,
                event.position,
                event.timestamp
            );
            report.malformed += 1;
            return;
        }

        let distance = event.position.length();
        if distance > self.config.effective_scan_radius() {
            report.out_of_range += 1;
            return;
        }

        let category = self.classifier.classify(&SurfaceDescriptor {
            complexity: event.complexity,
            position: event.position,
        });
        let closing_speed = self.velocity
            .observe(event.anchor_id, now, event.timestamp, distance);
        let threat = assess_threat_with(
            category,
            distance,
            closing_speed,
            self.config.closing_speed_epsilon,
        );

        let candidate = TrackCandidate {
            anchor_id: event.anchor_id,
            category,
            position: event.position,
            closing_speed,
            threat,
        };
        self.tracker.ingest(&candidate, now);
        report.ingested += 1;
    }

    fn record(&mut self, report: &TickReport, healthy: bool) {
        let status = &mut self.status;
        status.timestamp = current_timestamp();
        status.uptime_seconds = (report.now - self.started_at).max(0.0);
        status.ticks += 1;
        status.updates_ingested += report.ingested as u64;
        status.updates_malformed += report.malformed as u64;
        status.updates_out_of_range += report.out_of_range as u64;
        status.anchors_removed += report.removed as u64;
        status.tracks_expired += report.expired as u64;
        status.active_tracks = self.tracker.len();
        status.level = report.level;
        for event in &report.alerts {
            match event {
                AlertEvent::Triggered { .. } => status.alerts_triggered += 1,
                AlertEvent::Dismissed { .. } => status.alerts_dismissed += 1,
            }
        }
        status.sensor_healthy = healthy;
        status.sensor_gaps = self.health.gap_count();
    }
}

impl Drop for AwarenessPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
