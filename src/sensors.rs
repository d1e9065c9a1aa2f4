use crate::error::{AwarenessError, AwarenessResult};
use crate::sensor_receiver::{FeedStatus, SensorEvent, SensorFeed};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tracking features a device offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub scene_reconstruction: bool,
    pub world_tracking: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            scene_reconstruction: true,
            world_tracking: true,
        }
    }

    pub fn none() -> Self {
        Self {
            scene_reconstruction: false,
            world_tracking: false,
        }
    }

    /// Name of the first missing feature, if any.
    pub fn missing(&self) -> Option<&'static str> {
        if !self.scene_reconstruction {
            Some("scene reconstruction not supported on this device")
        } else if !self.world_tracking {
            Some("world tracking not supported on this device")
        } else {
            None
        }
    }
}

/// The world-tracking session that produces surface updates.
///
/// `start` hands the provider a feed to push into from whatever thread its
/// callbacks run on; `stop` must stop all pushes before returning.
pub trait SensorProvider: Send {
    fn capabilities(&self) -> Capabilities;
    fn start(&mut self, feed: SensorFeed) -> AwarenessResult<()>;
    fn stop(&mut self);
}

/// Replays a recorded sequence of anchor events on a background thread,
/// honouring the gaps between their timestamps.
pub struct ScriptedProvider {
    capabilities: Capabilities,
    events: Arc<Vec<SensorEvent>>,
    time_scale: f64,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<u64>>,
}

const STOP_POLL: Duration = Duration::from_millis(20);

impl ScriptedProvider {
    pub fn new(events: Vec<SensorEvent>) -> Self {
        Self {
            capabilities: Capabilities::full(),
            events: Arc::new(events),
            time_scale: 1.0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// A device without the required tracking features.
    pub fn unsupported() -> Self {
        let mut provider = Self::new(Vec::new());
        provider.capabilities = Capabilities::none();
        provider
    }

    /// Playback speed multiplier; 2.0 replays twice as fast.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.time_scale = scale;
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn replay(events: &[SensorEvent], feed: &SensorFeed, time_scale: f64, stop: &AtomicBool) -> u64 {
        let Some(first) = events.first() else {
            return 0;
        };
        let base = first.timestamp;
        let started = Instant::now();
        let mut pushed = 0u64;

        for event in events {
            let offset = ((event.timestamp - base) / time_scale).max(0.0);
            let due = started + Duration::from_secs_f64(offset);
            while Instant::now() < due {
                if stop.load(Ordering::Relaxed) {
                    return pushed;
                }
                thread::sleep((due - Instant::now()).min(STOP_POLL));
            }
            if stop.load(Ordering::Relaxed) {
                return pushed;
            }

            match feed.push(event.clone()) {
                FeedStatus::Queued => pushed += 1,
                FeedStatus::Dropped => {
                    log::debug!("[scripted] queue full, dropped anchor {}", event.anchor_id);
                }
                FeedStatus::Closed => {
                    log::debug!("[scripted] feed closed after {} events", pushed);
                    break;
                }
            }
        }
        pushed
    }
}

impl SensorProvider for ScriptedProvider {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn start(&mut self, feed: SensorFeed) -> AwarenessResult<()> {
        if let Some(reason) = self.capabilities.missing() {
            return Err(AwarenessError::NotSupported(reason.to_string()));
        }
        if self.worker.is_some() {
            return Ok(());
        }

        self.stop_flag.store(false, Ordering::Relaxed);
        let events = Arc::clone(&self.events);
        let stop = Arc::clone(&self.stop_flag);
        let time_scale = self.time_scale;

        let worker = thread::Builder::new()
            .name("scripted-sensor".to_string())
            .spawn(move || Self::replay(&events, &feed, time_scale, &stop))
            .map_err(|e| AwarenessError::SessionFailed(e.to_string()))?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(pushed) => log::debug!("[scripted] stopped after {} events", pushed),
                Err(_) => log::error!("[scripted] replay thread panicked"),
            }
        }
    }
}

impl Drop for ScriptedProvider {
    fn drop(&mut self) {
        self.stop();
    }
}
