use crate::error::{AwarenessError, AwarenessResult};
use crate::live_status::{HudState, LiveStatus};
use crate::pipeline::AwarenessPipeline;
use crate::sensor_receiver::SensorFeed;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Drives an [`AwarenessPipeline`] on a fixed tokio interval and publishes
/// its state to subscribers.
///
/// State is published while the pipeline lock is held, and a stopped
/// pipeline ignores ticks, so nothing produced by the tick task can land
/// after `stop` returns.
pub struct AwarenessEngine {
    pipeline: Arc<Mutex<AwarenessPipeline>>,
    state_tx: Arc<watch::Sender<HudState>>,
    tick_task: Option<JoinHandle<()>>,
    tick_interval: Duration,
    clock: Instant,
}

impl AwarenessEngine {
    pub fn new(pipeline: AwarenessPipeline) -> Self {
        let tick_interval = Duration::from_millis(pipeline.config().tick_interval_ms.max(1));
        let (state_tx, _) = watch::channel(pipeline.state());
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            state_tx: Arc::new(state_tx),
            tick_task: None,
            tick_interval,
            clock: Instant::now(),
        }
    }

    /// Seconds since the engine was created; the pipeline's time base.
    pub fn now(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    pub fn subscribe(&self) -> watch::Receiver<HudState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> HudState {
        self.state_tx.borrow().clone()
    }

    /// True while the tick loop is alive. A loop that exited on its own
    /// (poisoned pipeline lock) no longer counts.
    pub fn is_running(&self) -> bool {
        self.tick_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn feed(&self) -> AwarenessResult<SensorFeed> {
        Ok(self.lock()?.feed())
    }

    pub fn status(&self) -> AwarenessResult<LiveStatus> {
        Ok(self.lock()?.status().clone())
    }

    /// Start the sensor session and the tick loop. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self) -> AwarenessResult<()> {
        if self.is_running() {
            log::debug!("[ENGINE] already running");
            return Ok(());
        }
        self.tick_task = None;

        {
            let mut pipeline = self.lock()?;
            pipeline.start(self.now())?;
            self.state_tx.send_replace(pipeline.state());
        }

        let pipeline = Arc::clone(&self.pipeline);
        let state_tx = Arc::clone(&self.state_tx);
        let clock = self.clock;
        let period = self.tick_interval;

        self.tick_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Ok(mut pipeline) = pipeline.lock() else {
                    log::error!("[ENGINE] pipeline lock poisoned, tick loop exiting");
                    break;
                };
                if !pipeline.is_running() {
                    break;
                }
                pipeline.tick(clock.elapsed().as_secs_f64());
                state_tx.send_replace(pipeline.state());
            }
        }));
        log::info!("[ENGINE] ticking every {}ms", period.as_millis());
        Ok(())
    }

    /// Stop ticking and tear the session down. Subscribers see an idle,
    /// alert-free state once this returns.
    pub fn stop(&mut self) -> AwarenessResult<()> {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
        let mut pipeline = self.lock()?;
        pipeline.stop();
        self.state_tx.send_replace(pipeline.state());
        Ok(())
    }

    fn lock(&self) -> AwarenessResult<MutexGuard<'_, AwarenessPipeline>> {
        self.pipeline
            .lock()
            .map_err(|e| AwarenessError::Internal(format!("pipeline lock poisoned: {}", e)))
    }
}

impl Drop for AwarenessEngine {
    fn drop(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}
