use crate::types::Timestamp;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// What happened to a surface anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorEvent {
    Added,
    Updated,
    Removed,
}

/// One scene-reconstruction anchor update from the world-tracking provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub anchor_id: u64,
    pub event: AnchorEvent,
    /// User-relative anchor origin in meters (+x right, +y up, +z ahead).
    #[serde(default)]
    pub position: Vec3,
    /// Geometric complexity proxy (mesh vertex count).
    #[serde(default)]
    pub complexity: u32,
    pub timestamp: Timestamp,
}

impl SensorEvent {
    pub fn added(anchor_id: u64, position: Vec3, complexity: u32, timestamp: Timestamp) -> Self {
        Self {
            anchor_id,
            event: AnchorEvent::Added,
            position,
            complexity,
            timestamp,
        }
    }

    pub fn updated(anchor_id: u64, position: Vec3, complexity: u32, timestamp: Timestamp) -> Self {
        Self {
            event: AnchorEvent::Updated,
            ..Self::added(anchor_id, position, complexity, timestamp)
        }
    }

    pub fn removed(anchor_id: u64, timestamp: Timestamp) -> Self {
        Self {
            anchor_id,
            event: AnchorEvent::Removed,
            position: Vec3::ZERO,
            complexity: 0,
            timestamp,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.event == AnchorEvent::Removed
    }

    /// A surface update is usable only when every coordinate is finite.
    pub fn is_well_formed(&self) -> bool {
        self.is_removal() || (self.position.is_finite() && self.timestamp.is_finite())
    }
}

/// Result of handing an event to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Queued,
    /// Queue full, event dropped
    Dropped,
    /// Pipeline torn down
    Closed,
}

/// Producer handle given to sensor callbacks. Cheap to clone and safe to move
/// to another thread; the pipeline drains the other end on its own tick.
#[derive(Debug, Clone)]
pub struct SensorFeed {
    tx: Sender<SensorEvent>,
}

impl SensorFeed {
    pub fn push(&self, event: SensorEvent) -> FeedStatus {
        match self.tx.try_send(event) {
            Ok(()) => FeedStatus::Queued,
            Err(TrySendError::Full(_)) => FeedStatus::Dropped,
            Err(TrySendError::Disconnected(_)) => FeedStatus::Closed,
        }
    }
}

/// Bounded hand-off queue between sensor producers and the pipeline tick.
pub struct SensorQueue {
    tx: Sender<SensorEvent>,
    rx: Receiver<SensorEvent>,
}

impl SensorQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn feed(&self) -> SensorFeed {
        SensorFeed {
            tx: self.tx.clone(),
        }
    }

    /// Take every event received since the previous drain, in arrival order.
    pub fn drain(&self) -> Vec<SensorEvent> {
        self.rx.try_iter().collect()
    }

    /// Discard pending events, returning how many were thrown away.
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
