//! Pedestrian situational awareness: classify the surfaces a world-tracking
//! session reports, rate how dangerous they are and raise rate-limited alerts.

pub mod alert;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod health_monitor;
pub mod live_status;
pub mod pipeline;
pub mod sensor_receiver;
pub mod sensors;
pub mod threat;
pub mod tracker;
pub mod types;
pub mod velocity;

pub use alert::{ActiveAlert, AlertEvent, FeedbackCue, FeedbackSink};
pub use config::{AwarenessConfig, VelocityMode};
pub use engine::AwarenessEngine;
pub use error::{AwarenessError, AwarenessResult};
pub use live_status::{HudState, LiveStatus};
pub use pipeline::{AwarenessPipeline, TickReport};
pub use sensor_receiver::{SensorEvent, SensorFeed};
pub use sensors::{Capabilities, ScriptedProvider, SensorProvider};
