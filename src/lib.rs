//! Package detection bridge
//!
//! Turns per-frame object-detection results into an absolute ON/OFF state
//! on a Home Assistant `input_boolean`.
//!
//! # Flow
//!
//! 1. A `PredictionSource` yields one `Prediction` per processed frame.
//! 2. `DetectionFilter` keeps detections that are confident enough and lie
//!    outside the exclusion zone on the left of the frame.
//! 3. `PackageBridge` turns the surviving count into a `SensorState` and
//!    pushes it through a `SensorNotifier`.
//!
//! Model execution and frame capture are external to this crate.
//!
//! # Module Structure
//!
//! - `config`: startup configuration (environment + optional JSON file)
//! - `detect`: detection types and the confidence/spatial filter
//! - `ingest`: prediction sources (inference workflow, JSON lines)
//! - `transport`: sensor state notification (Home Assistant)
//! - `bridge`: frame callback and run loop

pub mod bridge;
pub mod config;
pub mod detect;
pub mod ingest;
pub mod transport;

pub use bridge::{BridgeStats, PackageBridge, RunOutcome};
pub use config::BridgeConfig;
pub use detect::{BoundingBox, Detection, DetectionFilter, Prediction};
pub use ingest::{
    FrameRate, JsonLinesSource, PredictionSource, SourceError, WorkflowConfig, WorkflowSource,
};
pub use transport::{HomeAssistantConfig, HomeAssistantNotifier, SensorNotifier, SensorState};
