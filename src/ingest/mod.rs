//! Prediction sources.
//!
//! Model execution happens outside this crate. A source hands the bridge one
//! `Prediction` per processed frame:
//! - `WorkflowSource` polls a hosted or self-hosted inference workflow over HTTP
//! - `JsonLinesSource` reads prediction documents from stdin or a file
//!
//! Sources MUST NOT:
//! - Retry a failed frame themselves (the next frame supersedes it)
//! - Log credentials or request bodies

pub mod jsonl;
pub mod payload;
mod rate;
pub mod workflow;

use std::fmt;

use crate::detect::Prediction;

pub use jsonl::JsonLinesSource;
pub use payload::parse_prediction;
pub use rate::FrameRate;
pub(crate) use rate::frame_interval;
pub use workflow::{WorkflowConfig, WorkflowSource, DEFAULT_INFERENCE_API_URL};

/// Error returned by a prediction source.
#[derive(Debug)]
pub enum SourceError {
    /// This frame is unusable; the source can be polled again.
    Frame(anyhow::Error),
    /// The source cannot continue.
    Fatal(anyhow::Error),
}

impl SourceError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Fatal(_))
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Frame(err) => write!(f, "frame skipped: {:#}", err),
            SourceError::Fatal(err) => write!(f, "source failed: {:#}", err),
        }
    }
}

impl std::error::Error for SourceError {}

/// Producer of per-frame predictions.
pub trait PredictionSource {
    /// Source identifier, for logging.
    fn name(&self) -> &'static str;

    /// Fetch the next frame's prediction. `Ok(None)` means the source is exhausted.
    fn next_prediction(&mut self) -> Result<Option<Prediction>, SourceError>;
}

impl<S: PredictionSource + ?Sized> PredictionSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn next_prediction(&mut self) -> Result<Option<Prediction>, SourceError> {
        (**self).next_prediction()
    }
}
