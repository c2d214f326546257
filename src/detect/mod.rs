mod filter;
mod result;

pub use filter::{DetectionFilter, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_X};
pub use result::{BoundingBox, Detection, Prediction};
