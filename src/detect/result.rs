use std::fmt;

/// Axis-aligned bounding box in source-frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Build from the center/size form most workflow blocks emit.
    pub fn from_center(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x_min: x - width / 2.0,
            y_min: y - height / 2.0,
            x_max: x + width / 2.0,
            y_max: y + height / 2.0,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// One detected object within a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Model confidence (0.0-1.0).
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// Class label, when the workflow reports one.
    pub class: Option<String>,
}

impl Detection {
    pub fn new(confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            confidence,
            bbox,
            class: None,
        }
    }
}

/// All detections produced for a single processed frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prediction {
    pub detections: Vec<Detection>,
}

impl Prediction {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
