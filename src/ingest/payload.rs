//! Prediction document parsing.
//!
//! Accepted shapes, outermost first:
//! - workflow response: `{"outputs": [{"<field>": ...}]}` (first output is used)
//! - single output: `{"<field>": ...}`
//! - predictions holder: `{"predictions": [...]}` or a bare `[...]`
//!
//! Each prediction carries `confidence`, an optional `class`, and a box in one of:
//! - corner form: `x_min`, `y_min`, `x_max`, `y_max`
//! - `xyxy`: `[x_min, y_min, x_max, y_max]`
//! - center form: `x`, `y`, `width`, `height`

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::detect::{BoundingBox, Detection, Prediction};

#[derive(Debug, Deserialize)]
struct RawDetection {
    confidence: f64,
    #[serde(default)]
    class: Option<String>,
    #[serde(flatten)]
    geometry: RawGeometry,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGeometry {
    Corners {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },
    Xyxy {
        xyxy: [f64; 4],
    },
    Center {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl RawGeometry {
    fn into_bbox(self) -> BoundingBox {
        match self {
            RawGeometry::Corners {
                x_min,
                y_min,
                x_max,
                y_max,
            } => BoundingBox::new(x_min, y_min, x_max, y_max),
            RawGeometry::Xyxy { xyxy } => BoundingBox::new(xyxy[0], xyxy[1], xyxy[2], xyxy[3]),
            RawGeometry::Center {
                x,
                y,
                width,
                height,
            } => BoundingBox::from_center(x, y, width, height),
        }
    }
}

/// Parse one frame's prediction document.
///
/// `output_field` names the workflow output holding the detections.
/// Any missing or mistyped field rejects the whole frame.
pub fn parse_prediction(value: &Value, output_field: &str) -> Result<Prediction> {
    let root = match value.get("outputs") {
        Some(Value::Array(outputs)) => outputs
            .first()
            .ok_or_else(|| anyhow!("workflow response has no outputs"))?,
        Some(_) => return Err(anyhow!("'outputs' is not an array")),
        None => value,
    };

    let node = root.get(output_field).unwrap_or(root);
    let items = match node {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("predictions") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(anyhow!("'predictions' is not an array")),
            None => {
                return Err(anyhow!(
                    "no predictions found in output '{}'",
                    output_field
                ))
            }
        },
        _ => return Err(anyhow!("output '{}' is not an object", output_field)),
    };

    let detections = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let raw: RawDetection = serde_json::from_value(item.clone())
                .map_err(|e| anyhow!("prediction {}: {}", idx, e))?;
            Ok(Detection {
                confidence: raw.confidence,
                bbox: raw.geometry.into_bbox(),
                class: raw.class,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Prediction::new(detections))
}
