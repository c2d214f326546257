//! Line-delimited prediction documents from stdin or a file.
//!
//! Lets an external pipeline process print one JSON document per frame and
//! pipe it into the bridge.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use super::payload::parse_prediction;
use super::{PredictionSource, SourceError};
use crate::detect::Prediction;

pub struct JsonLinesSource<R> {
    reader: R,
    output_field: String,
    label: String,
    line_no: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, output_field: &str, label: &str) -> Self {
        Self {
            reader,
            output_field: output_field.to_string(),
            label: label.to_string(),
            line_no: 0,
        }
    }
}

impl JsonLinesSource<Box<dyn BufRead>> {
    /// Open `path`, or stdin when `path` is `-`.
    pub fn open(path: &str, output_field: &str) -> Result<Self> {
        let (reader, label): (Box<dyn BufRead>, String) = if path == "-" {
            (Box::new(io::stdin().lock()), "stdin".to_string())
        } else {
            let file = File::open(path)
                .with_context(|| format!("failed to open detections file {}", path))?;
            (Box::new(BufReader::new(file)), path.to_string())
        };
        Ok(Self::new(reader, output_field, &label))
    }
}

impl<R: BufRead> PredictionSource for JsonLinesSource<R> {
    fn name(&self) -> &'static str {
        "json-lines"
    }

    fn next_prediction(&mut self) -> Result<Option<Prediction>, SourceError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).map_err(|e| {
                SourceError::Fatal(anyhow!("failed to read {}: {}", self.label, e))
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                SourceError::Frame(anyhow!(
                    "{} line {}: invalid json: {}",
                    self.label,
                    self.line_no,
                    e
                ))
            })?;
            return parse_prediction(&value, &self.output_field)
                .map(Some)
                .map_err(|e| {
                    SourceError::Frame(e.context(format!("{} line {}", self.label, self.line_no)))
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(input: &str) -> JsonLinesSource<Cursor<Vec<u8>>> {
        JsonLinesSource::new(Cursor::new(input.as_bytes().to_vec()), "output", "test")
    }

    #[test]
    fn reads_one_prediction_per_line() {
        let mut src = source(concat!(
            r#"{"predictions": [{"confidence": 0.9, "xyxy": [310, 0, 400, 50]}]}"#,
            "\n",
            r#"{"predictions": []}"#,
            "\n",
        ));
        assert_eq!(src.next_prediction().unwrap().unwrap().detections.len(), 1);
        assert!(src.next_prediction().unwrap().unwrap().is_empty());
        assert!(src.next_prediction().unwrap().is_none());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut src = source("\n   \n{\"predictions\": []}\n");
        assert!(src.next_prediction().unwrap().is_some());
        assert!(src.next_prediction().unwrap().is_none());
    }

    #[test]
    fn malformed_line_is_a_frame_error() {
        let mut src = source("not json\n{\"predictions\": []}\n");
        let err = src.next_prediction().unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("line 1"));
        assert!(src.next_prediction().unwrap().is_some());
    }

    #[test]
    fn missing_field_is_a_frame_error() {
        let mut src = source("{\"predictions\": [{\"xyxy\": [1, 2, 3, 4]}]}\n");
        let err = src.next_prediction().unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(JsonLinesSource::open("/nonexistent/detections.jsonl", "output").is_err());
    }
}
