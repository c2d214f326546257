//! Inference workflow source.
//!
//! Each frame is one `POST {api_url}/infer/workflows/{workspace}/{workflow_id}`
//! with the video feed passed as a URL image input; the inference server
//! grabs the frame, runs the workflow and returns its outputs.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::payload::parse_prediction;
use super::{PredictionSource, SourceError};
use crate::detect::Prediction;

pub const DEFAULT_INFERENCE_API_URL: &str = "https://detect.roboflow.com";

#[derive(Clone)]
pub struct WorkflowConfig {
    pub api_url: String,
    pub api_key: String,
    pub workspace: String,
    pub workflow_id: String,
    /// Snapshot URL the inference server fetches frames from.
    pub video_feed: String,
    /// Workflow output holding the detections.
    pub output_field: String,
    pub timeout: Duration,
}

pub struct WorkflowSource {
    agent: ureq::Agent,
    endpoint: String,
    request_body: String,
    output_field: String,
    frames_requested: u64,
}

impl WorkflowSource {
    pub fn new(config: WorkflowConfig) -> Result<Self> {
        let feed = Url::parse(&config.video_feed).context("parse VIDEO_FEED as url")?;
        match feed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "workflow source needs an http(s) snapshot VIDEO_FEED, got '{}'; \
                     use --detections to feed predictions from an external pipeline",
                    other
                ))
            }
        }

        let endpoint = workflow_endpoint(&config.api_url, &config.workspace, &config.workflow_id);
        let request_body = json!({
            "api_key": config.api_key,
            "inputs": {
                "image": {"type": "url", "value": config.video_feed}
            }
        })
        .to_string();

        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(config.timeout).build(),
            endpoint,
            request_body,
            output_field: config.output_field,
            frames_requested: 0,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }
}

impl PredictionSource for WorkflowSource {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn next_prediction(&mut self) -> Result<Option<Prediction>, SourceError> {
        self.frames_requested += 1;
        let response = match self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&self.request_body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code @ (401 | 403), _)) => {
                return Err(SourceError::Fatal(anyhow!(
                    "workflow endpoint rejected API key (HTTP {})",
                    code
                )))
            }
            Err(ureq::Error::Status(code, _)) => {
                return Err(SourceError::Frame(anyhow!(
                    "workflow endpoint returned HTTP {}",
                    code
                )))
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(SourceError::Frame(anyhow!(
                    "workflow request failed: {}",
                    err
                )))
            }
        };

        let body = response
            .into_string()
            .map_err(|e| SourceError::Frame(anyhow!("read workflow response: {}", e)))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::Frame(anyhow!("parse workflow response JSON: {}", e)))?;
        parse_prediction(&value, &self.output_field)
            .map(Some)
            .map_err(SourceError::Frame)
    }
}

fn workflow_endpoint(api_url: &str, workspace: &str, workflow_id: &str) -> String {
    format!(
        "{}/infer/workflows/{}/{}",
        api_url.trim_end_matches('/'),
        workspace,
        workflow_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(video_feed: &str) -> WorkflowConfig {
        WorkflowConfig {
            api_url: "http://127.0.0.1:9001/".to_string(),
            api_key: "key".to_string(),
            workspace: "home".to_string(),
            workflow_id: "package-detection".to_string(),
            video_feed: video_feed.to_string(),
            output_field: "output".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn endpoint_joins_workspace_and_workflow() {
        let source = WorkflowSource::new(config("http://camera.local/snapshot.jpg")).unwrap();
        assert_eq!(
            source.endpoint(),
            "http://127.0.0.1:9001/infer/workflows/home/package-detection"
        );
    }

    #[test]
    fn request_body_passes_feed_as_url_input() {
        let source = WorkflowSource::new(config("http://camera.local/snapshot.jpg")).unwrap();
        let body: Value = serde_json::from_str(&source.request_body).unwrap();
        assert_eq!(body["api_key"], "key");
        assert_eq!(body["inputs"]["image"]["type"], "url");
        assert_eq!(
            body["inputs"]["image"]["value"],
            "http://camera.local/snapshot.jpg"
        );
    }

    #[test]
    fn rtsp_feed_rejected() {
        let err = WorkflowSource::new(config("rtsp://camera.local/stream"))
            .err()
            .expect("rtsp feed should be rejected");
        assert!(err.to_string().contains("--detections"));
    }
}
