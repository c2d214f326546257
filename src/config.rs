use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::detect::{DetectionFilter, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_X};
use crate::ingest::{frame_interval, WorkflowConfig, DEFAULT_INFERENCE_API_URL};
use crate::transport::{HomeAssistantConfig, DEFAULT_ENTITY_ID};

/// Path of the optional JSON file with tunables.
pub const CONFIG_PATH_VAR: &str = "PACKAGE_BRIDGE_CONFIG";

/// Variables that must be set and non-empty, in the order they are checked.
pub const REQUIRED_VARS: [&str; 6] = [
    "VIDEO_FEED",
    "API_KEY",
    "WORKSPACE_NAME",
    "WORKFLOW_ID",
    "ACCESS_TOKEN",
    "HOME_ASSISTANT_URL",
];

const DEFAULT_MAX_FPS: f64 = 0.2;
const DEFAULT_OUTPUT_FIELD: &str = "output";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct BridgeConfigFile {
    filter: Option<FilterConfigFile>,
    entity_id: Option<String>,
    max_fps: Option<f64>,
    inference_api_url: Option<String>,
    output_field: Option<String>,
    http_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FilterConfigFile {
    min_confidence: Option<f64>,
    min_x: Option<f64>,
}

/// Process-wide settings, built once at startup.
#[derive(Clone)]
pub struct BridgeConfig {
    pub video_feed: String,
    pub api_key: String,
    pub workspace_name: String,
    pub workflow_id: String,
    pub access_token: String,
    pub home_assistant_url: String,
    pub entity_id: String,
    pub filter: DetectionFilter,
    /// Frames per second cap; 0 disables throttling.
    pub max_fps: f64,
    pub inference_api_url: String,
    pub output_field: String,
    pub http_timeout: Duration,
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn load_from<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            non_empty(&lookup, name)
                .ok_or_else(|| anyhow!("Environment variable '{}' is not set.", name))
        };
        let video_feed = require("VIDEO_FEED")?;
        let api_key = require("API_KEY")?;
        let workspace_name = require("WORKSPACE_NAME")?;
        let workflow_id = require("WORKFLOW_ID")?;
        let access_token = require("ACCESS_TOKEN")?;
        let home_assistant_url = require("HOME_ASSISTANT_URL")?;

        let file_cfg = match non_empty(&lookup, CONFIG_PATH_VAR) {
            Some(path) => read_config_file(Path::new(&path))?,
            None => BridgeConfigFile::default(),
        };
        let filter_file = file_cfg.filter.unwrap_or_default();

        let mut cfg = Self {
            video_feed,
            api_key,
            workspace_name,
            workflow_id,
            access_token,
            home_assistant_url,
            entity_id: file_cfg
                .entity_id
                .unwrap_or_else(|| DEFAULT_ENTITY_ID.to_string()),
            filter: DetectionFilter::new(
                filter_file.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
                filter_file.min_x.unwrap_or(DEFAULT_MIN_X),
            ),
            max_fps: file_cfg.max_fps.unwrap_or(DEFAULT_MAX_FPS),
            inference_api_url: file_cfg
                .inference_api_url
                .unwrap_or_else(|| DEFAULT_INFERENCE_API_URL.to_string()),
            output_field: file_cfg
                .output_field
                .unwrap_or_else(|| DEFAULT_OUTPUT_FIELD.to_string()),
            http_timeout: Duration::from_secs(
                file_cfg
                    .http_timeout_secs
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        };
        cfg.apply_env(&lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = non_empty(lookup, "MIN_CONFIDENCE") {
            self.filter.min_confidence = value
                .parse()
                .map_err(|_| anyhow!("MIN_CONFIDENCE must be a number between 0 and 1"))?;
        }
        if let Some(value) = non_empty(lookup, "MIN_X") {
            self.filter.min_x = value
                .parse()
                .map_err(|_| anyhow!("MIN_X must be a number of pixels"))?;
        }
        if let Some(value) = non_empty(lookup, "HA_ENTITY_ID") {
            self.entity_id = value;
        }
        if let Some(value) = non_empty(lookup, "MAX_FPS") {
            self.max_fps = value
                .parse()
                .map_err(|_| anyhow!("MAX_FPS must be a number of frames per second"))?;
        }
        if let Some(value) = non_empty(lookup, "INFERENCE_API_URL") {
            self.inference_api_url = value;
        }
        if let Some(value) = non_empty(lookup, "WORKFLOW_OUTPUT") {
            self.output_field = value;
        }
        if let Some(value) = non_empty(lookup, "HTTP_TIMEOUT_SECS") {
            let seconds: u64 = value.parse().map_err(|_| {
                anyhow!("HTTP_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.http_timeout = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.home_assistant_url =
            validate_http_url("HOME_ASSISTANT_URL", &self.home_assistant_url)?;
        self.inference_api_url =
            validate_http_url("INFERENCE_API_URL", &self.inference_api_url)?;

        if !(0.0..=1.0).contains(&self.filter.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be within 0..1, got {}",
                self.filter.min_confidence
            ));
        }
        if !self.filter.min_x.is_finite() {
            return Err(anyhow!("min_x must be finite"));
        }
        if !self.max_fps.is_finite() || self.max_fps < 0.0 {
            return Err(anyhow!("max_fps must be zero or positive, got {}", self.max_fps));
        }
        if self.max_fps > 0.0 && frame_interval(self.max_fps).is_none() {
            return Err(anyhow!(
                "max_fps {} is too small; the frame interval would overflow",
                self.max_fps
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(anyhow!("http timeout must be greater than zero"));
        }
        let object_id = self.entity_id.strip_prefix("input_boolean.").unwrap_or_default();
        if object_id.is_empty() {
            return Err(anyhow!(
                "entity id '{}' is not an input_boolean entity",
                self.entity_id
            ));
        }
        if self.output_field.trim().is_empty() {
            return Err(anyhow!("workflow output field must not be empty"));
        }
        Ok(())
    }

    pub fn home_assistant(&self) -> HomeAssistantConfig {
        HomeAssistantConfig {
            base_url: self.home_assistant_url.clone(),
            access_token: self.access_token.clone(),
            entity_id: self.entity_id.clone(),
            timeout: self.http_timeout,
        }
    }

    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig {
            api_url: self.inference_api_url.clone(),
            api_key: self.api_key.clone(),
            workspace: self.workspace_name.clone(),
            workflow_id: self.workflow_id.clone(),
            video_feed: self.video_feed.clone(),
            output_field: self.output_field.clone(),
            timeout: self.http_timeout,
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("video_feed", &self.video_feed)
            .field("api_key", &"<redacted>")
            .field("workspace_name", &self.workspace_name)
            .field("workflow_id", &self.workflow_id)
            .field("access_token", &"<redacted>")
            .field("home_assistant_url", &self.home_assistant_url)
            .field("entity_id", &self.entity_id)
            .field("filter", &self.filter)
            .field("max_fps", &self.max_fps)
            .field("inference_api_url", &self.inference_api_url)
            .field("output_field", &self.output_field)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn validate_http_url(name: &str, raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| anyhow!("{} is not a valid url: {}", name, e))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(anyhow!("{} must use http or https, got '{}'", name, other)),
    }
}

fn read_config_file(path: &Path) -> Result<BridgeConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
