//! Home Assistant REST client for `input_boolean` services.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::time::Duration;

use super::{SensorNotifier, SensorState};

pub const DEFAULT_ENTITY_ID: &str = "input_boolean.package_detected";

#[derive(Clone)]
pub struct HomeAssistantConfig {
    /// Base URL without trailing slash, e.g. `http://homeassistant.local:8123`.
    pub base_url: String,
    /// Long-lived access token.
    pub access_token: String,
    pub entity_id: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ServiceCall<'a> {
    entity_id: &'a str,
}

pub struct HomeAssistantNotifier {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
    entity_id: String,
}

impl HomeAssistantNotifier {
    pub fn new(config: HomeAssistantConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Bearer {}", config.access_token),
            entity_id: config.entity_id,
        }
    }

    /// Service endpoint for the given state.
    pub fn service_url(&self, state: SensorState) -> String {
        format!(
            "{}/api/services/input_boolean/{}",
            self.base_url,
            state.service()
        )
    }
}

impl SensorNotifier for HomeAssistantNotifier {
    fn target(&self) -> &str {
        &self.entity_id
    }

    fn set(&mut self, state: SensorState) -> Result<()> {
        let url = self.service_url(state);
        let body = serde_json::to_string(&ServiceCall {
            entity_id: &self.entity_id,
        })
        .context("encode service call")?;

        match self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(response) => {
                log::debug!(
                    "{} -> {} (HTTP {})",
                    self.entity_id,
                    state,
                    response.status()
                );
                Ok(())
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(anyhow!("{} returned HTTP {}", url, code))
            }
            Err(ureq::Error::Transport(err)) => Err(anyhow!("request to {} failed: {}", url, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(base_url: &str) -> HomeAssistantNotifier {
        HomeAssistantNotifier::new(HomeAssistantConfig {
            base_url: base_url.to_string(),
            access_token: "token".to_string(),
            entity_id: DEFAULT_ENTITY_ID.to_string(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn service_urls() {
        let ha = notifier("http://ha.local:8123/");
        assert_eq!(
            ha.service_url(SensorState::On),
            "http://ha.local:8123/api/services/input_boolean/turn_on"
        );
        assert_eq!(
            ha.service_url(SensorState::Off),
            "http://ha.local:8123/api/services/input_boolean/turn_off"
        );
    }

    #[test]
    fn bearer_header_is_built_once() {
        let ha = notifier("http://ha.local:8123");
        assert_eq!(ha.authorization, "Bearer token");
        assert_eq!(ha.target(), "input_boolean.package_detected");
    }

    #[test]
    fn body_carries_entity_id() {
        let body = serde_json::to_string(&ServiceCall {
            entity_id: DEFAULT_ENTITY_ID,
        })
        .unwrap();
        assert_eq!(body, r#"{"entity_id":"input_boolean.package_detected"}"#);
    }
}
