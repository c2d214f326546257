//! Outbound state notifications.
//!
//! The bridge only ever sends absolute commands: every processed frame
//! results in either a turn-on or a turn-off call, never a toggle.

mod home_assistant;

use anyhow::Result;
use std::fmt;

pub use home_assistant::{HomeAssistantConfig, HomeAssistantNotifier, DEFAULT_ENTITY_ID};

/// Absolute state of the remote boolean sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorState {
    On,
    Off,
}

impl SensorState {
    /// ON when at least one package survived filtering.
    pub fn from_count(count: usize) -> Self {
        if count > 0 {
            SensorState::On
        } else {
            SensorState::Off
        }
    }

    /// Home Assistant service name for this state.
    pub fn service(self) -> &'static str {
        match self {
            SensorState::On => "turn_on",
            SensorState::Off => "turn_off",
        }
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorState::On => f.write_str("ON"),
            SensorState::Off => f.write_str("OFF"),
        }
    }
}

/// Sink for sensor state commands.
pub trait SensorNotifier {
    /// Target identifier, for logging.
    fn target(&self) -> &str;

    /// Push an absolute state. Errors are reported, never retried here.
    fn set(&mut self, state: SensorState) -> Result<()>;
}
