use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BotDelivery {
    #[default]
    Inject,
    Stream,
}

/// Host-level defaults, loaded from an optional camelCase JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub bot_delivery: BotDelivery,
    pub chat_disabled_default: bool,
    pub send_option_output: bool,
    pub send_checkbox_output: bool,
    pub event_capacity: usize,
    pub stream_chunk_delay_ms: u64,
}

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_delivery: BotDelivery::Inject,
            chat_disabled_default: false,
            send_option_output: true,
            send_checkbox_output: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            stream_chunk_delay_ms: 30,
        }
    }
}

impl Settings {
    pub fn from_json_str(source: &str) -> FlowResult<Self> {
        let settings: Settings = serde_json::from_str(source).map_err(|error| {
            FlowError::new(
                "CONFIG_SETTINGS_INVALID",
                format!("Failed to parse settings: {}", error),
            )
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.event_capacity == 0 {
            return Err(FlowError::new(
                "CONFIG_EVENT_CAPACITY",
                "eventCapacity must be at least 1.",
            ));
        }
        Ok(())
    }
}
