//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Model name reported in response chunks
    #[serde(default = "default_model")]
    pub model: String,

    /// Canned completion text served by the scripted source
    #[serde(default = "default_reply")]
    pub reply: String,

    /// Pause between streamed deltas, in milliseconds (0 = no pacing)
    #[serde(default = "default_delta_interval_ms")]
    pub delta_interval_ms: u64,
}

impl GatewayConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model) = &cli.model {
            config.model = model.clone();
        }

        Ok(config)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            reply: default_reply(),
            delta_interval_ms: default_delta_interval_ms(),
        }
    }
}

fn default_model() -> String {
    "streamgate-mock-1".to_string()
}

fn default_reply() -> String {
    "Thanks for trying Streamgate. This reply is streamed one fragment at a time.".to_string()
}

fn default_delta_interval_ms() -> u64 {
    25
}
