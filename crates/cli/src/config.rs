use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stampbot_brokers_bitstamp::BitstampConfig;
use stampbot_engine::EngineConfig;
use std::path::Path;

/// Settings file layout: a `[bitstamp]` and an `[engine]` table, both optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bitstamp: BitstampConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load from a TOML file, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
