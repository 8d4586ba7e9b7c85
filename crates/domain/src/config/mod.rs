mod reconnect;
mod subscriber;
mod transport;

pub use reconnect::*;
pub use subscriber::*;
pub use transport::*;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub subscriber: SubscriberConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the configuration at `path`.  A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }
}
