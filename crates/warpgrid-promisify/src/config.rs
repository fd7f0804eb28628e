//! Adapter configuration.
//!
//! Usually embedded in a larger TOML document; every key is optional.
//!
//! ```toml
//! default_status = 200
//! spawn_handler = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Status reported when the handler never calls `status()`.
    pub default_status: u16,
    /// Spawn asynchronous handlers onto the current Tokio runtime so they
    /// run to the end regardless of the caller. When false, or when no
    /// runtime is current, the handler is driven by polling the response
    /// future and is dropped with it.
    pub spawn_handler: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            default_status: 200,
            spawn_handler: true,
        }
    }
}

impl AdapterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
