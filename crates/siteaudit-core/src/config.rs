//! Scanner configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Settings shared by every scan a [`crate::Scanner`] performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Upper bound for each individual HTTP request
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: default_user_agent(),
        }
    }
}

impl ScannerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than 0".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; siteaudit/{}; technical SEO audit)",
        env!("CARGO_PKG_VERSION")
    )
}
