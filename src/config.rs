//! Configuration management for Turnstile.
//!
//! The limiter ships with a seeded set of category limits; a hosting
//! application can externalize or override them through a YAML settings
//! file. Settings are validated at load time so bad quotas fail at startup,
//! never while serving a request.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};

/// Settings for a rate limiter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Period of the background cleanup sweep in milliseconds
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Category limits layered over the seeded defaults
    #[serde(default)]
    pub categories: Vec<CategoryLimit>,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            cleanup_interval_ms: default_cleanup_interval_ms(),
            categories: Vec::new(),
        }
    }
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}

/// A per-category quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLimit {
    /// Category name (e.g. `auth:login`)
    pub name: String,
    /// Length of the fixed window in milliseconds
    pub window_ms: u64,
    /// Maximum admitted requests per window
    pub max_requests: u32,
}

impl LimiterSettings {
    /// Load settings from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limiter settings");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Period of the background cleanup sweep.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Load settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: LimiterSettings = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every quota is usable.
    fn validate(&self) -> Result<()> {
        if self.cleanup_interval_ms == 0 {
            return Err(TurnstileError::Config(
                "cleanup_interval_ms must be positive".to_string(),
            ));
        }

        for category in &self.categories {
            if category.name.is_empty() {
                return Err(TurnstileError::Config(
                    "category name must not be empty".to_string(),
                ));
            }
            if category.window_ms == 0 {
                return Err(TurnstileError::Config(format!(
                    "category '{}': window_ms must be positive",
                    category.name
                )));
            }
            if category.max_requests == 0 {
                return Err(TurnstileError::Config(format!(
                    "category '{}': max_requests must be positive",
                    category.name
                )));
            }
        }

        Ok(())
    }
}
