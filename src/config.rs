// SPDX-License-Identifier: MIT

//! Flow configuration - YAML files and environment variables

use crate::error::ConfigurationError;
use crate::flow::DEFAULT_RETRY_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding the retry limit
pub const RETRY_LIMIT_VAR: &str = "FLOWSTEP_RETRY_LIMIT";

/// Engine settings shared by flows built from it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Retryable failures tolerated before a run fails
    pub retry_limit: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

impl FlowConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigurationError> {
        let config: FlowConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Defaults overridden by `FLOWSTEP_RETRY_LIMIT` when set
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(RETRY_LIMIT_VAR) {
            config.retry_limit = raw.trim().parse().map_err(|_| {
                ConfigurationError::InvalidConfig(format!(
                    "{} must be a non-negative integer, got '{}'",
                    RETRY_LIMIT_VAR, raw
                ))
            })?;
        }
        Ok(config)
    }
}
