//! Engine configuration schema.
//!
//! Defines the settings accepted under the `"restfile"` key, their defaults
//! and validation.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for parsing, resolution and direct execution.
///
/// All fields are optional in the settings document; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Extra request-line methods accepted without an unknown-method warning.
    #[serde(default)]
    pub additional_methods: Vec<String>,

    /// Directory that relative `< path` body references resolve against.
    /// Defaults to the directory of the request file.
    #[serde(default)]
    pub body_base_dir: Option<PathBuf>,

    /// Recursion limit when a variable value contains placeholders.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Request timeout in milliseconds for the native transport.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether to validate TLS certificates in the native transport.
    #[serde(default = "default_validate_ssl", rename = "validateSSL")]
    pub validate_ssl: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            additional_methods: Vec::new(),
            body_base_dir: None,
            max_nesting_depth: default_max_nesting_depth(),
            timeout: default_timeout(),
            validate_ssl: default_validate_ssl(),
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxNestingDepth",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        if let Some(method) = self
            .additional_methods
            .iter()
            .find(|m| m.trim().is_empty() || !m.trim().chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(ConfigError::InvalidValue {
                field: "additionalMethods",
                reason: format!("'{}' is not a method token", method),
            });
        }

        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout)
    }
}

fn default_max_nesting_depth() -> usize {
    10
}

fn default_timeout() -> u64 {
    30000 // 30 seconds in milliseconds
}

fn default_validate_ssl() -> bool {
    true
}
