//! Configuration loading.
//!
//! Settings are read from the `"restfile"` key of a JSON settings document
//! and validated. The resulting [`EngineConfig`] is passed by reference to
//! the parser and executor; there is no global configuration.

pub mod schema;

pub use schema::EngineConfig;

use log::warn;
use serde_json::Value;
use thiserror::Error;

/// Key of the engine's section in a settings document.
pub const SETTINGS_KEY: &str = "restfile";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Loads configuration from a settings document.
///
/// A section that fails to deserialize is logged and replaced by the
/// defaults; the result is then validated.
///
/// # Arguments
///
/// * `settings_json` - Optional JSON value containing settings under the
///   `"restfile"` key
///
/// # Returns
///
/// The loaded configuration, or `ConfigError` if validation fails.
///
/// # Example
///
/// ```
/// use restfile::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "restfile": {
///         "additionalMethods": ["PURGE"],
///         "maxNestingDepth": 4
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.max_nesting_depth, 4);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<EngineConfig, ConfigError> {
    let section = settings_json.and_then(|settings| settings.get(SETTINGS_KEY).cloned());

    let config = match section {
        Some(section) => match serde_json::from_value::<EngineConfig>(section) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {} settings: {}. Using defaults.", SETTINGS_KEY, e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };

    config.validate()?;
    Ok(config)
}
