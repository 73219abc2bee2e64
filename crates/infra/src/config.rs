//! Process configuration, built once at start-up and passed down.

use serde::{Deserialize, Serialize};

use storefront_cart::DEFAULT_MAX_ITEM_QUANTITY;
use storefront_observability::LogFormat;

pub const ENV_MAX_ITEM_QUANTITY: &str = "STOREFRONT_MAX_ITEM_QUANTITY";
pub const ENV_LOG_FORMAT: &str = "STOREFRONT_LOG_FORMAT";

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Upper bound for a single cart line's quantity.
    pub max_item_quantity: u32,
    pub log_format: LogFormat,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            max_item_quantity: DEFAULT_MAX_ITEM_QUANTITY,
            log_format: LogFormat::Json,
        }
    }
}

impl StorefrontConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Invalid values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_ITEM_QUANTITY) {
            match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => config.max_item_quantity = value,
                _ => tracing::warn!(
                    key = ENV_MAX_ITEM_QUANTITY,
                    value = %raw,
                    fallback = config.max_item_quantity,
                    "invalid config value, using default"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            match raw.parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(error) => tracing::warn!(
                    key = ENV_LOG_FORMAT,
                    error = %error,
                    fallback = config.log_format.as_str(),
                    "invalid config value, using default"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = StorefrontConfig::from_lookup(lookup(&[]));
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.max_item_quantity, 999);
    }

    #[test]
    fn reads_valid_values() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            (ENV_MAX_ITEM_QUANTITY, " 50 "),
            (ENV_LOG_FORMAT, "pretty"),
        ]));
        assert_eq!(config.max_item_quantity, 50);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            (ENV_MAX_ITEM_QUANTITY, "0"),
            (ENV_LOG_FORMAT, "xml"),
        ]));
        assert_eq!(config, StorefrontConfig::default());
    }
}
