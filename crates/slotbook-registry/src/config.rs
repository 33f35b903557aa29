use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Default number of deltas retained for undo.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Registry settings.
///
/// ```toml
/// history_limit = 1000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum deltas kept in the log. Older entries are dropped and can no
    /// longer be undone. `0` keeps no history at all.
    pub history_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl RegistryConfig {
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> RegistryResult<String> {
        toml::to_string(self).map_err(|e| RegistryError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        assert_eq!(RegistryConfig::default().history_limit, 500);
    }

    #[test]
    fn parse_toml() {
        let c = RegistryConfig::from_toml_str("history_limit = 20").unwrap();
        assert_eq!(c.history_limit, 20);
    }

    #[test]
    fn missing_fields_take_defaults() {
        assert_eq!(
            RegistryConfig::from_toml_str("").unwrap(),
            RegistryConfig::default()
        );
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            RegistryConfig::from_toml_str("history_limit = \"lots\""),
            Err(RegistryError::Config(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let c = RegistryConfig { history_limit: 7 };
        let text = c.to_toml_string().unwrap();
        assert_eq!(RegistryConfig::from_toml_str(&text).unwrap(), c);
    }
}
