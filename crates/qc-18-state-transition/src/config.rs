//! Transition configuration from TOML files and environment variables.

use crate::domain::gas::GasSchedule;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable pointing at a TOML config file.
pub const CONFIG_PATH_ENV: &str = "QC_TRANSITION_CONFIG";

/// Environment variable overriding `privacy_protocol`.
pub const PRIVACY_PROTOCOL_ENV: &str = "QC_PRIVACY_PROTOCOL";

/// Configuration shared by every transition of a node.
///
/// ```toml
/// privacy_protocol = true
///
/// [gas_schedule]
/// tx_gas = 21000
/// tx_gas_contract_creation = 53000
/// tx_data_non_zero_gas = 68
/// tx_data_zero_gas = 4
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Intrinsic gas constants.
    pub gas_schedule: GasSchedule,

    /// Resolve private payloads. When disabled every message is public.
    pub privacy_protocol: bool,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            gas_schedule: GasSchedule::default(),
            privacy_protocol: true,
        }
    }
}

impl TransitionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the content is not valid TOML for this structure.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_TRANSITION_CONFIG`: TOML file to load (default: built-in defaults)
    /// - `QC_PRIVACY_PROTOCOL`: `true`/`false`/`1`/`0`, overrides the file
    ///
    /// # Errors
    ///
    /// Returns error if the file named by `QC_TRANSITION_CONFIG` cannot be
    /// loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load(path)?,
            _ => Self::default(),
        };

        if let Ok(value) = env::var(PRIVACY_PROTOCOL_ENV) {
            config.privacy_protocol = value.eq_ignore_ascii_case("true") || value == "1";
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gas::costs;

    #[test]
    fn test_default_config() {
        let config = TransitionConfig::default();
        assert!(config.privacy_protocol);
        assert_eq!(config.gas_schedule.tx_gas, costs::TX_GAS);
    }

    #[test]
    fn test_parse_partial() {
        let config = TransitionConfig::parse(
            r"
            privacy_protocol = false

            [gas_schedule]
            tx_data_non_zero_gas = 16
            ",
        )
        .unwrap();
        assert!(!config.privacy_protocol);
        assert_eq!(config.gas_schedule.tx_data_non_zero_gas, 16);
        assert_eq!(config.gas_schedule.tx_data_zero_gas, costs::TX_DATA_ZERO_GAS);
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(
            TransitionConfig::parse("").unwrap(),
            TransitionConfig::default()
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            TransitionConfig::parse("privacy_protocol = \"maybe\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transition.toml");
        fs::write(&path, "[gas_schedule]\ntx_gas = 25000\n").unwrap();

        let config = TransitionConfig::load(&path).unwrap();
        assert_eq!(config.gas_schedule.tx_gas, 25_000);
        assert!(config.privacy_protocol);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TransitionConfig::load("/nonexistent/transition.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
