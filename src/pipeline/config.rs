//! Pipeline configuration for the orchestrator.
//!
//! This module provides configuration options for the analysis pipeline:
//! where the artifact store lives, the generation parameters, and the force
//! flag that bypasses freshness checks.

use std::path::PathBuf;
use thiserror::Error;

/// Default RNG seed for dataset generation.
pub const DEFAULT_SEED: u64 = 42;

/// Default number of contracts to generate.
pub const DEFAULT_CONTRACT_COUNT: usize = 500;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory the artifact store lives under.
    pub project_root: PathBuf,
    /// RNG seed for dataset generation.
    pub seed: u64,
    /// Number of contracts to generate.
    pub contract_count: usize,
    /// When set, stages run even when their outputs are fresh.
    pub force: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            seed: DEFAULT_SEED,
            contract_count: DEFAULT_CONTRACT_COUNT,
            force: false,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CFA_PROJECT_ROOT`: Artifact store root (default: `.`)
    /// - `CFA_SEED`: Generation seed (default: 42)
    /// - `CFA_CONTRACT_COUNT`: Contracts to generate (default: 500)
    /// - `CFA_FORCE`: Bypass freshness checks (default: false)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CFA_PROJECT_ROOT") {
            config.project_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CFA_SEED") {
            config.seed = parse_env_value(&val, "CFA_SEED")?;
        }

        if let Ok(val) = std::env::var("CFA_CONTRACT_COUNT") {
            config.contract_count = parse_env_value(&val, "CFA_CONTRACT_COUNT")?;
        }

        if let Ok(val) = std::env::var("CFA_FORCE") {
            config.force = parse_env_bool(&val, "CFA_FORCE")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "project_root cannot be empty".to_string(),
            ));
        }

        if self.contract_count == 0 {
            return Err(ConfigError::ValidationFailed(
                "contract_count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Builder method to set the generation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the contract count.
    pub fn with_contract_count(mut self, count: usize) -> Self {
        self.contract_count = count;
        self
    }

    /// Builder method to bypass freshness checks.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(config.seed, 42);
        assert_eq!(config.contract_count, 500);
        assert!(!config.force);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_project_root("/tmp/workspace")
            .with_seed(7)
            .with_contract_count(100)
            .with_force(true);

        assert_eq!(config.project_root, PathBuf::from("/tmp/workspace"));
        assert_eq!(config.seed, 7);
        assert_eq!(config.contract_count, 100);
        assert!(config.force);
    }

    #[test]
    fn test_validation_valid_config() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_contract_count() {
        let config = PipelineConfig::default().with_contract_count(0);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("contract_count"));
    }

    #[test]
    fn test_validation_empty_project_root() {
        let config = PipelineConfig::default().with_project_root("");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("project_root"));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("1", "test").unwrap());
        assert!(parse_env_bool("yes", "test").unwrap());
        assert!(parse_env_bool("on", "test").unwrap());
        assert!(parse_env_bool("TRUE", "test").unwrap());

        assert!(!parse_env_bool("false", "test").unwrap());
        assert!(!parse_env_bool("0", "test").unwrap());
        assert!(!parse_env_bool("no", "test").unwrap());
        assert!(!parse_env_bool("off", "test").unwrap());

        assert!(parse_env_bool("invalid", "test").is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "KEY".to_string(),
            message: "bad value".to_string(),
        };
        assert!(err.to_string().contains("KEY"));
        assert!(err.to_string().contains("bad value"));

        let err = ConfigError::ValidationFailed("test failure".to_string());
        assert!(err.to_string().contains("test failure"));
    }
}
