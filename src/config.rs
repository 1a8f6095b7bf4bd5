//! Configuration loading via `ortho-config`.
//!
//! The only tunable the core consumes is the container runtime binary;
//! it is resolved here once and handed to [`crate::task::Task::new`],
//! never read ambiently afterwards.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Container runtime settings merged from defaults, configuration files,
/// and `CARINA_`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "CARINA")]
pub struct DockerConfig {
    /// Path to the `docker` executable, or any drop-in replacement
    /// resolvable on the execution `PATH`.
    #[ortho_config(default = "docker".to_owned())]
    pub docker_bin: String,
}

impl DockerConfig {
    /// Ensures configuration values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when `docker_bin` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.docker_bin.trim().is_empty() {
            return Err(ConfigError::MissingField(String::from(
                "missing container runtime binary: set CARINA_DOCKER_BIN or add docker_bin to the configuration file",
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments.
    /// Values still merge defaults, configuration files, and environment
    /// variables, and are validated before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails, or
    /// [`ConfigError::MissingField`] when validation rejects the result.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        let config = Self::load_from_iter([std::ffi::OsString::from("carina")])
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
