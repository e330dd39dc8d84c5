//! Configuration management for finfo
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `FINFO__<section>__<key>`
//!
//! Examples:
//! - `FINFO__DISPATCH__RETURN_EVERYTHING=true`
//! - `FINFO__LOGGING__FILTER=finfo=debug`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/finfo.toml`.
//! This can be overridden using the `FINFO_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, DispatchConfig, ExtractorsConfig, LoggingConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or names
    /// unknown extractors or invalid media types.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = sources::load()?;
        validation::validate(&config)?;
        config.dispatch.normalize_media_types();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        config.dispatch.normalize_media_types();
        Ok(config)
    }
}
