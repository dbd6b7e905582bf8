//! Error types for deargen-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file `{}`", path.display())]
    #[diagnostic(code(deargen::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse TOML config: {0}")]
    #[diagnostic(code(deargen::config::parse))]
    ParseToml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("config validation error: {0}")]
    #[diagnostic(code(deargen::config::invalid))]
    Validation(String),
}
