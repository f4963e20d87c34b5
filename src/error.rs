//! Error types for the Promptshare service.

use thiserror::Error;

/// Main error type for Promptshare operations.
#[derive(Error, Debug)]
pub enum PromptshareError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Layered configuration loading errors
    #[error("Configuration source error: {0}")]
    Settings(#[from] config::ConfigError),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Promptshare operations.
pub type Result<T> = std::result::Result<T, PromptshareError>;
