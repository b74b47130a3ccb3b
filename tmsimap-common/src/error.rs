//! Error types for tmsimap

use thiserror::Error;

/// Failures while loading configuration or setting up sockets.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket and file I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config file.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}
