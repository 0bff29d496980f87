//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Validation found problems in the manifest or data files
    #[error("Validation failed: {count} problem(s) found")]
    Validation {
        /// Number of problems
        count: usize,
    },

    /// Scaffolding would overwrite an existing file
    #[error("Refusing to overwrite existing file: {path}")]
    WouldOverwrite {
        /// The existing file
        path: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Volante library error
    #[error("Volante error: {0}")]
    Volante(#[from] volante::VolanteError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
