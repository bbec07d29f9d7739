//! Error types for sqlcell.
//!
//! The SQL core (normalize, segment, classify, organize, emit) never fails.
//! These errors belong to the pipeline around it: configuration, the
//! external CLI, the completion API and the filesystem.

use thiserror::Error;

/// The main error type for sqlcell pipeline operations.
#[derive(Debug, Error)]
pub enum SqlcellError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` failed: {message}")]
    Tool { command: String, message: String },

    /// The external command binary is not installed or not on PATH.
    #[error("Command not found: '{0}'. Install and configure it first")]
    ToolNotFound(String),

    /// The language-model completion call failed.
    #[error("Completion error: {0}")]
    Completion(String),

    /// Nothing could be uploaded.
    #[error("Upload error: {0}")]
    Upload(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SqlcellError {
    /// Create a tool failure for the given command line.
    pub fn tool(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for sqlcell operations.
pub type SqlcellResult<T> = Result<T, SqlcellError>;
