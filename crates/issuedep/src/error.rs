//! Error types for issuedep operations.

use crate::domain::IssueId;
use std::io;
use thiserror::Error;

/// The error type for issuedep operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A remote fetch for an issue failed.
    #[error("Failed to fetch {id}: {message}")]
    Fetch {
        /// Issue the fetch was made for
        id: IssueId,
        /// Reason reported by the source
        message: String,
    },

    /// Issue not found.
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// Export could not be produced.
    #[error("Export error: {0}")]
    Export(String),
}

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file is not valid YAML.
    #[error("Invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A settings value was rejected.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Settings key
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// No root issue was given.
    #[error("No root issue given")]
    MissingRoot,
}

/// A specialized Result type for issuedep operations.
pub type Result<T> = std::result::Result<T, Error>;
