use mdxsync_core::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the collection hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// The record or collection lacks a field the hooks rely on.
    #[error("Missing field: {0}")]
    MissingField(String),
    /// The record is not a JSON object.
    #[error("Record must be a JSON object")]
    NotAnObject,
    /// The editor config names a feature no transformer provides.
    #[error(transparent)]
    UnknownFeature(#[from] RegistryError),
    /// Reading or writing a markup file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Moving a finished temp file into place failed.
    #[error("Failed to persist {path}: {source}")]
    Persist {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: tempfile::PersistError,
    },
    /// YAML collection config could not be read.
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// JSON collection config could not be read.
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for hook operations.
pub type Result<T> = std::result::Result<T, HookError>;
