//! CLI errors.

use canopy_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the `canopy` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command needs `--path`.
    #[error("storage part path required for {command}")]
    MissingPath {
        /// Command that was invoked.
        command: &'static str,
    },

    /// The storage part could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The storage part is malformed or inconsistent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Unsupported `--format` value.
    #[error("unknown output format: {0} (expected text or json)")]
    UnknownFormat(String),

    /// JSON rendering failed.
    #[error("failed to render json: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage part does not pass verification.
    #[error("verification failed: {message}")]
    VerificationFailed {
        /// First breach found.
        message: String,
    },
}
