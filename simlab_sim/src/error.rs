//! Harness errors.

use simlab_env::ConfigError;
use thiserror::Error;

/// Errors from building, running or exporting scenarios.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Results were requested before the scenario ran
    #[error("scenario '{0}' has not been run yet")]
    NotRun(String),

    /// Command-line flags that cannot be combined
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no scenarios added")]
    NoScenarios,

    /// A parallel scenario task panicked or was cancelled
    #[error("scenario task '{name}' failed: {reason}")]
    Task { name: String, reason: String },
}
