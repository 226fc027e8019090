//! CLI error type.

use datatable_lib::error::{ExportError, PreferencesError};

/// Errors that end a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// The input parsed but is not an array of objects.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),
}
