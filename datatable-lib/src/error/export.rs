//! CSV export errors

/// Errors that can occur while producing or writing a CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The encoded output was not valid UTF-8.
    #[error("encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
