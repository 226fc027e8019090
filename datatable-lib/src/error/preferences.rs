//! Preferences persistence errors

/// Errors raised by a preferences backend or while encoding a payload.
///
/// The table itself never surfaces these: load failures fall back to
/// defaults and save failures are logged.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    /// SQLite storage failure.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// The payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    /// The stored document is not JSON.
    #[error("deserialization error: {0}")]
    Deserialization(serde_json::Error),

    /// The backend rejected the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
