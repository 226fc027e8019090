//! Storage seam for preference documents.

use async_trait::async_trait;

use crate::error::PreferencesError;

/// Stores serialized preference documents under resolved keys.
///
/// Backends see opaque JSON text; encoding and lenient decoding live in
/// [`PreferencesPayload`](super::PreferencesPayload).
#[async_trait]
pub trait PreferencesBackend: Send + Sync {
    /// The document stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, PreferencesError>;

    /// Replaces the document under `key`.
    async fn write(&self, key: &str, document: String) -> Result<(), PreferencesError>;

    async fn remove(&self, key: &str) -> Result<(), PreferencesError>;

    /// Stored keys starting with `prefix`, sorted. The prefix is literal text,
    /// not a pattern.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, PreferencesError>;
}
