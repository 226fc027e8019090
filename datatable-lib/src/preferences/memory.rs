//! In-memory preferences backend.

use async_trait::async_trait;
use dashmap::DashMap;

use super::PreferencesBackend;
use crate::error::PreferencesError;

/// Preference documents held in a concurrent map for the life of the process.
///
/// # Example
///
/// ```
/// use datatable_lib::preferences::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// assert!(backend.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl PreferencesBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        Ok(self.documents.get(key).map(|document| document.clone()))
    }

    async fn write(&self, key: &str, document: String) -> Result<(), PreferencesError> {
        self.documents.insert(key.to_string(), document);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        self.documents.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, PreferencesError> {
        let mut keys: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let backend = MemoryBackend::new();
        assert!(backend.read("k").await.unwrap().is_none());

        backend.write("k", "v1".to_string()).await.unwrap();
        backend.write("k", "v2".to_string()).await.unwrap();
        assert_eq!(backend.read("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(backend.len(), 1);

        backend.remove("k").await.unwrap();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_keys_by_prefix() {
        let backend = MemoryBackend::new();
        for key in ["datatable:user:1:a", "datatable:global:a", "datatable:user:2:a", "datatable:user:1_:a"] {
            backend.write(key, "{}".to_string()).await.unwrap();
        }

        let keys = backend.keys("datatable:user:1").await.unwrap();
        assert_eq!(keys, vec!["datatable:user:1:a", "datatable:user:1_:a"]);
        assert!(backend.keys("datatable:user:_").await.unwrap().is_empty());
    }
}
