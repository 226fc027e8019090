//! Scoped, versioned persistence of table state.
//!
//! A table's sorting, visibility, filters, column order and pagination are
//! stored as one JSON document per scope key. Storage is best-effort: read
//! failures fall back to defaults and write failures are logged.
//!
//! # Example
//!
//! ```ignore
//! use datatable_lib::preferences::{PreferencesConfig, PreferencesStore, SqliteBackend};
//!
//! let store = PreferencesStore::new(SqliteBackend::open("prefs.db").await?);
//! let config = PreferencesConfig::new("users");
//! let restored = store.load(&config, &["name", "age"], &known_ids).await;
//! ```

mod backend;
mod config;
mod key;
mod memory;
mod snapshot;
mod sqlite;
mod writer;

pub use backend::PreferencesBackend;
pub use config::*;
pub use key::*;
pub use memory::MemoryBackend;
pub use snapshot::*;
pub use sqlite::SqliteBackend;
pub use writer::PreferencesWriter;

use std::sync::Arc;

use crate::error::PreferencesError;

/// Typed preferences access over a document backend.
#[derive(Clone)]
pub struct PreferencesStore {
    backend: Arc<dyn PreferencesBackend>,
}

impl PreferencesStore {
    /// Create a new store with the given backend.
    pub fn new(backend: impl PreferencesBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a store sharing an existing backend.
    pub fn from_shared(backend: Arc<dyn PreferencesBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn PreferencesBackend> {
        &self.backend
    }

    /// Loads and sanitizes the stored state for `config`.
    ///
    /// `column_ids` are the data columns, `known_ids` the renderable ids
    /// (including the selection column when enabled). Missing, unreadable or
    /// undecodable documents yield `None`; a version mismatch is logged and
    /// the document is used anyway.
    pub async fn load(
        &self,
        config: &PreferencesConfig,
        column_ids: &[&str],
        known_ids: &[String],
    ) -> Option<PreferencesState> {
        let key = resolve_key(config);
        let payload = match self.try_load(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                log::debug!("[preferences] Nothing stored under '{}'", key);
                return None;
            }
            Err(err) => {
                log::warn!("[preferences] Failed to load '{}': {}", key, err);
                return None;
            }
        };

        if payload.version != config.version {
            log::info!(
                "[preferences] '{}' has version {} (expected {}); sanitizing",
                key,
                payload.version,
                config.version
            );
        }

        let mut state = payload.state;
        state.sanitize(column_ids, known_ids);
        if !config.persist_page_index {
            if let Some(pagination) = &mut state.pagination {
                pagination.page_index = None;
            }
        }
        log::debug!("[preferences] Loaded '{}'", key);
        Some(state)
    }

    /// Reads and decodes the document stored under `key`.
    pub async fn try_load(&self, key: &str) -> Result<Option<PreferencesPayload>, PreferencesError> {
        match self.backend.read(key).await? {
            Some(document) => Ok(Some(PreferencesPayload::from_json(&document)?)),
            None => Ok(None),
        }
    }

    /// Writes `state` immediately, logging instead of failing.
    pub async fn save(&self, config: &PreferencesConfig, state: &PreferencesState) {
        if let Err(err) = self.try_save(config, state).await {
            log::warn!("[preferences] Failed to save '{}': {}", resolve_key(config), err);
        }
    }

    /// Writes `state` immediately.
    pub async fn try_save(
        &self,
        config: &PreferencesConfig,
        state: &PreferencesState,
    ) -> Result<(), PreferencesError> {
        let payload = PreferencesPayload::new(config.version, state.clone());
        self.backend.write(&resolve_key(config), payload.to_json()?).await
    }

    /// Removes the stored document for `config`.
    pub async fn clear(&self, config: &PreferencesConfig) -> Result<(), PreferencesError> {
        self.backend.remove(&resolve_key(config)).await
    }

    /// Lists every stored preferences key.
    pub async fn stored_keys(&self) -> Result<Vec<String>, PreferencesError> {
        self.backend.keys(&format!("{KEY_PREFIX}:")).await
    }

    /// Creates a debounced writer for `config`.
    pub fn writer(&self, config: &PreferencesConfig) -> PreferencesWriter {
        PreferencesWriter::new(Arc::clone(&self.backend), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ColumnFilter, FilterOperator};
    use crate::sort::SortEntry;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_reconciles_against_new_column_set() {
        let store = PreferencesStore::new(MemoryBackend::new());
        let config = PreferencesConfig::new("people");

        let mut saved = PreferencesState {
            sorting: vec![SortEntry::asc("b")],
            column_order: strings(&["a", "b", "c"]),
            ..Default::default()
        };
        saved.column_filters.set("b", ColumnFilter::new(FilterOperator::Contains, "x"));
        store.try_save(&config, &saved).await.unwrap();

        let state = store
            .load(&config, &["a", "c", "d"], &strings(&["a", "c", "d"]))
            .await
            .unwrap();
        assert!(state.sorting.is_empty());
        assert!(state.column_filters.is_empty());
        assert_eq!(state.column_order, strings(&["a", "c"]));
    }

    #[tokio::test]
    async fn test_version_mismatch_still_loads() {
        let store = PreferencesStore::new(MemoryBackend::new());
        let old = PreferencesConfig::new("people").with_version(1);
        let saved = PreferencesState {
            sorting: vec![SortEntry::desc("a")],
            ..Default::default()
        };
        store.try_save(&old, &saved).await.unwrap();

        let new = old.clone().with_version(2);
        let state = store.load(&new, &["a"], &strings(&["a"])).await.unwrap();
        assert_eq!(state.sorting, vec![SortEntry::desc("a")]);
    }

    #[tokio::test]
    async fn test_page_index_dropped_unless_persisted() {
        let store = PreferencesStore::new(MemoryBackend::new());
        let config = PreferencesConfig::new("people");
        let saved = PreferencesState {
            pagination: Some(PersistedPagination {
                page_index: Some(4),
                page_size: Some(25),
            }),
            ..Default::default()
        };
        store.try_save(&config, &saved).await.unwrap();

        let state = store.load(&config, &[], &[]).await.unwrap();
        assert_eq!(state.pagination.unwrap().page_index, None);

        let config = config.with_persist_page_index(true);
        let state = store.load(&config, &[], &[]).await.unwrap();
        assert_eq!(state.pagination.unwrap().page_index, Some(4));
    }

    #[tokio::test]
    async fn test_garbage_and_missing_yield_none() {
        let backend = Arc::new(MemoryBackend::new());
        let store = PreferencesStore::from_shared(backend.clone());
        let config = PreferencesConfig::new("people");
        assert!(store.load(&config, &[], &[]).await.is_none());

        backend
            .write(&resolve_key(&config), "not json".to_string())
            .await
            .unwrap();
        assert!(store.load(&config, &[], &[]).await.is_none());

        store.clear(&config).await.unwrap();
        assert!(store.stored_keys().await.unwrap().is_empty());
    }
}
