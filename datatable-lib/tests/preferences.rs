//! Preference persistence through the table: debounce, restore and scoping.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use datatable_lib::error::PreferencesError;
use datatable_lib::filter::{ColumnFilter, FilterOperator};
use datatable_lib::pagination::PaginationOptions;
use datatable_lib::preferences::{
    MemoryBackend, PreferencesBackend, PreferencesConfig, PreferencesPayload, PreferencesStore, Scope,
    SqliteBackend, resolve_key,
};
use datatable_lib::sort::SortEntry;
use datatable_lib::{ColumnDef, DataTable, DataTableBuilder, TableOptions};
use serde_json::{Value, json};

#[derive(Default)]
struct CountingBackend {
    writes: AtomicUsize,
    inner: MemoryBackend,
}

#[async_trait]
impl PreferencesBackend for CountingBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, document: String) -> Result<(), PreferencesError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, document).await
    }

    async fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        self.inner.remove(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, PreferencesError> {
        self.inner.keys(prefix).await
    }
}

/// A backend whose every operation fails.
struct BrokenBackend;

#[async_trait]
impl PreferencesBackend for BrokenBackend {
    async fn read(&self, _: &str) -> Result<Option<String>, PreferencesError> {
        Err(PreferencesError::Unavailable("offline".into()))
    }

    async fn write(&self, _: &str, _: String) -> Result<(), PreferencesError> {
        Err(PreferencesError::Unavailable("offline".into()))
    }

    async fn remove(&self, _: &str) -> Result<(), PreferencesError> {
        Err(PreferencesError::Unavailable("offline".into()))
    }

    async fn keys(&self, _: &str) -> Result<Vec<String>, PreferencesError> {
        Err(PreferencesError::Unavailable("offline".into()))
    }
}

fn columns() -> Vec<ColumnDef<Value>> {
    vec![
        ColumnDef::new("name", "Name"),
        ColumnDef::new("age", "Age"),
        ColumnDef::new("email", "Email"),
    ]
}

fn rows() -> Vec<Value> {
    vec![
        json!({"name": "Ada", "age": 36, "email": "ada@example.com"}),
        json!({"name": "Grace", "age": 45, "email": "grace@example.com"}),
    ]
}

async fn stored_payload(backend: &dyn PreferencesBackend, key: &str) -> PreferencesPayload {
    let document = backend.read(key).await.unwrap().unwrap();
    PreferencesPayload::from_json(&document).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_three_quick_changes_write_once_with_final_state() {
    let backend = Arc::new(CountingBackend::default());
    let store = PreferencesStore::from_shared(backend.clone());
    let config = PreferencesConfig::new("people");

    let mut table = DataTableBuilder::new(columns())
        .rows(rows())
        .with_preferences(&store, config.clone())
        .await
        .build();

    table.toggle_sort("age", false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    table.set_filter("name", ColumnFilter::new(FilterOperator::Contains, "a"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    table.set_column_visibility("email", false);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(backend.writes.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.writes.load(Ordering::SeqCst), 1);

    let payload = stored_payload(backend.as_ref(), &resolve_key(&config)).await;
    assert_eq!(payload.version, 1);
    assert_eq!(payload.state.sorting, vec![SortEntry::asc("age")]);
    assert!(payload.state.column_filters.get("name").is_some());
    assert_eq!(payload.state.column_visibility.get("email"), Some(&false));
}

#[tokio::test(start_paused = true)]
async fn test_unmount_before_window_loses_the_write() {
    let backend = Arc::new(CountingBackend::default());
    let store = PreferencesStore::from_shared(backend.clone());

    let mut table = DataTableBuilder::new(columns())
        .persist_to(&store, PreferencesConfig::new("people"))
        .build();
    table.toggle_sort("name", false);
    drop(table);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_restore_round_trip_through_sqlite() {
    let store = PreferencesStore::new(SqliteBackend::open_in_memory().await.unwrap());
    let config = PreferencesConfig::new("people")
        .with_scope(Scope::User)
        .with_user_key("u-1")
        .with_persist_page_index(true);
    let options = TableOptions::default()
        .with_row_selection(true)
        .with_pagination(PaginationOptions::client().with_page_size(1));

    let mut first = DataTableBuilder::new(columns())
        .rows(rows())
        .options(options.clone())
        .persist_to(&store, config.clone())
        .build();
    first.toggle_sort("age", false);
    first.toggle_sort("age", false);
    first.set_column_visibility("email", false);
    first.next_page();
    assert!(first.flush_preferences().await);

    let second = DataTableBuilder::new(columns())
        .rows(rows())
        .options(options)
        .with_preferences(&store, config)
        .await
        .build();
    assert_eq!(second.sorting(), [SortEntry::desc("age")]);
    assert!(!second.is_column_visible("email"));
    assert_eq!(second.pagination_state().page_index, 1);
    assert_eq!(second.column_order()[0], datatable_lib::SELECTION_COLUMN_ID);
}

#[tokio::test]
async fn test_persisted_page_size_beats_caller_default() {
    let store = PreferencesStore::new(MemoryBackend::new());
    let config = PreferencesConfig::new("people");

    let mut first = DataTableBuilder::new(columns())
        .options(TableOptions::default().with_pagination(PaginationOptions::client().with_page_size(10)))
        .persist_to(&store, config.clone())
        .build();
    first.set_page_size(50);
    first.flush_preferences().await;

    let mut second: DataTable<Value> = DataTableBuilder::new(columns())
        .options(TableOptions::default().with_pagination(PaginationOptions::client().with_page_size(25)))
        .with_preferences(&store, config)
        .await
        .build();
    assert_eq!(second.pagination_state().page_size, 50);
    assert_eq!(second.pagination_state().page_index, 0);
    assert!(!second.set_default_page_size(100));
    assert_eq!(second.pagination_state().page_size, 50);
}

#[tokio::test]
async fn test_storage_failures_fall_back_to_defaults() {
    let store = PreferencesStore::new(BrokenBackend);
    let mut table = DataTableBuilder::new(columns())
        .rows(rows())
        .options(TableOptions::default().with_default_sorting(vec![SortEntry::desc("name")]))
        .with_preferences(&store, PreferencesConfig::new("people"))
        .await
        .build();

    assert_eq!(table.sorting(), [SortEntry::desc("name")]);
    table.toggle_sort("age", false);
    assert!(!table.flush_preferences().await);
}

#[tokio::test]
async fn test_scopes_are_isolated() {
    let store = PreferencesStore::new(MemoryBackend::new());
    let user = PreferencesConfig::new("people").with_scope(Scope::User).with_user_key("u-1");
    let org = PreferencesConfig::new("people").with_scope(Scope::Org).with_org_key("o-1");

    let mut table = DataTableBuilder::new(columns()).persist_to(&store, user.clone()).build();
    table.toggle_sort("name", false);
    table.flush_preferences().await;

    let ids = ["name", "age", "email"];
    let known: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    assert!(store.load(&user, &ids, &known).await.is_some());
    assert!(store.load(&org, &ids, &known).await.is_none());
    assert_eq!(store.stored_keys().await.unwrap(), vec!["datatable:user:u-1:people"]);
}
