//! SQLite preferences backend.
//!
//! One row per preference key holding the JSON document as text and the
//! time it was last saved. Reads go through a DashMap cache that writes keep
//! current.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::OptionalExtension;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;

use super::PreferencesBackend;
use crate::error::PreferencesError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS table_preferences (
    key      TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    saved_at TEXT NOT NULL
)";

/// SQLite-backed preference documents.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::preferences::{PreferencesStore, SqliteBackend};
///
/// let store = PreferencesStore::new(SqliteBackend::open("preferences.db").await?);
/// ```
pub struct SqliteBackend {
    client: Client,
    documents: DashMap<String, String>,
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path` in WAL mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;
        Self::with_client(client).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, PreferencesError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;
        Self::with_client(client).await
    }

    async fn with_client(client: Client) -> Result<Self, PreferencesError> {
        client.conn(|conn| conn.execute(SCHEMA, [])).await?;
        Ok(Self {
            client,
            documents: DashMap::new(),
        })
    }

    /// When the document under `key` was last written.
    pub async fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, PreferencesError> {
        let key = key.to_string();
        let stamp: Option<String> = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    "SELECT saved_at FROM table_preferences WHERE key = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        Ok(stamp
            .and_then(|stamp| DateTime::parse_from_rfc3339(&stamp).ok())
            .map(|stamp| stamp.with_timezone(&Utc)))
    }
}

/// Escapes `LIKE` wildcards so `prefix` matches literally under `ESCAPE '\'`.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl PreferencesBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        if let Some(document) = self.documents.get(key) {
            return Ok(Some(document.clone()));
        }

        let lookup = key.to_string();
        let document: Option<String> = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    "SELECT document FROM table_preferences WHERE key = ?1",
                    [&lookup],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        if let Some(document) = &document {
            self.documents.insert(key.to_string(), document.clone());
        }
        Ok(document)
    }

    async fn write(&self, key: &str, document: String) -> Result<(), PreferencesError> {
        let row = (key.to_string(), document.clone(), Utc::now().to_rfc3339());
        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO table_preferences (key, document, saved_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         document = excluded.document,
                         saved_at = excluded.saved_at",
                    rusqlite::params![row.0, row.1, row.2],
                )
            })
            .await?;

        self.documents.insert(key.to_string(), document);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        let lookup = key.to_string();
        self.client
            .conn(move |conn| conn.execute("DELETE FROM table_preferences WHERE key = ?1", [&lookup]))
            .await?;
        self.documents.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, PreferencesError> {
        let pattern = like_prefix(prefix);
        let keys = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM table_preferences WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
                )?;
                let keys = stmt.query_map([&pattern], |row| row.get(0))?;
                keys.collect::<Result<Vec<String>, _>>()
            })
            .await?;
        Ok(keys)
    }
}
