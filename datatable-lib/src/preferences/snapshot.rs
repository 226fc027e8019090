//! Persisted table state and its JSON payload.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PreferencesError;
use crate::filter::FilterSet;
use crate::sort::SortEntry;

/// Persisted pagination. Page index is present only when the table persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

/// The part of a table's state that survives a remount.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesState {
    pub sorting: Vec<SortEntry>,
    pub column_visibility: BTreeMap<String, bool>,
    pub column_filters: FilterSet,
    pub column_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PersistedPagination>,
}

impl PreferencesState {
    /// Drops every entry that references a column no longer present.
    ///
    /// `column_ids` are the defined data columns (sorting and filters can
    /// only target those); `known_ids` additionally holds the selection
    /// column when selection is enabled, and bounds visibility and order.
    pub fn sanitize(&mut self, column_ids: &[&str], known_ids: &[String]) {
        let columns: HashSet<&str> = column_ids.iter().copied().collect();
        let known: HashSet<&str> = known_ids.iter().map(String::as_str).collect();

        let mut sorted = HashSet::new();
        self.sorting
            .retain(|entry| columns.contains(entry.id.as_str()) && sorted.insert(entry.id.clone()));
        self.column_filters.retain(|id, _| columns.contains(id));
        self.column_visibility.retain(|id, _| known.contains(id.as_str()));

        let mut ordered = HashSet::new();
        self.column_order
            .retain(|id| known.contains(id.as_str()) && ordered.insert(id.clone()));

        if let Some(pagination) = &mut self.pagination {
            if pagination.page_size == Some(0) {
                pagination.page_size = None;
            }
            if pagination.page_index.is_none() && pagination.page_size.is_none() {
                self.pagination = None;
            }
        }
    }
}

/// Versioned storage document: `{version, state}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreferencesPayload {
    pub version: u32,
    pub state: PreferencesState,
}

impl PreferencesPayload {
    pub fn new(version: u32, state: PreferencesState) -> Self {
        Self { version, state }
    }

    pub fn to_json(&self) -> Result<String, PreferencesError> {
        serde_json::to_string(self).map_err(PreferencesError::Serialization)
    }

    /// Decodes a stored document leniently.
    ///
    /// Only non-JSON input is an error. Each field of `state` is decoded on
    /// its own; a malformed field falls back to its default and the rest of
    /// the document is kept.
    pub fn from_json(text: &str) -> Result<Self, PreferencesError> {
        let document: Value = serde_json::from_str(text).map_err(PreferencesError::Deserialization)?;

        let version = document
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or_default();
        let empty = Value::Null;
        let state = document.get("state").unwrap_or(&empty);

        Ok(Self {
            version,
            state: PreferencesState {
                sorting: lenient(state, "sorting"),
                column_visibility: lenient(state, "columnVisibility"),
                column_filters: lenient(state, "columnFilters"),
                column_order: lenient(state, "columnOrder"),
                pagination: lenient(state, "pagination"),
            },
        })
    }
}

fn lenient<T: DeserializeOwned + Default>(state: &Value, field: &str) -> T {
    match state.get(field) {
        None | Some(Value::Null) => T::default(),
        Some(raw) => T::deserialize(raw).unwrap_or_else(|err| {
            log::warn!("[preferences] Ignoring malformed '{}' field: {}", field, err);
            T::default()
        }),
    }
}
