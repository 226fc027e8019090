//! Table configuration

use std::collections::BTreeMap;

use crate::export::ExportOptions;
use crate::filter::{ColumnFilter, FilterSet};
use crate::pagination::PaginationOptions;
use crate::sort::SortEntry;

/// Caller defaults and feature toggles for a [`DataTable`](super::DataTable).
///
/// Persisted preferences take priority over the defaults here.
///
/// # Example
///
/// ```
/// use datatable_lib::TableOptions;
/// use datatable_lib::pagination::PaginationOptions;
/// use datatable_lib::sort::SortEntry;
///
/// let options = TableOptions::default()
///     .with_row_selection(true)
///     .with_pagination(PaginationOptions::client().with_page_size(25))
///     .with_default_sorting(vec![SortEntry::asc("name")])
///     .with_hidden_column("internal_id");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Adds the selection column and enables row selection.
    ///
    /// Default: false
    pub enable_row_selection: bool,

    /// A change of this key clears the selection.
    pub selection_reset_key: Option<String>,

    pub pagination: PaginationOptions,

    pub export: ExportOptions,

    pub default_sorting: Vec<SortEntry>,

    /// Column id to visibility. Unlisted columns are visible.
    pub default_visibility: BTreeMap<String, bool>,

    pub default_filters: FilterSet,

    /// Initial column order. Missing columns are appended in definition order.
    pub default_order: Vec<String>,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_selection(mut self, enabled: bool) -> Self {
        self.enable_row_selection = enabled;
        self
    }

    pub fn with_selection_reset_key(mut self, key: impl Into<String>) -> Self {
        self.selection_reset_key = Some(key.into());
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationOptions) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }

    pub fn with_default_sorting(mut self, sorting: Vec<SortEntry>) -> Self {
        self.default_sorting = sorting;
        self
    }

    /// Hides a column by default.
    pub fn with_hidden_column(mut self, column_id: impl Into<String>) -> Self {
        self.default_visibility.insert(column_id.into(), false);
        self
    }

    pub fn with_default_visibility(mut self, visibility: BTreeMap<String, bool>) -> Self {
        self.default_visibility = visibility;
        self
    }

    /// Adds a default filter. Inactive filters are ignored.
    pub fn with_default_filter(mut self, column_id: impl Into<String>, filter: ColumnFilter) -> Self {
        self.default_filters.set(column_id, filter);
        self
    }

    pub fn with_default_order(mut self, order: Vec<String>) -> Self {
        self.default_order = order;
        self
    }
}
