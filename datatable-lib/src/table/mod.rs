//! The table orchestrator.
//!
//! [`DataTable`] owns every piece of table state and keeps them consistent:
//! rows flow through the filter engine, then the sort engine, then the
//! pagination controller; selection, column order and export work on the
//! result. Every preference-affecting change is handed to the debounced
//! writer when persistence is configured.

mod builder;
mod options;

pub use builder::DataTableBuilder;
pub use options::TableOptions;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::column::{ColumnDef, ColumnRegistry, SELECTION_COLUMN_ID};
use crate::error::ExportError;
use crate::export::{self, ExportOptions};
use crate::filter::{self, ColumnFilter, FilterSet};
use crate::model::TableRow;
use crate::order::{self, ReorderCommand};
use crate::pagination::{PageInfo, PaginationController, PaginationMode, PaginationState};
use crate::preferences::{PersistedPagination, PreferencesState, PreferencesWriter};
use crate::selection::{HeaderState, SelectionManager};
use crate::sort::{self, SortEntry};

/// Computes a stable id for a row from the row and its index.
pub type RowIdFn<T> = Arc<dyn Fn(&T, usize) -> String + Send + Sync>;

/// Receives the materialized selected rows.
pub type SelectionCallback<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

struct Persistence {
    writer: PreferencesWriter,
    persist_page_index: bool,
}

/// Filtered, sorted and paginated view of the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowModel {
    /// Positions into the row set, filtered and sorted.
    pub indices: Vec<usize>,
    /// The page over `indices`.
    pub page: PageInfo,
}

impl RowModel {
    /// Row positions on the visible page.
    pub fn page_indices(&self) -> &[usize] {
        self.page.slice(&self.indices)
    }
}

/// Tabular data engine over rows of type `T`.
pub struct DataTable<T> {
    registry: ColumnRegistry<T>,
    rows: Vec<T>,
    row_ids: Vec<String>,
    row_id: RowIdFn<T>,
    sorting: Vec<SortEntry>,
    filters: FilterSet,
    visibility: BTreeMap<String, bool>,
    order: Vec<String>,
    pagination: PaginationController,
    selection: SelectionManager,
    export: ExportOptions,
    loading: bool,
    on_selection_change: Option<SelectionCallback<T>>,
    persistence: Option<Persistence>,
}

impl<T: TableRow> DataTable<T> {
    /// Starts a builder for the given columns.
    pub fn builder(columns: Vec<ColumnDef<T>>) -> DataTableBuilder<T> {
        DataTableBuilder::new(columns)
    }

    // =========================================================================
    // Data
    // =========================================================================

    pub fn registry(&self) -> &ColumnRegistry<T> {
        &self.registry
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Replaces the row set. Selection is kept by id.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.row_ids = rows
            .iter()
            .enumerate()
            .map(|(index, row)| (self.row_id)(row, index))
            .collect();
        self.rows = rows;
    }

    /// Id of the row at `index` in the row set.
    pub fn row_id_at(&self, index: usize) -> Option<&str> {
        self.row_ids.get(index).map(String::as_str)
    }

    /// Updates the totals reported by the server (server pagination only).
    pub fn set_server_totals(&mut self, total_rows: usize, page_count: Option<usize>) {
        self.pagination.set_server_totals(total_rows, page_count);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Swaps the column definitions and prunes state that referenced
    /// removed columns.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef<T>>) {
        self.registry = ColumnRegistry::new(columns);
        if self.prune_state() {
            self.persist();
        }
    }

    /// Drops sort/filter/visibility entries for unknown or locked columns and
    /// reconciles the column order. Returns `true` if anything changed.
    fn prune_state(&mut self) -> bool {
        let selection_enabled = self.selection.is_enabled();
        let known_ids = self.registry.known_ids(selection_enabled);
        let registry = &self.registry;

        let sorting_len = self.sorting.len();
        self.sorting.retain(|entry| {
            registry
                .get(&entry.id)
                .is_some_and(|column| column.def().enable_sorting)
        });
        let mut changed = self.sorting.len() != sorting_len;

        changed |= self.filters.retain(|id, _| {
            registry
                .get(id)
                .is_some_and(|column| column.def().enable_filtering)
        });

        // Only hideable data columns carry a visibility entry.
        let visibility_len = self.visibility.len();
        self.visibility.retain(|id, _| {
            registry
                .get(id)
                .is_some_and(|column| column.def().enable_hiding)
        });
        changed |= self.visibility.len() != visibility_len;

        let order = order::normalize(&self.order, &known_ids, selection_enabled);
        changed |= order != self.order;
        self.order = order;

        if changed {
            log::debug!("[table] Pruned state against {} columns", self.registry.len());
        }
        changed
    }

    // =========================================================================
    // Row model
    // =========================================================================

    /// Filters, sorts and paginates the rows.
    pub fn row_model(&self) -> RowModel {
        let mut indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| filter::matches_all(&self.registry, &self.rows[i], &self.filters))
            .collect();
        sort::sort_indices(&self.registry, &self.rows, &mut indices, &self.sorting);

        let page = self
            .pagination
            .resolve(indices.len(), self.filters.has_active());
        RowModel { indices, page }
    }

    /// Rows after filtering and sorting, across all pages.
    pub fn processed_rows(&self) -> Vec<&T> {
        self.row_model().indices.iter().map(|&i| &self.rows[i]).collect()
    }

    /// Rows on the visible page.
    pub fn page_rows(&self) -> Vec<&T> {
        self.row_model()
            .page_indices()
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Ids of the rows on the visible page, in display order.
    pub fn page_row_ids(&self) -> Vec<String> {
        self.row_model()
            .page_indices()
            .iter()
            .map(|&i| self.row_ids[i].clone())
            .collect()
    }

    pub fn page_info(&self) -> PageInfo {
        self.row_model().page
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Column order, selection column first when enabled.
    pub fn column_order(&self) -> &[String] {
        &self.order
    }

    pub fn column_visibility(&self) -> &BTreeMap<String, bool> {
        &self.visibility
    }

    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.visibility.get(column_id).copied().unwrap_or(true)
    }

    /// Ids of the rendered columns, in display order.
    pub fn visible_column_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.is_column_visible(id))
            .cloned()
            .collect()
    }

    /// Visible columns that offer a filter, in display order.
    pub fn filter_menu_columns(&self) -> Vec<String> {
        self.visible_column_ids()
            .into_iter()
            .filter(|id| {
                self.registry
                    .get(id)
                    .is_some_and(|column| column.def().enable_filtering)
            })
            .collect()
    }

    /// Shows or hides a column. Columns with hiding disabled, the selection
    /// column and unknown ids are left alone.
    ///
    /// Returns `true` if the visibility changed.
    pub fn set_column_visibility(&mut self, column_id: &str, visible: bool) -> bool {
        let Some(column) = self.registry.get(column_id) else {
            return false;
        };
        if !column.def().enable_hiding || self.is_column_visible(column_id) == visible {
            return false;
        }
        self.visibility.insert(column_id.to_string(), visible);
        self.persist();
        true
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) -> bool {
        let visible = self.is_column_visible(column_id);
        self.set_column_visibility(column_id, !visible)
    }

    /// Applies a drag-and-drop reorder. Sort, filter and visibility state
    /// are untouched.
    pub fn reorder_column(&mut self, command: &ReorderCommand) -> bool {
        let changed = order::reorder(&mut self.order, command);
        if changed {
            self.persist();
        }
        changed
    }

    /// Header text for a column. The selection column has none.
    pub fn header_text(&self, column_id: &str) -> Option<String> {
        self.registry.get(column_id).map(|column| column.def().header.render())
    }

    /// Rendered cell text for a row. The selection column renders as a
    /// checkbox marker.
    pub fn render_cell(&self, row_index: usize, column_id: &str) -> Option<String> {
        if column_id == SELECTION_COLUMN_ID {
            let id = self.row_ids.get(row_index)?;
            let marker = if self.selection.is_selected(id) { "[x]" } else { "[ ]" };
            return Some(marker.to_string());
        }
        let row = self.rows.get(row_index)?;
        self.registry.get(column_id).map(|column| column.render_cell(row))
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn sorting(&self) -> &[SortEntry] {
        &self.sorting
    }

    /// Cycles a sortable column through asc, desc and unsorted.
    pub fn toggle_sort(&mut self, column_id: &str, multi: bool) -> bool {
        let sortable = self
            .registry
            .get(column_id)
            .is_some_and(|column| column.def().enable_sorting);
        if !sortable {
            return false;
        }
        let changed = sort::toggle_sort(&mut self.sorting, column_id, multi);
        if changed {
            self.persist();
        }
        changed
    }

    /// Replaces the sort state. Entries for unsortable or unknown columns
    /// and repeated ids are dropped.
    pub fn set_sorting(&mut self, sorting: Vec<SortEntry>) -> bool {
        let mut seen = Vec::with_capacity(sorting.len());
        let sorting: Vec<SortEntry> = sorting
            .into_iter()
            .filter(|entry| {
                let ok = !seen.contains(&entry.id)
                    && self
                        .registry
                        .get(&entry.id)
                        .is_some_and(|column| column.def().enable_sorting);
                seen.push(entry.id.clone());
                ok
            })
            .collect();
        if sorting == self.sorting {
            return false;
        }
        self.sorting = sorting;
        self.persist();
        true
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Sets a column's filter; an inactive filter clears it.
    ///
    /// In client pagination a change sends the view back to the first page.
    pub fn set_filter(&mut self, column_id: &str, filter: ColumnFilter) -> bool {
        let filterable = self
            .registry
            .get(column_id)
            .is_some_and(|column| column.def().enable_filtering);
        if !filterable || !self.filters.set(column_id, filter) {
            return false;
        }
        self.after_filter_change();
        true
    }

    pub fn clear_filter(&mut self, column_id: &str) -> bool {
        if !self.filters.remove(column_id) {
            return false;
        }
        self.after_filter_change();
        true
    }

    pub fn clear_filters(&mut self) -> bool {
        if !self.filters.clear() {
            return false;
        }
        self.after_filter_change();
        true
    }

    fn after_filter_change(&mut self) {
        if self.pagination.mode() == PaginationMode::Client {
            let page_count = self.page_info().page_count;
            self.pagination.set_page_index(0, page_count);
        }
        self.persist();
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    pub fn pagination_state(&self) -> PaginationState {
        self.pagination.state()
    }

    pub fn pagination_mode(&self) -> PaginationMode {
        self.pagination.mode()
    }

    /// Goes to a page, clamped to the available pages.
    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        let page_count = self.page_info().page_count;
        let changed = self.pagination.set_page_index(page_index, page_count);
        self.after_pagination(changed)
    }

    pub fn next_page(&mut self) -> bool {
        let page = self.page_info();
        if !page.can_next {
            return false;
        }
        let changed = self.pagination.set_page_index(page.page_index + 1, page.page_count);
        self.after_pagination(changed)
    }

    pub fn previous_page(&mut self) -> bool {
        let page = self.page_info();
        if !page.can_previous {
            return false;
        }
        let changed = self.pagination.set_page_index(page.page_index - 1, page.page_count);
        self.after_pagination(changed)
    }

    /// Changes the page size; the view returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let changed = self.pagination.set_page_size(page_size);
        self.after_pagination(changed)
    }

    /// Pushes the caller-owned state back (controlled pagination).
    pub fn set_pagination_state(&mut self, state: PaginationState) -> bool {
        let changed = self.pagination.set_controlled_state(state);
        self.after_pagination(changed)
    }

    /// Applies a changed caller default page size (engine-owned pagination).
    pub fn set_default_page_size(&mut self, page_size: usize) -> bool {
        let changed = self.pagination.set_default_page_size(page_size);
        self.after_pagination(changed)
    }

    fn after_pagination(&self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn is_selection_enabled(&self) -> bool {
        self.selection.is_enabled()
    }

    pub fn is_row_selected(&self, row_id: &str) -> bool {
        self.selection.is_selected(row_id)
    }

    /// Selected row ids, sorted.
    pub fn selected_row_ids(&self) -> Vec<String> {
        self.selection.selected()
    }

    /// Selected rows in row-set order.
    pub fn selected_rows(&self) -> Vec<T> {
        self.selection.selected_rows(
            self.row_ids
                .iter()
                .map(String::as_str)
                .zip(self.rows.iter()),
        )
    }

    /// Header checkbox state over the visible page.
    pub fn header_state(&self) -> HeaderState {
        self.selection.header_state(&self.page_row_ids())
    }

    pub fn toggle_row(&mut self, row_id: &str) -> bool {
        let (added, removed) = self.selection.toggle(row_id);
        self.after_selection(!added.is_empty() || !removed.is_empty())
    }

    /// Header checkbox: selects the visible page, or deselects it when it is
    /// already fully selected.
    pub fn toggle_all_page_rows(&mut self) -> bool {
        let page_ids = self.page_row_ids();
        let (added, removed) = self.selection.toggle_all(&page_ids);
        self.after_selection(!added.is_empty() || !removed.is_empty())
    }

    /// Shift-click: selects every visible row between the last toggled row
    /// and `row_id`.
    pub fn range_select(&mut self, row_id: &str) -> bool {
        let page_ids = self.page_row_ids();
        let added = self.selection.range_select(row_id, &page_ids);
        self.after_selection(!added.is_empty())
    }

    pub fn clear_selection(&mut self) -> bool {
        let removed = self.selection.clear();
        self.after_selection(!removed.is_empty())
    }

    /// Updates the selection reset key; a different key clears the selection.
    pub fn set_selection_reset_key(&mut self, key: Option<String>) -> bool {
        let changed = self.selection.set_reset_key(key);
        self.after_selection(changed)
    }

    /// Enables or disables row selection. Disabling clears it and removes
    /// the selection column.
    pub fn set_row_selection_enabled(&mut self, enabled: bool) {
        if self.selection.is_enabled() == enabled {
            return;
        }
        let cleared = self.selection.set_enabled(enabled);
        self.after_selection(cleared);
        if self.prune_state() {
            self.persist();
        }
    }

    fn after_selection(&self, changed: bool) -> bool {
        if changed {
            if let Some(callback) = &self.on_selection_change {
                callback(&self.selected_rows());
            }
        }
        changed
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn export_options(&self) -> &ExportOptions {
        &self.export
    }

    /// CSV of the filtered, sorted rows over the visible exportable columns.
    ///
    /// Client pagination exports every page; server pagination exports the
    /// rows currently held. `None` when there is nothing to export.
    pub fn to_csv(&self) -> Result<Option<String>, ExportError> {
        export::to_csv(&self.registry, self.processed_rows(), &self.visible_column_ids(), &self.export)
    }

    /// Writes [`to_csv`](Self::to_csv) into `dir` under the configured
    /// file name.
    pub fn write_csv(&self, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        export::write_file(&self.registry, self.processed_rows(), &self.visible_column_ids(), &self.export, dir)
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// The state that would be persisted right now.
    pub fn preferences_state(&self) -> PreferencesState {
        let persist_page_index = self
            .persistence
            .as_ref()
            .is_some_and(|p| p.persist_page_index);
        let pagination = self.pagination.is_enabled().then(|| {
            let state = self.pagination.state();
            PersistedPagination {
                page_index: persist_page_index.then_some(state.page_index),
                page_size: Some(state.page_size),
            }
        });

        PreferencesState {
            sorting: self.sorting.clone(),
            column_visibility: self.visibility.clone(),
            column_filters: self.filters.clone(),
            column_order: self.order.clone(),
            pagination,
        }
    }

    fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.writer.schedule(self.preferences_state());
        }
    }

    /// Writes a pending debounced snapshot now.
    pub async fn flush_preferences(&self) -> bool {
        match &self.persistence {
            Some(persistence) => persistence.writer.flush().await,
            None => false,
        }
    }
}

impl<T> fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("rows", &self.rows.len())
            .field("sorting", &self.sorting)
            .field("filters", &self.filters)
            .field("order", &self.order)
            .field("pagination", &self.pagination)
            .field("selected", &self.selection.len())
            .finish_non_exhaustive()
    }
}
