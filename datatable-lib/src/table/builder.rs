//! Table builder: merges caller defaults with restored preferences.

use std::sync::Arc;

use super::{DataTable, Persistence, RowIdFn, SelectionCallback, TableOptions};
use crate::column::{ColumnDef, ColumnRegistry};
use crate::model::TableRow;
use crate::order;
use crate::pagination::PaginationController;
use crate::preferences::{PreferencesConfig, PreferencesState, PreferencesStore};
use crate::selection::SelectionManager;

/// Builder for [`DataTable`].
///
/// # Example
///
/// ```
/// use datatable_lib::{ColumnDef, DataTableBuilder, TableOptions};
/// use serde_json::json;
///
/// let table = DataTableBuilder::new(vec![
///     ColumnDef::new("name", "Name"),
///     ColumnDef::new("age", "Age"),
/// ])
/// .rows(vec![json!({"id": "a", "name": "Ada", "age": 36})])
/// .row_id(|row, _| row["id"].as_str().unwrap_or_default().to_string())
/// .options(TableOptions::default().with_row_selection(true))
/// .build();
///
/// assert_eq!(table.visible_column_ids(), vec!["__select", "name", "age"]);
/// ```
pub struct DataTableBuilder<T> {
    columns: Vec<ColumnDef<T>>,
    rows: Vec<T>,
    options: TableOptions,
    row_id: Option<RowIdFn<T>>,
    on_selection_change: Option<SelectionCallback<T>>,
    restored: Option<PreferencesState>,
    persistence: Option<(PreferencesStore, PreferencesConfig)>,
}

impl<T: TableRow> DataTableBuilder<T> {
    pub fn new(columns: Vec<ColumnDef<T>>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            options: TableOptions::default(),
            row_id: None,
            on_selection_change: None,
            restored: None,
            persistence: None,
        }
    }

    pub fn rows(mut self, rows: Vec<T>) -> Self {
        self.rows = rows;
        self
    }

    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Stable row identity. Defaults to the row's index.
    pub fn row_id(mut self, f: impl Fn(&T, usize) -> String + Send + Sync + 'static) -> Self {
        self.row_id = Some(Arc::new(f));
        self
    }

    /// Called with the materialized selected rows after every selection change.
    pub fn on_selection_change(mut self, f: impl Fn(&[T]) + Send + Sync + 'static) -> Self {
        self.on_selection_change = Some(Arc::new(f));
        self
    }

    /// Seeds the table from a previously loaded preferences state.
    pub fn restore(mut self, state: Option<PreferencesState>) -> Self {
        self.restored = state;
        self
    }

    /// Persists preference-affecting changes through a debounced writer.
    pub fn persist_to(mut self, store: &PreferencesStore, config: PreferencesConfig) -> Self {
        self.persistence = Some((store.clone(), config));
        self
    }

    /// Loads the stored state for `config` and persists future changes to it.
    ///
    /// Call after [`options`](Self::options): the selection toggle decides
    /// whether the selection column is a known id.
    pub async fn with_preferences(self, store: &PreferencesStore, config: PreferencesConfig) -> Self {
        let registry = ColumnRegistry::new(self.columns.clone());
        let known_ids = registry.known_ids(self.options.enable_row_selection);
        let restored = store.load(&config, &registry.ids(), &known_ids).await;
        self.restore(restored).persist_to(store, config)
    }

    pub fn build(self) -> DataTable<T> {
        let registry = ColumnRegistry::new(self.columns);
        let options = self.options;
        let selection_enabled = options.enable_row_selection;
        let known_ids = registry.known_ids(selection_enabled);

        let restored = self.restored.map(|mut state| {
            state.sanitize(&registry.ids(), &known_ids);
            state
        });

        let (sorting, filters, order) = match &restored {
            Some(state) => (
                state.sorting.clone(),
                state.column_filters.clone(),
                if state.column_order.is_empty() {
                    options.default_order.clone()
                } else {
                    state.column_order.clone()
                },
            ),
            None => (
                options.default_sorting.clone(),
                options.default_filters.clone(),
                options.default_order.clone(),
            ),
        };

        let mut visibility = options.default_visibility.clone();
        if let Some(state) = &restored {
            visibility.extend(state.column_visibility.clone());
        }

        let pagination = PaginationController::new(
            options.pagination.clone(),
            restored.as_ref().and_then(|state| state.pagination.as_ref()),
        );

        let mut selection = SelectionManager::new(selection_enabled);
        selection.set_reset_key(options.selection_reset_key.clone());

        let persistence = self.persistence.map(|(store, config)| Persistence {
            writer: store.writer(&config),
            persist_page_index: config.persist_page_index,
        });

        let row_id = self
            .row_id
            .unwrap_or_else(|| Arc::new(|_: &T, index: usize| index.to_string()));

        let mut table = DataTable {
            registry,
            rows: Vec::new(),
            row_ids: Vec::new(),
            row_id,
            sorting,
            filters,
            visibility,
            order: order::normalize(&order, &known_ids, selection_enabled),
            pagination,
            selection,
            export: options.export,
            loading: false,
            on_selection_change: self.on_selection_change,
            persistence,
        };
        table.prune_state();
        table.set_rows(self.rows);
        table
    }
}
