//! Column definitions and the column registry.
//!
//! A [`ColumnDef`] is the caller's declaration of how to read, sort, filter,
//! render and export one logical field. The [`ColumnRegistry`] resolves every
//! definition once into plain `row -> value` closures and indexes them by id.
//!
//! # Example
//!
//! ```
//! use datatable_lib::column::{ColumnDef, ColumnRegistry};
//!
//! let columns: Vec<ColumnDef<serde_json::Value>> = vec![
//!     ColumnDef::new("name", "Name"),
//!     ColumnDef::new("salary", "Salary").export_label("Salary (EUR)"),
//!     ColumnDef::new("notes", "Notes").exportable(false),
//! ];
//! let registry = ColumnRegistry::new(columns);
//! assert_eq!(registry.ids(), vec!["name", "salary", "notes"]);
//! ```

mod registry;

pub use registry::*;

use std::fmt;
use std::sync::Arc;

use crate::model::{CellValue, TableRow};

/// Id of the pseudo-column that carries row-selection checkboxes.
pub const SELECTION_COLUMN_ID: &str = "__select";

/// Resolved `row -> value` closure.
pub type ValueFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// Cell template: formats a row's display value for rendering.
pub type CellFn<T> = Arc<dyn Fn(&T, &CellValue) -> String + Send + Sync>;

/// How a column reads its value from a row.
pub enum Accessor<T> {
    /// Read the row's raw value under a field key.
    Field(String),
    /// Compute the value from the whole row.
    Function(ValueFn<T>),
    /// Read the row's raw value under the column id.
    Raw,
}

impl<T: TableRow> Accessor<T> {
    /// Creates a field-key accessor.
    pub fn field(key: impl Into<String>) -> Self {
        Accessor::Field(key.into())
    }

    /// Creates a function accessor.
    pub fn function(f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        Accessor::Function(Arc::new(f))
    }

    /// Resolves the accessor into a single closure for `column_id`.
    pub fn resolve(&self, column_id: &str) -> ValueFn<T> {
        match self {
            Accessor::Field(key) => {
                let key = key.clone();
                Arc::new(move |row: &T| row.field(&key))
            }
            Accessor::Function(f) => Arc::clone(f),
            Accessor::Raw => {
                let key = column_id.to_string();
                Arc::new(move |row: &T| row.field(&key))
            }
        }
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Field(key) => Accessor::Field(key.clone()),
            Accessor::Function(f) => Accessor::Function(Arc::clone(f)),
            Accessor::Raw => Accessor::Raw,
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(key) => f.debug_tuple("Field").field(key).finish(),
            Accessor::Function(_) => f.write_str("Function(..)"),
            Accessor::Raw => f.write_str("Raw"),
        }
    }
}

/// Column header: a plain label or a template producing the header text.
#[derive(Clone)]
pub enum Header {
    /// Static label. Also used as the CSV header.
    Label(String),
    /// Rendered header. Has no string form for export.
    Template(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Header {
    /// Returns the static label, if this header has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            Header::Label(label) => Some(label),
            Header::Template(_) => None,
        }
    }

    /// Produces the header text for display.
    pub fn render(&self) -> String {
        match self {
            Header::Label(label) => label.clone(),
            Header::Template(template) => template(),
        }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Label(label) => f.debug_tuple("Label").field(label).finish(),
            Header::Template(_) => f.write_str("Template(..)"),
        }
    }
}

/// Column definition.
///
/// Toggles default to enabled. Without an accessor the column reads the row's
/// raw value at its id.
pub struct ColumnDef<T> {
    /// Unique column id.
    pub id: String,
    /// Header label or template.
    pub header: Header,
    /// Display accessor.
    pub accessor: Accessor<T>,
    /// Cell template used when rendering.
    pub cell: Option<CellFn<T>>,
    /// Overrides the value seen by the filter engine.
    pub filter_accessor: Option<ValueFn<T>>,
    /// Overrides the value seen by the sort engine.
    pub sort_accessor: Option<ValueFn<T>>,
    /// Overrides the value written to CSV.
    pub export_accessor: Option<ValueFn<T>>,
    /// Overrides the CSV header.
    pub export_label: Option<String>,
    pub enable_sorting: bool,
    pub enable_filtering: bool,
    pub enable_hiding: bool,
    pub enable_export: bool,
    /// Style hint for the header cell.
    pub header_class_name: Option<String>,
    /// Style hint for body cells.
    pub cell_class_name: Option<String>,
}

impl<T: TableRow> ColumnDef<T> {
    /// Creates a column with a label header and raw-value access.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: Header::Label(header.into()),
            accessor: Accessor::Raw,
            cell: None,
            filter_accessor: None,
            sort_accessor: None,
            export_accessor: None,
            export_label: None,
            enable_sorting: true,
            enable_filtering: true,
            enable_hiding: true,
            enable_export: true,
            header_class_name: None,
            cell_class_name: None,
        }
    }

    /// Replaces the header with a template.
    pub fn header_template(mut self, template: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.header = Header::Template(Arc::new(template));
        self
    }

    /// Reads the value from a field key other than the column id.
    pub fn field(mut self, key: impl Into<String>) -> Self {
        self.accessor = Accessor::field(key);
        self
    }

    /// Computes the value from the row.
    pub fn value(mut self, f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        self.accessor = Accessor::function(f);
        self
    }

    /// Sets the display accessor.
    pub fn accessor(mut self, accessor: Accessor<T>) -> Self {
        self.accessor = accessor;
        self
    }

    /// Sets the cell template.
    pub fn cell(mut self, f: impl Fn(&T, &CellValue) -> String + Send + Sync + 'static) -> Self {
        self.cell = Some(Arc::new(f));
        self
    }

    /// Sets the filter accessor.
    pub fn filter_accessor(mut self, f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        self.filter_accessor = Some(Arc::new(f));
        self
    }

    /// Sets the sort accessor.
    pub fn sort_accessor(mut self, f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        self.sort_accessor = Some(Arc::new(f));
        self
    }

    /// Sets the export accessor.
    pub fn export_accessor(mut self, f: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        self.export_accessor = Some(Arc::new(f));
        self
    }

    /// Sets the CSV header label.
    pub fn export_label(mut self, label: impl Into<String>) -> Self {
        self.export_label = Some(label.into());
        self
    }

    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sorting = enabled;
        self
    }

    pub fn filterable(mut self, enabled: bool) -> Self {
        self.enable_filtering = enabled;
        self
    }

    pub fn hideable(mut self, enabled: bool) -> Self {
        self.enable_hiding = enabled;
        self
    }

    pub fn exportable(mut self, enabled: bool) -> Self {
        self.enable_export = enabled;
        self
    }

    /// Sets the header style hint.
    pub fn header_class(mut self, class: impl Into<String>) -> Self {
        self.header_class_name = Some(class.into());
        self
    }

    /// Sets the body cell style hint.
    pub fn cell_class(mut self, class: impl Into<String>) -> Self {
        self.cell_class_name = Some(class.into());
        self
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            accessor: self.accessor.clone(),
            cell: self.cell.clone(),
            filter_accessor: self.filter_accessor.clone(),
            sort_accessor: self.sort_accessor.clone(),
            export_accessor: self.export_accessor.clone(),
            export_label: self.export_label.clone(),
            enable_sorting: self.enable_sorting,
            enable_filtering: self.enable_filtering,
            enable_hiding: self.enable_hiding,
            enable_export: self.enable_export,
            header_class_name: self.header_class_name.clone(),
            cell_class_name: self.cell_class_name.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("accessor", &self.accessor)
            .field("enable_sorting", &self.enable_sorting)
            .field("enable_filtering", &self.enable_filtering)
            .field("enable_hiding", &self.enable_hiding)
            .field("enable_export", &self.enable_export)
            .finish_non_exhaustive()
    }
}
