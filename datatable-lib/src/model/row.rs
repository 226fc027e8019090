//! TableRow trait for rows displayed in a DataTable.

use std::collections::HashMap;

use super::CellValue;

/// Trait for records that can be displayed as table rows.
///
/// Rows stay opaque to the engine. The only thing it needs from a row is the
/// raw value stored under a field key, used whenever a column has no accessor
/// of its own (or uses [`Accessor::Field`](crate::column::Accessor::Field)).
///
/// # Example
///
/// ```
/// use datatable_lib::model::{CellValue, TableRow};
///
/// #[derive(Clone)]
/// struct Employee {
///     name: String,
///     salary: f64,
/// }
///
/// impl TableRow for Employee {
///     fn field(&self, key: &str) -> CellValue {
///         match key {
///             "name" => self.name.clone().into(),
///             "salary" => self.salary.into(),
///             _ => CellValue::Null,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// Raw stored value for a field key; `CellValue::Null` when absent.
    fn field(&self, key: &str) -> CellValue;
}

impl TableRow for serde_json::Value {
    fn field(&self, key: &str) -> CellValue {
        self.get(key).map(CellValue::from).unwrap_or_default()
    }
}

impl TableRow for serde_json::Map<String, serde_json::Value> {
    fn field(&self, key: &str) -> CellValue {
        self.get(key).map(CellValue::from).unwrap_or_default()
    }
}

impl TableRow for HashMap<String, CellValue> {
    fn field(&self, key: &str) -> CellValue {
        self.get(key).cloned().unwrap_or_default()
    }
}
