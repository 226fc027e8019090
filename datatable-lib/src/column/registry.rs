//! Column registry: lookup-by-id over resolved column definitions.

use std::collections::HashMap;

use super::{ColumnDef, SELECTION_COLUMN_ID, ValueFn};
use crate::model::{CellValue, TableRow};

/// A column definition with its accessors resolved into closures.
///
/// Resolution happens once, when the registry is built, so per-cell reads
/// never branch on the accessor kind.
pub struct ResolvedColumn<T> {
    def: ColumnDef<T>,
    display: ValueFn<T>,
    filter: ValueFn<T>,
    sort: ValueFn<T>,
    export: ValueFn<T>,
}

impl<T: TableRow> ResolvedColumn<T> {
    fn resolve(def: ColumnDef<T>) -> Self {
        let display = def.accessor.resolve(&def.id);
        let filter = def.filter_accessor.clone().unwrap_or_else(|| display.clone());
        let sort = def.sort_accessor.clone().unwrap_or_else(|| display.clone());
        let export = def.export_accessor.clone().unwrap_or_else(|| display.clone());
        Self {
            def,
            display,
            filter,
            sort,
            export,
        }
    }

    /// Column id.
    pub fn id(&self) -> &str {
        &self.def.id
    }

    /// The original definition.
    pub fn def(&self) -> &ColumnDef<T> {
        &self.def
    }

    /// Value shown in the cell.
    pub fn display_value(&self, row: &T) -> CellValue {
        (self.display)(row)
    }

    /// Value seen by the filter engine.
    pub fn filter_value(&self, row: &T) -> CellValue {
        (self.filter)(row)
    }

    /// Value seen by the sort engine.
    pub fn sort_value(&self, row: &T) -> CellValue {
        (self.sort)(row)
    }

    /// Value written to CSV.
    pub fn export_value(&self, row: &T) -> CellValue {
        (self.export)(row)
    }

    /// Cell text, through the cell template when one is set.
    pub fn render_cell(&self, row: &T) -> String {
        let value = self.display_value(row);
        match &self.def.cell {
            Some(template) => template(row, &value),
            None => value.to_string(),
        }
    }

    /// CSV header: export label, else the static header label, else the id.
    pub fn export_header(&self) -> String {
        self.def
            .export_label
            .clone()
            .or_else(|| self.def.header.label().map(str::to_string))
            .unwrap_or_else(|| self.def.id.clone())
    }
}

/// Column definitions normalized into lookup-by-id form.
pub struct ColumnRegistry<T> {
    columns: Vec<ResolvedColumn<T>>,
    index: HashMap<String, usize>,
}

impl<T: TableRow> ColumnRegistry<T> {
    /// Builds a registry. A repeated id keeps its first definition.
    pub fn new(defs: Vec<ColumnDef<T>>) -> Self {
        let mut columns = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());

        for def in defs {
            if def.id == SELECTION_COLUMN_ID || index.contains_key(&def.id) {
                log::warn!("[columns] Ignoring duplicate or reserved column id {:?}", def.id);
                continue;
            }
            index.insert(def.id.clone(), columns.len());
            columns.push(ResolvedColumn::resolve(def));
        }

        Self { columns, index }
    }

    /// Looks up a column by id.
    pub fn get(&self, id: &str) -> Option<&ResolvedColumn<T>> {
        self.index.get(id).map(|&i| &self.columns[i])
    }

    /// Returns `true` if a column with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Column ids in definition order.
    pub fn ids(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.id()).collect()
    }

    /// Ids the table state may reference: the selection column first (when
    /// enabled), then every defined column.
    pub fn known_ids(&self, selection_enabled: bool) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.columns.len() + 1);
        if selection_enabled {
            ids.push(SELECTION_COLUMN_ID.to_string());
        }
        ids.extend(self.columns.iter().map(|c| c.id().to_string()));
        ids
    }

    /// Iterates columns in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedColumn<T>> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Row = serde_json::Value;

    #[test]
    fn test_raw_accessor_reads_column_id() {
        let registry = ColumnRegistry::<Row>::new(vec![ColumnDef::new("name", "Name")]);
        let row = json!({"name": "Ada"});
        let column = registry.get("name").unwrap();
        assert_eq!(column.display_value(&row), CellValue::from("Ada"));
        assert_eq!(column.sort_value(&row), CellValue::from("Ada"));
        assert_eq!(column.export_value(&row), CellValue::from("Ada"));
    }

    #[test]
    fn test_specialized_accessors_win() {
        let column = ColumnDef::<Row>::new("full", "Full name")
            .value(|row| {
                CellValue::from(format!("{} {}", row.field("first"), row.field("last")))
            })
            .sort_accessor(|row| row.field("last"))
            .export_accessor(|_| CellValue::from("redacted"));
        let registry = ColumnRegistry::new(vec![column]);
        let row = json!({"first": "Grace", "last": "Hopper"});
        let column = registry.get("full").unwrap();
        assert_eq!(column.display_value(&row), CellValue::from("Grace Hopper"));
        assert_eq!(column.filter_value(&row), CellValue::from("Grace Hopper"));
        assert_eq!(column.sort_value(&row), CellValue::from("Hopper"));
        assert_eq!(column.export_value(&row), CellValue::from("redacted"));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let registry = ColumnRegistry::<Row>::new(vec![
            ColumnDef::new("a", "First"),
            ColumnDef::new("a", "Second"),
            ColumnDef::new(SELECTION_COLUMN_ID, "Nope"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().export_header(), "First");
    }

    #[test]
    fn test_export_header_fallbacks() {
        let registry = ColumnRegistry::<Row>::new(vec![
            ColumnDef::new("a", "Alpha").export_label("A!"),
            ColumnDef::new("b", "Beta"),
            ColumnDef::new("c", "ignored").header_template(|| "Gamma".to_string()),
        ]);
        assert_eq!(registry.get("a").unwrap().export_header(), "A!");
        assert_eq!(registry.get("b").unwrap().export_header(), "Beta");
        assert_eq!(registry.get("c").unwrap().export_header(), "c");
        assert_eq!(registry.get("c").unwrap().def().header.render(), "Gamma");
    }

    #[test]
    fn test_known_ids_pin_selection_first() {
        let registry = ColumnRegistry::<Row>::new(vec![
            ColumnDef::new("a", "A"),
            ColumnDef::new("b", "B"),
        ]);
        assert_eq!(registry.known_ids(true), vec![SELECTION_COLUMN_ID, "a", "b"]);
        assert_eq!(registry.known_ids(false), vec!["a", "b"]);
    }
}
