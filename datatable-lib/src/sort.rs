//! Sort engine: value normalization and stable multi-key ordering.
//!
//! Cell values are normalized into [`SortKey`]s before comparison: numeric
//! text becomes a number, ISO-date-like text becomes epoch milliseconds,
//! booleans become 0/1. Nulls always sort last, whatever the direction.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnRegistry;
use crate::model::{CellValue, TableRow, parse_datetime, parse_number};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One sort key: column id and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub id: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Normalized, comparable form of a cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Null; always ordered last.
    Missing,
    Number(f64),
    /// Lowercased text, then the original text as a tie-breaker.
    Text(String, String),
}

impl SortKey {
    /// Normalizes a cell value.
    pub fn from_value(value: &CellValue) -> Self {
        match value {
            CellValue::Null => SortKey::Missing,
            CellValue::Bool(b) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            CellValue::Number(n) if n.is_nan() => SortKey::Missing,
            CellValue::Number(n) => SortKey::Number(*n),
            CellValue::DateTime(dt) => SortKey::Number(dt.timestamp_millis() as f64),
            CellValue::Text(s) => {
                if let Some(n) = parse_number(s) {
                    SortKey::Number(n)
                } else if let Some(dt) = parse_datetime(s) {
                    SortKey::Number(dt.timestamp_millis() as f64)
                } else {
                    SortKey::Text(s.to_lowercase(), s.clone())
                }
            }
        }
    }

    /// Ascending comparison of two present keys. Numbers order before text.
    fn cmp_present(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text(..)) => Ordering::Less,
            (SortKey::Text(..), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a, raw_a), SortKey::Text(b, raw_b)) => a.cmp(b).then_with(|| raw_a.cmp(raw_b)),
            _ => Ordering::Equal,
        }
    }
}

/// Compares two keys in a direction. Missing keys go last in both directions.
pub fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, _) => Ordering::Greater,
        (_, SortKey::Missing) => Ordering::Less,
        _ => {
            let ordering = a.cmp_present(b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Compares two rows on one column.
///
/// The value comes from the column's sort accessor, else its display
/// accessor, else the raw row value. Unknown columns compare equal.
pub fn compare<T: TableRow>(
    registry: &ColumnRegistry<T>,
    a: &T,
    b: &T,
    column_id: &str,
    direction: SortDirection,
) -> Ordering {
    let Some(column) = registry.get(column_id) else {
        return Ordering::Equal;
    };
    compare_keys(
        &SortKey::from_value(&column.sort_value(a)),
        &SortKey::from_value(&column.sort_value(b)),
        direction,
    )
}

/// Stably orders `indices` (positions into `rows`) by the sort entries.
///
/// The first entry wins; later entries break ties; full ties keep the
/// incoming order. Entries for unknown or unsortable columns are skipped.
pub fn sort_indices<T: TableRow>(
    registry: &ColumnRegistry<T>,
    rows: &[T],
    indices: &mut [usize],
    sorting: &[SortEntry],
) {
    let columns: Vec<_> = sorting
        .iter()
        .filter_map(|entry| {
            registry
                .get(&entry.id)
                .filter(|column| column.def().enable_sorting)
                .map(|column| (column, entry.direction))
        })
        .collect();
    if columns.is_empty() || indices.len() < 2 {
        return;
    }

    // Normalize once per row instead of once per comparison.
    let keys: Vec<Vec<SortKey>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|(column, _)| SortKey::from_value(&column.sort_value(row)))
                .collect()
        })
        .collect();

    indices.sort_by(|&a, &b| {
        columns
            .iter()
            .enumerate()
            .map(|(k, (_, direction))| compare_keys(&keys[a][k], &keys[b][k], *direction))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Cycles a column through ascending, descending and unsorted.
///
/// Without `multi`, the column replaces any other sort keys. Returns `true`
/// if the sort state changed.
pub fn toggle_sort(sorting: &mut Vec<SortEntry>, column_id: &str, multi: bool) -> bool {
    let existing = sorting.iter().position(|entry| entry.id == column_id);
    let next = match existing.map(|i| sorting[i].direction) {
        None => Some(SortDirection::Asc),
        Some(SortDirection::Asc) => Some(SortDirection::Desc),
        Some(SortDirection::Desc) => None,
    };

    if !multi {
        sorting.clear();
        if let Some(direction) = next {
            sorting.push(SortEntry {
                id: column_id.to_string(),
                direction,
            });
        }
        return true;
    }

    match (existing, next) {
        (Some(i), Some(direction)) => sorting[i].direction = direction,
        (Some(i), None) => {
            sorting.remove(i);
        }
        (None, Some(direction)) => sorting.push(SortEntry {
            id: column_id.to_string(),
            direction,
        }),
        (None, None) => return false,
    }
    true
}
