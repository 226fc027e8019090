//! Filter predicate evaluation.

use std::cmp::Ordering;

use super::{ColumnFilter, FilterOperator, FilterSet};
use crate::column::ColumnRegistry;
use crate::model::{CellValue, TableRow};

/// Evaluates one column's filter against a row.
///
/// The value comes from the column's filter accessor, else its display
/// accessor, else the raw row value. An unknown column, a column with
/// filtering disabled, or an inactive filter all mean "no filter".
pub fn evaluate<T: TableRow>(
    registry: &ColumnRegistry<T>,
    row: &T,
    column_id: &str,
    filter: &ColumnFilter,
) -> bool {
    match registry.get(column_id) {
        Some(column) if column.def().enable_filtering => {
            matches_value(&column.filter_value(row), filter)
        }
        _ => true,
    }
}

/// Returns `true` if the row passes every active filter in the set.
pub fn matches_all<T: TableRow>(registry: &ColumnRegistry<T>, row: &T, filters: &FilterSet) -> bool {
    filters
        .iter()
        .all(|(column_id, filter)| evaluate(registry, row, column_id, filter))
}

/// Evaluates a filter against an already-resolved cell value.
///
/// Never fails: a type mismatch simply evaluates to `false`.
pub fn matches_value(value: &CellValue, filter: &ColumnFilter) -> bool {
    if !filter.is_active() {
        return true;
    }

    let needle = filter.value.trim();
    match filter.operator {
        FilterOperator::IsNull => value.is_null(),
        FilterOperator::IsNotNull => !value.is_null(),
        FilterOperator::IsEmpty => value.is_empty(),
        FilterOperator::IsNotEmpty => !value.is_empty(),
        FilterOperator::Equals => equals(value, needle),
        FilterOperator::NotEquals => !equals(value, needle),
        FilterOperator::GreaterThan => compare_numeric(value, needle) == Some(Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => matches!(
            compare_numeric(value, needle),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::LessThan => compare_numeric(value, needle) == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => matches!(
            compare_numeric(value, needle),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOperator::Contains => normalized(value).contains(&needle.to_lowercase()),
        FilterOperator::NotContains => !normalized(value).contains(&needle.to_lowercase()),
        FilterOperator::StartsWith => normalized(value).starts_with(&needle.to_lowercase()),
        FilterOperator::EndsWith => normalized(value).ends_with(&needle.to_lowercase()),
    }
}

fn normalized(value: &CellValue) -> String {
    value.to_string().to_lowercase()
}

/// Numeric equality when both sides read as numbers, else case-insensitive
/// comparison of the stringified forms.
fn equals(value: &CellValue, needle: &str) -> bool {
    if let (Some(a), Some(b)) = (value.as_number(), CellValue::from(needle).as_number()) {
        return a == b;
    }
    value.to_string().trim().to_lowercase() == needle.to_lowercase()
}

fn compare_numeric(value: &CellValue, needle: &str) -> Option<Ordering> {
    let a = value.as_number()?;
    let b = CellValue::from(needle).as_number()?;
    a.partial_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use serde_json::json;

    fn check(value: impl Into<CellValue>, op: FilterOperator, needle: &str) -> bool {
        matches_value(&value.into(), &ColumnFilter::new(op, needle))
    }

    #[test]
    fn test_null_and_empty_operators() {
        use FilterOperator::*;
        let cases: [(CellValue, bool, bool); 5] = [
            // (value, is_null, is_empty)
            (CellValue::Null, true, true),
            (json!({}).field("missing"), true, true),
            (CellValue::from(""), false, true),
            (CellValue::from("  "), false, true),
            (CellValue::from("x"), false, false),
        ];
        for (value, is_null, is_empty) in cases {
            assert_eq!(check(value.clone(), IsNull, ""), is_null, "is_null {value:?}");
            assert_eq!(check(value.clone(), IsNotNull, ""), !is_null, "is_not_null {value:?}");
            assert_eq!(check(value.clone(), IsEmpty, ""), is_empty, "is_empty {value:?}");
            assert_eq!(check(value.clone(), IsNotEmpty, ""), !is_empty, "is_not_empty {value:?}");
        }
    }

    #[test]
    fn test_numeric_operators_coerce() {
        use FilterOperator::*;
        assert!(check(31, GreaterThan, "30"));
        assert!(check("31", GreaterThan, " 30 "));
        assert!(check(30, GreaterThanOrEqual, "30"));
        assert!(!check(30, LessThan, "30"));
        assert!(check(30, LessThanOrEqual, "30.0"));
        assert!(check("2024-02-01", GreaterThan, "2024-01-31"));
        assert!(check(true, GreaterThan, "0"));
    }

    #[test]
    fn test_numeric_operators_never_match_on_mismatch() {
        use FilterOperator::*;
        assert!(!check("abc", GreaterThan, "1"));
        assert!(!check(5, LessThan, "abc"));
        assert!(!check(CellValue::Null, LessThan, "10"));
        assert!(!check(CellValue::Null, GreaterThanOrEqual, "0"));
    }

    #[test]
    fn test_equality() {
        use FilterOperator::*;
        assert!(check(30, Equals, "30.0"));
        assert!(check("030", Equals, "30"));
        assert!(check("Active", Equals, "active"));
        assert!(!check("Active", Equals, "act"));
        assert!(check("Active", NotEquals, "inactive"));
        assert!(check(CellValue::Null, NotEquals, "x"));
    }

    #[test]
    fn test_string_operators_are_case_insensitive() {
        use FilterOperator::*;
        assert!(check("Ada Lovelace", Contains, "LOVE"));
        assert!(check("Ada Lovelace", StartsWith, "ada"));
        assert!(check("Ada Lovelace", EndsWith, "LACE"));
        assert!(check("Ada Lovelace", NotContains, "hopper"));
        assert!(!check(CellValue::Null, Contains, "a"));
        assert!(check(CellValue::Null, NotContains, "a"));
        assert!(check(1200, Contains, "20"));
    }

    #[test]
    fn test_inactive_filter_passes_everything() {
        assert!(check("anything", FilterOperator::Equals, "   "));
    }

    #[test]
    fn test_evaluate_uses_filter_accessor() {
        let registry = ColumnRegistry::new(vec![
            ColumnDef::<serde_json::Value>::new("status", "Status")
                .filter_accessor(|row| row.field("status_code")),
            ColumnDef::new("secret", "Secret").filterable(false),
        ]);
        let row = json!({"status": "Approved", "status_code": 2, "secret": "x"});
        let filter = ColumnFilter::new(FilterOperator::Equals, "2");
        assert!(evaluate(&registry, &row, "status", &filter));
        let contains = ColumnFilter::new(FilterOperator::Contains, "approved");
        assert!(!evaluate(&registry, &row, "status", &contains));
        // Disabled and unknown columns are "no filter".
        let never = ColumnFilter::new(FilterOperator::Equals, "nope");
        assert!(evaluate(&registry, &row, "secret", &never));
        assert!(evaluate(&registry, &row, "ghost", &never));
    }
}
