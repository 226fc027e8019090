//! Per-column filter state and evaluation.
//!
//! Each column carries at most one [`ColumnFilter`] (operator + value). The
//! [`FilterSet`] only ever stores *active* filters: setting an inactive one
//! removes the entry, so "no local filter" is an emptiness check.
//!
//! # Example
//!
//! ```
//! use datatable_lib::filter::{ColumnFilter, FilterOperator, FilterSet};
//!
//! let mut filters = FilterSet::default();
//! filters.set("name", ColumnFilter::new(FilterOperator::Contains, "ada"));
//! assert!(filters.has_active());
//!
//! // Clearing the value deactivates (and drops) the filter.
//! filters.set("name", ColumnFilter::new(FilterOperator::Contains, "  "));
//! assert!(!filters.has_active());
//! ```

mod eval;

pub use eval::*;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    StartsWith,
    Contains,
    NotContains,
    EndsWith,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    /// Every operator, in menu order.
    pub const ALL: [FilterOperator; 14] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEqual,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEqual,
        FilterOperator::StartsWith,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::EndsWith,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
        FilterOperator::IsEmpty,
        FilterOperator::IsNotEmpty,
    ];

    /// Returns `true` unless this is one of the `is_*` operators.
    pub fn requires_value(self) -> bool {
        !matches!(
            self,
            FilterOperator::IsNull
                | FilterOperator::IsNotNull
                | FilterOperator::IsEmpty
                | FilterOperator::IsNotEmpty
        )
    }

    /// Wire name, as stored in preferences.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::GreaterThanOrEqual => "greater_than_or_equal",
            FilterOperator::LessThan => "less_than",
            FilterOperator::LessThanOrEqual => "less_than_or_equal",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
            FilterOperator::EndsWith => "ends_with",
            FilterOperator::IsNull => "is_null",
            FilterOperator::IsNotNull => "is_not_null",
            FilterOperator::IsEmpty => "is_empty",
            FilterOperator::IsNotEmpty => "is_not_empty",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown operator name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Operator and value for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl ColumnFilter {
    /// Creates a filter.
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }

    /// Creates a filter for an operator that takes no value.
    pub fn operator_only(operator: FilterOperator) -> Self {
        Self::new(operator, String::new())
    }

    /// A filter is active iff its operator needs no value or its trimmed
    /// value is non-empty.
    pub fn is_active(&self) -> bool {
        !self.operator.requires_value() || !self.value.trim().is_empty()
    }
}

/// Active filters keyed by column id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: BTreeMap<String, ColumnFilter>,
}

impl FilterSet {
    /// Sets the filter for a column. An inactive filter removes the entry.
    ///
    /// Returns `true` if the set changed.
    pub fn set(&mut self, column_id: impl Into<String>, filter: ColumnFilter) -> bool {
        let column_id = column_id.into();
        if filter.is_active() {
            self.filters.insert(column_id, filter.clone()) != Some(filter)
        } else {
            self.filters.remove(&column_id).is_some()
        }
    }

    /// Removes the filter for a column. Returns `true` if one existed.
    pub fn remove(&mut self, column_id: &str) -> bool {
        self.filters.remove(column_id).is_some()
    }

    /// Removes every filter. Returns `true` if any existed.
    pub fn clear(&mut self) -> bool {
        let changed = !self.filters.is_empty();
        self.filters.clear();
        changed
    }

    /// Returns the filter for a column.
    pub fn get(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.filters.get(column_id)
    }

    /// Returns `true` if at least one filter is active.
    pub fn has_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates `(column id, filter)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.filters.iter().map(|(id, f)| (id.as_str(), f))
    }

    /// Keeps only entries for which `keep(column_id, filter)` holds.
    ///
    /// Returns `true` if anything was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &ColumnFilter) -> bool) -> bool {
        let before = self.filters.len();
        self.filters.retain(|id, filter| filter.is_active() && keep(id, filter));
        self.filters.len() != before
    }
}

impl FromIterator<(String, ColumnFilter)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (String, ColumnFilter)>>(iter: I) -> Self {
        let mut set = FilterSet::default();
        for (id, filter) in iter {
            set.set(id, filter);
        }
        set
    }
}
