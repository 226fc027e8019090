//! Cell value enum for dynamic column values

use std::fmt;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

/// A dynamic value produced by a column accessor.
///
/// Every accessor (display, filter, sort, export) yields a `CellValue`, so the
/// engines can coerce and compare values without knowing the row type.
///
/// # Type Mapping
///
/// | JSON / Rust source | Variant |
/// |--------------------|---------|
/// | `null`, missing field | `Null` |
/// | `true` / `false` | `Bool` |
/// | any number | `Number` |
/// | string | `Text` |
/// | `DateTime<Utc>` | `DateTime` |
///
/// # Example
///
/// ```
/// use datatable_lib::model::CellValue;
///
/// let name = CellValue::from("Ada");
/// let age = CellValue::from(36);
/// let empty = CellValue::Null;
/// assert_eq!(age.as_number(), Some(36.0));
/// assert!(empty.is_null());
/// assert_eq!(name.to_string(), "Ada");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Null or missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Timestamp in UTC.
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns `true` for null values and for empty or whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Coerces the value to a number.
    ///
    /// Numeric text parses as a number, ISO-date-like text and timestamps become
    /// epoch milliseconds, booleans become 0/1. Returns `None` when no numeric
    /// reading exists.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Number(n) => n.is_finite().then_some(*n),
            CellValue::Text(s) => parse_number(s).or_else(|| parse_datetime(s).map(epoch_millis)),
            CellValue::DateTime(dt) => Some(epoch_millis(*dt)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

/// Parses trimmed text as a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses ISO-8601-like text (`2024-01-31`, `2024-01-31T08:00:00`, RFC 3339).
///
/// Naive timestamps are read as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    // Cheap shape check: YYYY-MM-DD prefix.
    let bytes = trimmed.as_bytes();
    if bytes.len() < 10
        || !bytes[..4].iter().all(u8::is_ascii_digit)
        || bytes[4] != b'-'
        || bytes[7] != b'-'
    {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn epoch_millis(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Number(f64::from(v))
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<u32> for CellValue {
    fn from(v: u32) -> Self {
        CellValue::Number(f64::from(v))
    }
}

impl From<usize> for CellValue {
    fn from(v: usize) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(v: DateTime<Utc>) -> Self {
        CellValue::DateTime(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(v: serde_json::Value) -> Self {
        CellValue::from(&v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(CellValue::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(CellValue::from(true).as_number(), Some(1.0));
        assert_eq!(CellValue::from("abc").as_number(), None);
        assert_eq!(CellValue::from("").as_number(), None);
        assert_eq!(CellValue::from("NaN").as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
    }

    #[test]
    fn test_date_coercion() {
        let millis = CellValue::from("1970-01-02").as_number();
        assert_eq!(millis, Some(86_400_000.0));
        let rfc = CellValue::from("1970-01-01T00:00:01Z").as_number();
        assert_eq!(rfc, Some(1_000.0));
        assert!(parse_datetime("2024-13-45").is_none());
        assert!(parse_datetime("12-01-2024").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::from(30).to_string(), "30");
        assert_eq!(CellValue::from(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::from(false).to_string(), "false");
    }

    #[test]
    fn test_emptiness() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::from("   ").is_empty());
        assert!(!CellValue::from("x").is_empty());
        assert!(!CellValue::from(0).is_empty());
    }

    #[test]
    fn test_from_json() {
        let value = serde_json::json!({"n": 3, "s": "x", "z": null});
        assert_eq!(CellValue::from(&value["n"]), CellValue::Number(3.0));
        assert_eq!(CellValue::from(&value["s"]), CellValue::from("x"));
        assert_eq!(CellValue::from(&value["z"]), CellValue::Null);
        assert_eq!(CellValue::from(&value["missing"]), CellValue::Null);
    }
}
