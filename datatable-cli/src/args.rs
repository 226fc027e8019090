//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use datatable_lib::filter::{ColumnFilter, FilterOperator};
use datatable_lib::preferences::Scope;
use datatable_lib::sort::SortEntry;

#[derive(Debug, Parser)]
#[command(name = "datatable")]
#[command(about = "Filter, sort, page and export JSON records as a table", long_about = None)]
pub struct Cli {
    /// JSON file holding an array of objects ("-" reads stdin)
    pub input: PathBuf,

    /// Columns to show, in order (default: keys of the first record)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Field holding a stable row id (default: row position)
    #[arg(long)]
    pub id_field: Option<String>,

    /// Column filter as `column:operator[:value]`, e.g. `age:greater_than:30`
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,

    /// Sort key as `column[:asc|desc]`; repeat for multi-column sorting
    #[arg(long = "sort", value_parser = parse_sort)]
    pub sorting: Vec<SortEntry>,

    /// Clear every stored filter before applying `--filter`
    #[arg(long)]
    pub clear_filters: bool,

    /// Page to show (1-based)
    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub page_size: Option<usize>,

    /// Show every row on one page
    #[arg(long)]
    pub no_pagination: bool,

    /// Columns to hide
    #[arg(long, value_delimiter = ',')]
    pub hide: Vec<String>,

    /// Columns to show again
    #[arg(long, value_delimiter = ',')]
    pub show: Vec<String>,

    /// Column order; unlisted columns keep their relative position after these
    #[arg(long, value_delimiter = ',')]
    pub order: Vec<String>,

    /// Row ids to select; enables the selection column
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Select every row on the shown page
    #[arg(long)]
    pub select_page: bool,

    /// Write the filtered, sorted rows as CSV into this directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// File name for `--export`
    #[arg(long, default_value = "export.csv")]
    pub export_name: String,

    /// Table identifier for stored preferences
    #[arg(long, default_value = "default")]
    pub table_id: String,

    /// Preference scope: global, org or user
    #[arg(long, default_value = "global")]
    pub scope: Scope,

    /// User key for user-scoped preferences
    #[arg(long)]
    pub user: Option<String>,

    /// Organization key for org-scoped preferences
    #[arg(long)]
    pub org: Option<String>,

    /// Remember the page index too
    #[arg(long)]
    pub persist_page: bool,

    /// Preferences database (default: platform data directory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Neither load nor store preferences
    #[arg(long)]
    pub no_persist: bool,

    /// Log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// A `--filter` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub column: String,
    pub filter: ColumnFilter,
}

/// Parses `column:operator[:value]`. The value may itself contain colons.
pub fn parse_filter(raw: &str) -> Result<FilterArg, String> {
    let mut parts = raw.splitn(3, ':');
    let column = parts.next().unwrap_or_default().trim();
    let operator = parts
        .next()
        .ok_or_else(|| format!("expected column:operator[:value], got {raw:?}"))?;
    let value = parts.next().unwrap_or_default();

    if column.is_empty() {
        return Err(format!("missing column in {raw:?}"));
    }
    let operator: FilterOperator = operator.trim().parse().map_err(|err| format!("{err}"))?;
    if operator.requires_value() && value.trim().is_empty() {
        return Err(format!("operator {operator} needs a value"));
    }

    Ok(FilterArg {
        column: column.to_string(),
        filter: ColumnFilter::new(operator, value),
    })
}

/// Parses `column[:asc|desc]`.
pub fn parse_sort(raw: &str) -> Result<SortEntry, String> {
    let (column, direction) = match raw.split_once(':') {
        Some((column, direction)) => (column.trim(), Some(direction.trim())),
        None => (raw.trim(), None),
    };
    if column.is_empty() {
        return Err(format!("missing column in {raw:?}"));
    }
    match direction.map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => Ok(SortEntry::asc(column)),
        Some("desc") => Ok(SortEntry::desc(column)),
        Some(other) => Err(format!("unknown sort direction {other:?}")),
    }
}
