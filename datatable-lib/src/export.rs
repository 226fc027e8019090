//! CSV export of the processed rows.
//!
//! Only visible, exportable data columns are written, in display order. Each
//! value comes from the column's export accessor, else its display accessor,
//! else the raw row value. Fields containing a comma, quote or newline are
//! quote-wrapped with inner quotes doubled. Records are `\n`-joined with no
//! trailing newline.

use std::path::Path;
use std::path::PathBuf;

use crate::column::{ColumnRegistry, ResolvedColumn, SELECTION_COLUMN_ID};
use crate::error::ExportError;
use crate::model::TableRow;

/// Default export file name.
pub const DEFAULT_FILE_NAME: &str = "export.csv";

/// Export configuration.
///
/// # Example
///
/// ```
/// use datatable_lib::export::ExportOptions;
///
/// let options = ExportOptions::default().with_file_name("users.csv");
/// assert!(options.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// When `false`, every export is a no-op.
    ///
    /// Default: true
    pub enabled: bool,

    /// File name used by [`write_file`].
    ///
    /// Default: `export.csv`
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl ExportOptions {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

/// Columns an export writes, in order.
fn export_columns<'a, T: TableRow>(
    registry: &'a ColumnRegistry<T>,
    visible_ids: &[String],
) -> Vec<&'a ResolvedColumn<T>> {
    visible_ids
        .iter()
        .filter(|id| id.as_str() != SELECTION_COLUMN_ID)
        .filter_map(|id| registry.get(id))
        .filter(|column| column.def().enable_export)
        .collect()
}

/// Serializes `rows` to CSV text.
///
/// `visible_ids` is the display order of the visible columns. Returns `None`
/// (nothing to export) when export is disabled, there are no rows, or no
/// exportable column is visible.
pub fn to_csv<'a, T: TableRow>(
    registry: &ColumnRegistry<T>,
    rows: impl IntoIterator<Item = &'a T>,
    visible_ids: &[String],
    options: &ExportOptions,
) -> Result<Option<String>, ExportError> {
    let mut rows = rows.into_iter().peekable();
    if !options.enabled || rows.peek().is_none() {
        return Ok(None);
    }
    let columns = export_columns(registry, visible_ids);
    if columns.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|column| column.export_header()))?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| column.export_value(row).to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|err| ExportError::Io(err.into_error()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(Some(text))
}

/// Writes the CSV into `dir` under `options.file_name`.
///
/// Returns the written path, or `None` when there was nothing to export.
pub fn write_file<'a, T: TableRow>(
    registry: &ColumnRegistry<T>,
    rows: impl IntoIterator<Item = &'a T>,
    visible_ids: &[String],
    options: &ExportOptions,
    dir: &Path,
) -> Result<Option<PathBuf>, ExportError> {
    let Some(text) = to_csv(registry, rows, visible_ids, options)? else {
        log::debug!("[export] Nothing to export");
        return Ok(None);
    };
    let path = dir.join(&options.file_name);
    std::fs::write(&path, text)?;
    log::info!("[export] Wrote {}", path.display());
    Ok(Some(path))
}
