//! Tabular data-presentation engine
//!
//! Column registry, filtering, sorting, pagination, row selection, column
//! ordering, preference persistence and CSV export for list pages. The engine
//! never fetches data: callers hand it rows and column definitions and read back
//! the rendered row set.

pub mod column;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod order;
pub mod pagination;
pub mod preferences;
pub mod selection;
pub mod sort;
pub mod table;

pub use column::{Accessor, ColumnDef, ColumnRegistry, Header, SELECTION_COLUMN_ID};
pub use model::{CellValue, TableRow};
pub use table::{DataTable, DataTableBuilder, RowModel, TableOptions};
