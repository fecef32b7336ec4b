//! gridview - interactive data tables in the terminal.
//!
//! A [`table::DataTable`] composes column definitions, in-memory records and table options.
//! All view state (sorting, filters, selection, expansion, sizing, order, pagination) lives in
//! one [`state::TableViewState`] that changes through [`table::DataTable::dispatch`].
//! The `model`, `controller` and `ui` modules put a table on the terminal.

pub mod column;
pub mod controller;
pub mod domain;
pub mod editor;
pub mod expand;
pub mod export;
pub mod filter;
pub mod fixtures;
pub mod inputter;
pub mod loader;
pub mod logging;
pub mod model;
pub mod rows;
pub mod state;
pub mod table;
pub mod ui;
pub mod value;

pub use column::{CellFormat, ColumnDef, FilterKind, FilterOption};
pub use domain::{AppConfig, GridError};
pub use export::{ExportScope, build_sheet, export_xlsx};
pub use filter::FilterValue;
pub use state::{TableAction, TableViewState};
pub use table::{DataTable, TableOptions};
pub use value::{CellValue, Record};
