use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use rust_xlsxwriter::XlsxError;

#[derive(Debug)]
pub enum GridError {
    IoError(Error),
    PolarsError(PolarsError),
    ExportError(XlsxError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    UnknownColumn(String),
    FilterKindMismatch(String),
    InvalidFilterInput(String),
    LoggingFailed(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::IoError(e) => write!(f, "io error: {e}"),
            GridError::PolarsError(e) => write!(f, "could not read data: {e}"),
            GridError::ExportError(e) => write!(f, "export failed: {e}"),
            GridError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            GridError::FileNotFound => write!(f, "file not found"),
            GridError::PermissionDenied => write!(f, "permission denied"),
            GridError::UnknownFileType => {
                write!(f, "unknown file type (expected csv, parquet or arrow)")
            }
            GridError::UnknownColumn(id) => write!(f, "unknown column \"{id}\""),
            GridError::FilterKindMismatch(id) => {
                write!(f, "filter value does not fit the filter of column \"{id}\"")
            }
            GridError::InvalidFilterInput(input) => write!(f, "invalid filter input \"{input}\""),
            GridError::LoggingFailed(reason) => write!(f, "could not set up logging: {reason}"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<Error> for GridError {
    fn from(err: Error) -> Self {
        GridError::IoError(err)
    }
}

impl From<PolarsError> for GridError {
    fn from(err: PolarsError) -> Self {
        GridError::PolarsError(err)
    }
}

impl From<XlsxError> for GridError {
    fn from(err: XlsxError) -> Self {
        GridError::ExportError(err)
    }
}

/// Runtime settings of the terminal front end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub export_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            export_path: "table-data.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ToggleSort,
    EditFilter,
    Search,
    ResetFilters,
    ToggleSelect,
    ToggleSelectPage,
    ToggleExpand,
    ToggleExpandAll,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    GrowColumn,
    ShrinkColumn,
    MoveColumnLeft,
    MoveColumnRight,
    Columns,
    CopyRowId,
    Export,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 Navigation
   ↑ ↓ ← → / h j k l   move the cursor
   n / p               next / previous page
   g / G               first / last page
   z                   cycle rows per page

 Table
   s                   toggle sorting of the current column
   f                   edit the filter of the current column
   /                   toolbar search
   R                   reset all filters
   space / a           select row / select all rows on the page
   enter / E           expand row / expand all rows
   < / >               shrink / grow the current column
   H / L               move the current column left / right
   c                   show or hide columns
   y                   copy the row id
   x                   export the visible rows to a spreadsheet

 Filter widgets
   enter               apply and close
   esc                 clear the filter
   tab                 switch between min / max
   ← →                 change the selection (select)
   ↑ ↓ space           move / toggle an option (multi-select)

   ?                   this help      q   quit
";
