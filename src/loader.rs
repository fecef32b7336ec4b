//! Loads a CSV, Parquet or Arrow IPC file into records and infers a column per field.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::column::{CellFormat, ColumnDef, FilterKind, FilterOption, PIXELS_PER_CHAR};
use crate::domain::GridError;
use crate::value::{CellValue, Record, parse_date};

/// Text columns with at most this many distinct values get a select filter.
pub const MAX_SELECT_OPTIONS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// A row of a loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct DynRecord {
    names: Arc<HashMap<String, usize>>,
    cells: Vec<CellValue>,
}

impl Record for DynRecord {
    fn field(&self, key: &str) -> CellValue {
        self.names
            .get(key)
            .and_then(|idx| self.cells.get(*idx))
            .cloned()
            .unwrap_or_default()
    }
}

/// Widest column, in characters, a loaded file may ask for.
pub const MAX_COLUMN_CHARS: usize = 1024;

pub struct LoadedTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub records: Vec<DynRecord>,
}

pub fn load_file(path: PathBuf, max_column_width: usize) -> Result<LoadedTable, GridError> {
    let file_info = get_file_info(path)?;
    debug!(
        "Loading {} ({:?}, {} bytes)",
        file_info.path.display(),
        file_info.file_type,
        file_info.file_size
    );
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    // One task per column, each converting its cells and inferring the column definition.
    let loaded: Result<Vec<(ColumnDef, Vec<CellValue>)>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name.as_str(), max_column_width))
        .collect();
    let loaded = loaded?;
    info!(
        "Loading data took {}ms ...",
        start_time.elapsed().as_millis()
    );

    let names: Arc<HashMap<String, usize>> = Arc::new(
        loaded
            .iter()
            .enumerate()
            .map(|(idx, (column, _))| (column.id.clone(), idx))
            .collect(),
    );
    let mut columns = Vec::with_capacity(loaded.len());
    let mut cells = Vec::with_capacity(loaded.len());
    for (column, values) in loaded {
        debug!("Column {} => {}", column.id, column.filter.name());
        columns.push(column);
        cells.push(values.into_iter());
    }
    let records = (0..df.height())
        .map(|_| DynRecord {
            names: Arc::clone(&names),
            cells: cells
                .iter_mut()
                .map(|values| values.next().unwrap_or_default())
                .collect(),
        })
        .collect();

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    Ok(LoadedTable {
        name,
        columns,
        records,
    })
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn load_column(
    df: &DataFrame,
    name: &str,
    max_column_width: usize,
) -> Result<(ColumnDef, Vec<CellValue>), PolarsError> {
    let column = df.column(name)?;
    let dtype = column.dtype().clone();

    let (values, filter, format) = if is_numeric_type(&dtype) {
        let values: Vec<CellValue> = column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(CellValue::Number).unwrap_or_default())
            .collect();
        (values, FilterKind::NumericRange, CellFormat::Plain)
    } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        let values: Vec<CellValue> = column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date).map(CellValue::Date).unwrap_or_default())
            .collect();
        (values, FilterKind::DateRange, CellFormat::Date)
    } else if matches!(dtype, DataType::Boolean) {
        let values: Vec<CellValue> = column
            .bool()?
            .into_iter()
            .map(|v| v.map(CellValue::Bool).unwrap_or_default())
            .collect();
        let options = vec![
            FilterOption::new("true", "True"),
            FilterOption::new("false", "False"),
        ];
        (values, FilterKind::Select(options), CellFormat::Plain)
    } else if matches!(dtype, DataType::List(_)) {
        let mut values = Vec::with_capacity(column.len());
        let mut distinct = BTreeSet::new();
        for entry in column.list()?.into_iter() {
            let Some(series) = entry else {
                values.push(CellValue::Null);
                continue;
            };
            let tags: Vec<String> = series
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            distinct.extend(tags.iter().cloned());
            values.push(CellValue::Tags(tags));
        }
        let options = distinct.iter().map(|t| FilterOption::new(t, t)).collect();
        (values, FilterKind::MultiSelect(options), CellFormat::Plain)
    } else {
        let strings = column.cast(&DataType::String)?;
        let values: Vec<CellValue> = strings
            .str()?
            .into_iter()
            .map(|v| {
                v.map(|s| CellValue::text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")))
                    .unwrap_or_default()
            })
            .collect();
        let distinct: BTreeSet<&str> = strings.str()?.into_iter().flatten().collect();
        let filter = if !distinct.is_empty()
            && distinct.len() <= MAX_SELECT_OPTIONS
            && distinct.len() < values.len()
        {
            FilterKind::Select(distinct.iter().map(|v| FilterOption::new(*v, *v)).collect())
        } else {
            FilterKind::Text
        };
        (values, filter, CellFormat::Plain)
    };

    let size = column_size(name, &values, max_column_width);
    let def = ColumnDef::field(name, name)
        .filter(filter)
        .format(format)
        .placeholder("∅")
        .sizing(size, 3 * PIXELS_PER_CHAR, width_limit(max_column_width) * PIXELS_PER_CHAR * 2);
    Ok((def, values))
}

/// Pixel width fitting the header and the widest value, capped at `max_column_width` characters.
fn column_size(name: &str, values: &[CellValue], max_column_width: usize) -> u16 {
    let widest = values
        .iter()
        .map(|v| v.to_plain_string().chars().count())
        .max()
        .unwrap_or(0)
        .max(name.chars().count())
        + 2;
    widest.min(width_limit(max_column_width).into()) as u16 * PIXELS_PER_CHAR
}

/// `max_column_width` clamped so pixel sizes stay within `u16`.
fn width_limit(max_column_width: usize) -> u16 {
    max_column_width.clamp(3, MAX_COLUMN_CHARS) as u16
}

fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(GridError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, GridError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound,
        ErrorKind::PermissionDenied => GridError::PermissionDenied,
        _ => GridError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;

    use super::*;

    const CSV: &str = "\
name,amount,status,created
alice,10.5,paid,2024-01-05
bob,20,open,2024-01-15
carol,,paid,2024-01-25
dave,7,open,2024-02-01
";

    fn csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        file
    }

    #[test]
    fn infers_filters_from_column_types() {
        let file = csv_file();
        let table = load_file(file.path().to_path_buf(), 40).unwrap();
        let kinds: Vec<&str> = table.columns.iter().map(|c| c.filter.name()).collect();
        assert_eq!(kinds, vec!["text", "range", "select", "date-range"]);
        assert_eq!(table.columns[2].filter.options().len(), 2);
        assert_eq!(table.records.len(), 4);
    }

    #[test]
    fn records_expose_typed_cells() {
        let file = csv_file();
        let table = load_file(file.path().to_path_buf(), 40).unwrap();
        let first = &table.records[0];
        assert_eq!(first.field("name"), CellValue::text("alice"));
        assert_eq!(first.field("amount"), CellValue::Number(10.5));
        assert_eq!(
            first.field("created"),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert!(table.records[2].field("amount").is_null());
        assert!(first.field("missing").is_null());
    }

    #[test]
    fn column_size_is_capped() {
        let values = vec![CellValue::text("x".repeat(100))];
        assert_eq!(column_size("n", &values, 40), 40 * PIXELS_PER_CHAR);
        assert_eq!(column_size("name", &[], 40), 6 * PIXELS_PER_CHAR);
    }

    #[test]
    fn huge_width_limits_are_clamped() {
        let values = vec![CellValue::text("x".repeat(5000))];
        let widest = MAX_COLUMN_CHARS as u16 * PIXELS_PER_CHAR;
        assert_eq!(column_size("n", &values, 5000), widest);
        assert_eq!(column_size("n", &values, 70_000), widest);

        let file = csv_file();
        let table = load_file(file.path().to_path_buf(), 5000).unwrap();
        assert!(table.columns.iter().all(|c| c.max_size == widest * 2));
    }

    #[test]
    fn reports_missing_and_unknown_files() {
        let missing = load_file(PathBuf::from("/definitely/not/here.csv"), 40);
        assert!(matches!(missing, Err(GridError::FileNotFound)));

        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let unknown = load_file(file.path().to_path_buf(), 40);
        assert!(matches!(unknown, Err(GridError::UnknownFileType)));
    }
}
