//! Spreadsheet export of table rows.

use std::collections::HashMap;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::info;

use crate::column::{ColumnDef, PIXELS_PER_CHAR};
use crate::domain::GridError;
use crate::table::DataTable;
use crate::value::{CellValue, Record};

pub const SHEET_NAME: &str = "TableData";
const MIN_EXPORT_WIDTH: f64 = 10.0;

/// A worksheet before it is written: one header row, one row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Column widths in characters.
    pub widths: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// The rows of the current page.
    Page,
    /// Every row passing the filters.
    Filtered,
}

/// Lays out `rows` under the field columns of `columns`. Synthetic columns are skipped,
/// missing values become empty strings.
pub fn build_sheet<R: Record>(
    rows: &[&R],
    columns: &[&ColumnDef],
    sizing: &HashMap<String, u16>,
) -> Sheet {
    let fields: Vec<(&ColumnDef, &str)> = columns
        .iter()
        .filter_map(|c| c.key().map(|key| (*c, key)))
        .collect();

    let header = fields
        .iter()
        .map(|(c, key)| c.export_label.clone().unwrap_or_else(|| key.to_string()))
        .collect();
    let widths = fields
        .iter()
        .map(|(c, _)| {
            let size = sizing.get(&c.id).copied().unwrap_or(c.size);
            (size as f64 / PIXELS_PER_CHAR as f64).max(MIN_EXPORT_WIDTH)
        })
        .collect();
    let rows = rows
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|(_, key)| match record.field(key) {
                    CellValue::Null => CellValue::Text(String::new()),
                    value => value,
                })
                .collect()
        })
        .collect();

    Sheet {
        header,
        rows,
        widths,
    }
}

/// Writes the sheet as a single worksheet workbook.
pub fn write_xlsx(sheet: &Sheet, path: &Path) -> Result<(), GridError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in sheet.header.iter().zip(&sheet.widths).enumerate() {
        let col = col as u16;
        worksheet.write_string(0, col, title.as_str())?;
        worksheet.set_column_width(col, *width)?;
    }
    for (i, cells) in sheet.rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Number(n) if n.is_finite() => {
                    worksheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                other => {
                    let text = other.to_plain_string();
                    if !text.is_empty() {
                        worksheet.write_string(row, col, text)?;
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

pub fn export_xlsx<R: Record>(
    rows: &[&R],
    columns: &[&ColumnDef],
    sizing: &HashMap<String, u16>,
    path: &Path,
) -> Result<usize, GridError> {
    let sheet = build_sheet(rows, columns, sizing);
    write_xlsx(&sheet, path)?;
    info!(
        "Exported {} rows x {} columns to {}",
        sheet.rows.len(),
        sheet.header.len(),
        path.display()
    );
    Ok(sheet.rows.len())
}

impl<R: Record> DataTable<R> {
    /// Builds the sheet of the visible columns for the rows in `scope`.
    pub fn sheet(&self, scope: ExportScope) -> Sheet {
        build_sheet(
            &self.scope_records(scope),
            &self.visible_columns(),
            &self.state().column_sizing,
        )
    }

    /// Exports the rows in `scope` and returns how many were written.
    pub fn export(&self, scope: ExportScope, path: &Path) -> Result<usize, GridError> {
        export_xlsx(
            &self.scope_records(scope),
            &self.visible_columns(),
            &self.state().column_sizing,
            path,
        )
    }

    fn scope_records(&self, scope: ExportScope) -> Vec<&R> {
        match scope {
            ExportScope::Page => self.page_records(),
            ExportScope::Filtered => self.filtered_records(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::FilterKind;
    use crate::filter::FilterValue;
    use crate::table::TableOptions;

    struct Invoice {
        id: &'static str,
        total: Option<f64>,
    }

    impl Record for Invoice {
        fn field(&self, key: &str) -> CellValue {
            match key {
                "id" => CellValue::text(self.id),
                "total" => self.total.into(),
                _ => CellValue::Null,
            }
        }
    }

    fn invoices() -> Vec<Invoice> {
        vec![
            Invoice {
                id: "INV001",
                total: Some(250.0),
            },
            Invoice {
                id: "INV002",
                total: None,
            },
            Invoice {
                id: "INV003",
                total: Some(350.5),
            },
        ]
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::selector(),
            ColumnDef::field("id", "Invoice").export_label("Invoice Number"),
            ColumnDef::field("total", "Total")
                .filter(FilterKind::NumericRange)
                .size(40),
            ColumnDef::field("note", "Note"),
        ]
    }

    #[test]
    fn sheet_has_header_and_one_row_per_record() {
        let data = invoices();
        let rows: Vec<&Invoice> = data.iter().collect();
        let cols = columns();
        let refs: Vec<&ColumnDef> = cols.iter().collect();

        let sheet = build_sheet(&rows, &refs, &HashMap::new());
        assert_eq!(sheet.header, vec!["Invoice Number", "total", "note"]);
        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows.iter().all(|r| r.len() == 3));
        assert_eq!(sheet.rows[0][1], CellValue::Number(250.0));
        assert_eq!(sheet.rows[1][1], CellValue::Text(String::new()));
        assert_eq!(sheet.rows[2][2], CellValue::Text(String::new()));
    }

    #[test]
    fn widths_come_from_sizing_with_a_floor() {
        let cols = columns();
        let refs: Vec<&ColumnDef> = cols.iter().collect();
        let mut sizing = HashMap::new();
        sizing.insert("note".to_string(), 240);

        let sheet = build_sheet::<Invoice>(&[], &refs, &sizing);
        assert_eq!(sheet.widths, vec![18.75, 10.0, 30.0]);
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn writes_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let data = invoices();
        let rows: Vec<&Invoice> = data.iter().collect();
        let cols = columns();
        let refs: Vec<&ColumnDef> = cols.iter().collect();

        let written = export_xlsx(&rows, &refs, &HashMap::new(), &path).unwrap();
        assert_eq!(written, 3);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn table_export_follows_scope_and_visibility() {
        let mut table = DataTable::new(
            columns(),
            invoices(),
            TableOptions::default().page_size(2),
        );
        assert_eq!(table.sheet(ExportScope::Page).rows.len(), 2);
        assert_eq!(table.sheet(ExportScope::Filtered).rows.len(), 3);

        table
            .set_filter("total", Some(FilterValue::range(Some(300.0), None)))
            .unwrap();
        let sheet = table.sheet(ExportScope::Filtered);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0][0], CellValue::text("INV003"));

        table
            .dispatch(crate::state::TableAction::ToggleColumnVisibility("note".into()))
            .unwrap();
        assert_eq!(table.sheet(ExportScope::Page).header.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let written = table
            .export(ExportScope::Filtered, &dir.path().join("t.xlsx"))
            .unwrap();
        assert_eq!(written, 1);
    }
}
