//! Column descriptors: what a column reads, how it filters, how wide it is.

use derive_setters::Setters;

use crate::value::CellValue;

/// Terminal cells are derived from pixel sizes with this ratio, the same one export uses
/// to approximate spreadsheet column widths.
pub const PIXELS_PER_CHAR: u16 = 8;

pub const DEFAULT_COLUMN_SIZE: u16 = 150;
pub const DEFAULT_MIN_COLUMN_SIZE: u16 = 20;

pub const EXPAND_COLUMN_ID: &str = "expand";
pub const SELECT_COLUMN_ID: &str = "select";

/// Where the cells of a column come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A record field, read through `Record::field`.
    Field(String),
    /// The injected expand toggle.
    Expander,
    /// Row selection checkboxes.
    Selector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Builds an option list from `(value, label)` pairs.
pub fn options(pairs: &[(&str, &str)]) -> Vec<FilterOption> {
    pairs
        .iter()
        .map(|(value, label)| FilterOption::new(*value, *label))
        .collect()
}

/// The filter a column declares. Each kind carries exactly what its widget needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterKind {
    Text,
    Select(Vec<FilterOption>),
    MultiSelect(Vec<FilterOption>),
    NumericRange,
    DateRange,
    #[default]
    None,
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Text => "text",
            FilterKind::Select(_) => "select",
            FilterKind::MultiSelect(_) => "multi-select",
            FilterKind::NumericRange => "range",
            FilterKind::DateRange => "date-range",
            FilterKind::None => "none",
        }
    }

    pub fn options(&self) -> &[FilterOption] {
        match self {
            FilterKind::Select(options) | FilterKind::MultiSelect(options) => options,
            _ => &[],
        }
    }

    /// Label of an option value, the value itself when it is not one of the options.
    pub fn label_for<'a>(&'a self, value: &'a str) -> &'a str {
        self.options()
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }
}

/// Display formatting of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFormat {
    #[default]
    Plain,
    /// US dollars with thousands separators.
    Currency,
    Decimal(usize),
    /// `M/D/YYYY`.
    Date,
    /// Enum-like values, underscores shown as spaces.
    Label,
}

#[derive(Debug, Clone, PartialEq, Setters)]
pub struct ColumnDef {
    #[setters(skip)]
    pub id: String,
    #[setters(skip)]
    pub source: ColumnSource,
    #[setters(into)]
    pub header: String,
    pub filter: FilterKind,
    pub size: u16,
    pub min_size: u16,
    pub max_size: u16,
    pub enable_sorting: bool,
    pub enable_hiding: bool,
    pub enable_resizing: bool,
    #[setters(into, strip_option)]
    pub export_label: Option<String>,
    pub format: CellFormat,
    #[setters(into, strip_option)]
    pub placeholder: Option<String>,
}

impl ColumnDef {
    /// A column showing the record field `key`.
    pub fn field(key: impl Into<String>, header: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: key.clone(),
            source: ColumnSource::Field(key),
            header: header.into(),
            filter: FilterKind::None,
            size: DEFAULT_COLUMN_SIZE,
            min_size: DEFAULT_MIN_COLUMN_SIZE,
            max_size: u16::MAX,
            enable_sorting: true,
            enable_hiding: true,
            enable_resizing: true,
            export_label: None,
            format: CellFormat::Plain,
            placeholder: None,
        }
    }

    pub fn expander() -> Self {
        Self {
            id: EXPAND_COLUMN_ID.to_string(),
            source: ColumnSource::Expander,
            header: String::new(),
            enable_sorting: false,
            enable_hiding: false,
            ..Self::field(EXPAND_COLUMN_ID, "")
        }
        .sizing(50, 50, 100)
    }

    pub fn selector() -> Self {
        Self {
            id: SELECT_COLUMN_ID.to_string(),
            source: ColumnSource::Selector,
            header: String::new(),
            enable_sorting: false,
            enable_hiding: false,
            ..Self::field(SELECT_COLUMN_ID, "")
        }
        .sizing(50, 50, 100)
    }

    pub fn sizing(mut self, size: u16, min_size: u16, max_size: u16) -> Self {
        self.min_size = min_size;
        self.max_size = max_size.max(min_size);
        self.size = size.clamp(self.min_size, self.max_size);
        self
    }

    /// The record field this column reads, if any.
    pub fn key(&self) -> Option<&str> {
        match &self.source {
            ColumnSource::Field(key) => Some(key),
            _ => None,
        }
    }

    pub fn can_filter(&self) -> bool {
        self.key().is_some()
    }

    pub fn can_sort(&self) -> bool {
        self.enable_sorting && self.key().is_some()
    }

    pub fn clamp_size(&self, size: i32) -> u16 {
        size.clamp(self.min_size as i32, self.max_size as i32) as u16
    }

    /// Formats a cell for display. Missing values show the placeholder.
    pub fn format_cell(&self, value: &CellValue) -> String {
        if value.is_null() {
            return self.placeholder.clone().unwrap_or_default();
        }
        match (self.format, value) {
            (CellFormat::Currency, v) => match v.as_number() {
                Some(n) => format_currency(n),
                None => v.to_plain_string(),
            },
            (CellFormat::Decimal(places), v) => match v.as_number() {
                Some(n) => format!("{n:.places$}"),
                None => v.to_plain_string(),
            },
            (CellFormat::Date, v) => match v.as_date() {
                Some(d) => d.format("%-m/%-d/%Y").to_string(),
                None => v.to_plain_string(),
            },
            (CellFormat::Label, CellValue::Tags(tags)) => tags
                .iter()
                .map(|t| self.filter.label_for(t).to_string())
                .collect::<Vec<_>>()
                .join(", "),
            (CellFormat::Label, v) => v.to_plain_string().replace('_', " "),
            (CellFormat::Plain, v) => v.to_plain_string(),
        }
    }
}

/// Terminal width of a pixel size.
pub fn chars_for_pixels(px: u16) -> usize {
    std::cmp::max(px / PIXELS_PER_CHAR, 3) as usize
}

pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn builder_sets_filter_and_sizes() {
        let col = ColumnDef::field("deliveryMethod", "Delivery Method")
            .filter(FilterKind::Select(options(&[
                ("standard", "Standard"),
                ("express", "Express"),
            ])))
            .sizing(180, 150, 250)
            .export_label("Delivery");

        assert_eq!(col.id, "deliveryMethod");
        assert_eq!(col.key(), Some("deliveryMethod"));
        assert_eq!(col.filter.options().len(), 2);
        assert_eq!(col.filter.label_for("express"), "Express");
        assert_eq!(col.filter.label_for("drone"), "drone");
        assert_eq!((col.size, col.min_size, col.max_size), (180, 150, 250));
        assert_eq!(col.export_label.as_deref(), Some("Delivery"));
    }

    #[test]
    fn synthetic_columns_have_no_key() {
        let expand = ColumnDef::expander();
        assert_eq!(expand.id, EXPAND_COLUMN_ID);
        assert_eq!(expand.key(), None);
        assert!(!expand.can_sort());
        assert!(!expand.enable_hiding);
        assert_eq!((expand.size, expand.min_size, expand.max_size), (50, 50, 100));
        assert_eq!(ColumnDef::selector().source, ColumnSource::Selector);
    }

    #[test]
    fn sizes_clamp() {
        let col = ColumnDef::field("a", "A").sizing(500, 100, 200);
        assert_eq!(col.size, 200);
        assert_eq!(col.clamp_size(20), 100);
        assert_eq!(col.clamp_size(150), 150);
        assert_eq!(chars_for_pixels(250), 31);
        assert_eq!(chars_for_pixels(10), 3);
    }

    #[test]
    fn formats_cells() {
        let price = ColumnDef::field("grossPrice", "Gross").format(CellFormat::Currency);
        assert_eq!(price.format_cell(&CellValue::Number(1234.5)), "$1,234.50");
        assert_eq!(price.format_cell(&CellValue::Number(-12.0)), "-$12.00");
        assert_eq!(price.format_cell(&CellValue::Number(999.999)), "$1,000.00");

        let volume = ColumnDef::field("volume", "Volume").format(CellFormat::Decimal(2));
        assert_eq!(volume.format_cell(&CellValue::Number(3.14159)), "3.14");

        let due = ColumnDef::field("dueDate", "Due")
            .format(CellFormat::Date)
            .placeholder("No date");
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(due.format_cell(&CellValue::Date(date)), "1/5/2024");
        assert_eq!(due.format_cell(&CellValue::Null), "No date");

        let status = ColumnDef::field("status", "Status").format(CellFormat::Label);
        assert_eq!(status.format_cell(&CellValue::text("in_progress")), "in progress");
    }
}
