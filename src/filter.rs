//! Column filter values and the predicate dispatcher.
//!
//! A filter value's shape follows the column's [`FilterKind`]. Evaluation is a pure function
//! of the filter value and one cell; an absent filter never constrains a row.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::column::FilterKind;
use crate::domain::GridError;
use crate::value::{CellValue, parse_date};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Select(Option<String>),
    MultiSelect(BTreeSet<String>),
    NumericRange { min: Option<f64>, max: Option<f64> },
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    pub fn select(value: impl Into<String>) -> Self {
        FilterValue::Select(Some(value.into()))
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::MultiSelect(values.into_iter().map(Into::into).collect())
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::NumericRange { min, max }
    }

    pub fn dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        FilterValue::DateRange { from, to }
    }

    /// An empty value constrains nothing and is dropped from the filter state.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Select(v) => v.as_deref().is_none_or(str::is_empty),
            FilterValue::MultiSelect(values) => values.is_empty(),
            FilterValue::NumericRange { min, max } => min.is_none() && max.is_none(),
            FilterValue::DateRange { from, to } => from.is_none() && to.is_none(),
        }
    }

    /// Whether `cell` satisfies this filter.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterValue::Text(needle) => {
                needle.is_empty()
                    || cell
                        .to_plain_string()
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
            }
            FilterValue::Select(selected) => match selected.as_deref() {
                None | Some("") => true,
                Some(value) => cell.to_plain_string() == value,
            },
            FilterValue::MultiSelect(selected) => {
                if selected.is_empty() {
                    return true;
                }
                match cell.as_tags() {
                    Some(tags) => tags.iter().any(|t| selected.contains(t)),
                    None => false,
                }
            }
            FilterValue::NumericRange { min, max } => {
                within_bounds(cell.as_number(), min.as_ref(), max.as_ref())
            }
            FilterValue::DateRange { from, to } => {
                within_bounds(cell.as_date(), from.as_ref(), to.as_ref())
            }
        }
    }

    /// Whether this value can be held by a column declaring `kind`. Text values fit any
    /// column so the toolbar search can target any field.
    pub fn fits(&self, kind: &FilterKind) -> bool {
        matches!(
            (self, kind),
            (FilterValue::Text(_), _)
                | (FilterValue::Select(_), FilterKind::Select(_))
                | (FilterValue::MultiSelect(_), FilterKind::MultiSelect(_))
                | (FilterValue::NumericRange { .. }, FilterKind::NumericRange)
                | (FilterValue::DateRange { .. }, FilterKind::DateRange)
        )
    }

    /// Short human readable form for headers and the status line.
    pub fn summary(&self, kind: &FilterKind) -> String {
        match self {
            FilterValue::Text(s) => format!("~{s}"),
            FilterValue::Select(v) => kind.label_for(v.as_deref().unwrap_or("")).to_string(),
            FilterValue::MultiSelect(values) => values
                .iter()
                .map(|v| kind.label_for(v))
                .collect::<Vec<_>>()
                .join("|"),
            FilterValue::NumericRange { min, max } => format!(
                "{}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            ),
            FilterValue::DateRange { from, to } => format!(
                "{}..{}",
                from.map(|d| d.to_string()).unwrap_or_default(),
                to.map(|d| d.to_string()).unwrap_or_default()
            ),
        }
    }
}

/// A missing reading fails as soon as any bound is set.
fn within_bounds<T: PartialOrd>(value: Option<T>, lower: Option<&T>, upper: Option<&T>) -> bool {
    if lower.is_none() && upper.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    if let Some(lower) = lower
        && value < *lower
    {
        return false;
    }
    if let Some(upper) = upper
        && value > *upper
    {
        return false;
    }
    true
}

/// Parses a min/max pair typed into a range widget. Empty inputs are unbounded; `Ok(None)`
/// means both are empty and the filter should be cleared.
pub fn parse_numeric_range(min: &str, max: &str) -> Result<Option<FilterValue>, GridError> {
    let min = parse_bound(min, |s| s.parse::<f64>().ok().filter(|n| n.is_finite()))?;
    let max = parse_bound(max, |s| s.parse::<f64>().ok().filter(|n| n.is_finite()))?;
    Ok(if min.is_none() && max.is_none() {
        None
    } else {
        Some(FilterValue::NumericRange { min, max })
    })
}

/// Same as [`parse_numeric_range`] for `YYYY-MM-DD` date bounds.
pub fn parse_date_range(from: &str, to: &str) -> Result<Option<FilterValue>, GridError> {
    let from = parse_bound(from, parse_date)?;
    let to = parse_bound(to, parse_date)?;
    Ok(if from.is_none() && to.is_none() {
        None
    } else {
        Some(FilterValue::DateRange { from, to })
    })
}

fn parse_bound<T>(input: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, GridError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    parse(input)
        .map(Some)
        .ok_or_else(|| GridError::InvalidFilterInput(input.to_string()))
}

/// Active filters keyed by column id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFilters {
    values: HashMap<String, FilterValue>,
}

impl ColumnFilters {
    pub fn get(&self, column_id: &str) -> Option<&FilterValue> {
        self.values.get(column_id)
    }

    /// Stores `value` for the column; `None` or an empty value removes the entry.
    pub fn set(&mut self, column_id: &str, value: Option<FilterValue>) {
        match value {
            Some(v) if !v.is_empty() => {
                self.values.insert(column_id.to_string(), v);
            }
            _ => {
                self.values.remove(column_id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn admitted(filter: &FilterValue, cells: &[CellValue]) -> Vec<usize> {
        cells
            .iter()
            .enumerate()
            .filter(|(_, c)| filter.matches(c))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn empty_filters_admit_everything() {
        let cells = [
            CellValue::Null,
            CellValue::Number(1.0),
            CellValue::text("x"),
            CellValue::tags(["a"]),
            CellValue::Date(date("2024-01-01")),
            CellValue::text("not a number"),
        ];
        let empties = [
            FilterValue::text(""),
            FilterValue::Select(None),
            FilterValue::Select(Some(String::new())),
            FilterValue::MultiSelect(BTreeSet::new()),
            FilterValue::range(None, None),
            FilterValue::dates(None, None),
        ];
        for filter in &empties {
            assert!(filter.is_empty());
            assert_eq!(admitted(filter, &cells).len(), cells.len(), "{filter:?}");
        }
    }

    #[test]
    fn numeric_range_lower_bound() {
        let cells = [50.0, 150.0, 300.0].map(CellValue::Number);
        let filter = FilterValue::range(Some(100.0), None);
        assert_eq!(admitted(&filter, &cells), vec![1, 2]);
    }

    #[test]
    fn numeric_range_is_inclusive() {
        let filter = FilterValue::range(Some(100.0), Some(200.0));
        assert!(filter.matches(&CellValue::Number(100.0)));
        assert!(filter.matches(&CellValue::Number(200.0)));
        assert!(!filter.matches(&CellValue::Number(200.01)));
        assert!(filter.matches(&CellValue::text("150")));
    }

    #[test]
    fn unparseable_cells_fail_bounds() {
        let filter = FilterValue::range(None, Some(10.0));
        assert!(!filter.matches(&CellValue::text("n/a")));
        assert!(!filter.matches(&CellValue::Null));

        let dates = FilterValue::dates(Some(date("2024-01-01")), None);
        assert!(!dates.matches(&CellValue::text("yesterday")));
        assert!(!dates.matches(&CellValue::Number(3.0)));
    }

    #[test]
    fn widening_a_range_never_drops_rows() {
        let cells: Vec<CellValue> = (0..20).map(|n| CellValue::Number(n as f64 * 7.5)).collect();
        let narrow = FilterValue::range(Some(30.0), Some(90.0));
        let wide = FilterValue::range(Some(10.0), Some(120.0));
        let before = admitted(&narrow, &cells);
        let after = admitted(&wide, &cells);
        assert!(before.iter().all(|i| after.contains(i)));
    }

    #[test]
    fn widening_a_date_range_never_drops_rows() {
        let start = date("2024-01-01");
        let cells: Vec<CellValue> = (0..60)
            .map(|n| CellValue::Date(start + chrono::Duration::days(n * 3)))
            .collect();
        let narrow = FilterValue::dates(Some(date("2024-02-01")), Some(date("2024-04-01")));
        let before = admitted(&narrow, &cells);
        assert!(!before.is_empty());

        for wide in [
            FilterValue::dates(Some(date("2024-01-10")), Some(date("2024-05-01"))),
            FilterValue::dates(Some(date("2024-01-10")), Some(date("2024-04-01"))),
            FilterValue::dates(Some(date("2024-02-01")), Some(date("2024-05-01"))),
            FilterValue::dates(None, Some(date("2024-04-01"))),
        ] {
            let after = admitted(&wide, &cells);
            assert!(before.iter().all(|i| after.contains(i)), "{wide:?}");
            assert!(after.len() > before.len());
        }
    }

    #[test]
    fn multi_select_intersects_tags() {
        let cells = [
            CellValue::tags(["premium", "monthly"]),
            CellValue::tags(["trial"]),
        ];
        let filter = FilterValue::multi(["monthly"]);
        assert_eq!(admitted(&filter, &cells), vec![0]);

        let either = FilterValue::multi(["trial", "premium"]);
        assert_eq!(admitted(&either, &cells), vec![0, 1]);
    }

    #[test]
    fn multi_select_rejects_rows_without_tags() {
        let filter = FilterValue::multi(["monthly"]);
        assert!(!filter.matches(&CellValue::Null));
        assert!(!filter.matches(&CellValue::text("monthly")));
        assert!(!filter.matches(&CellValue::Tags(Vec::new())));
    }

    #[test]
    fn select_is_exact() {
        let cells = [
            CellValue::text("express"),
            CellValue::text("express_plus"),
            CellValue::text("Express"),
        ];
        assert_eq!(admitted(&FilterValue::select("express"), &cells), vec![0]);
    }

    #[test]
    fn date_range_window() {
        let cells = ["2024-01-05", "2024-01-15", "2024-01-25"].map(CellValue::text);
        let filter = FilterValue::dates(Some(date("2024-01-10")), Some(date("2024-01-20")));
        assert_eq!(admitted(&filter, &cells), vec![1]);

        let typed = CellValue::Date(date("2024-01-10"));
        assert!(filter.matches(&typed));
    }

    #[test]
    fn text_is_case_insensitive_substring() {
        let cells = [CellValue::text("John Doe"), CellValue::text("Jane Smith")];
        assert_eq!(admitted(&FilterValue::text("doe"), &cells), vec![0]);
        assert!(FilterValue::text("mon").matches(&CellValue::tags(["premium", "monthly"])));
        assert!(!FilterValue::text("x").matches(&CellValue::Null));
    }

    #[test]
    fn parses_range_inputs() {
        assert_eq!(parse_numeric_range("", " ").unwrap(), None);
        assert_eq!(
            parse_numeric_range("100", "").unwrap(),
            Some(FilterValue::range(Some(100.0), None))
        );
        assert!(matches!(
            parse_numeric_range("abc", "5"),
            Err(GridError::InvalidFilterInput(s)) if s == "abc"
        ));
        assert_eq!(
            parse_date_range("", "2024-02-01").unwrap(),
            Some(FilterValue::dates(None, Some(date("2024-02-01"))))
        );
        assert!(parse_date_range("02/01/2024", "").is_err());
    }

    #[test]
    fn kind_fit() {
        let select = FilterKind::Select(Vec::new());
        assert!(FilterValue::select("a").fits(&select));
        assert!(FilterValue::text("a").fits(&FilterKind::NumericRange));
        assert!(!FilterValue::range(None, Some(1.0)).fits(&select));
        assert!(!FilterValue::multi(["a"]).fits(&FilterKind::None));
    }

    #[test]
    fn column_filters_drop_empty_values() {
        let mut filters = ColumnFilters::default();
        filters.set("amount", Some(FilterValue::range(Some(1.0), None)));
        filters.set("email", Some(FilterValue::text("")));
        assert_eq!(filters.len(), 1);
        filters.set("amount", None);
        assert!(filters.is_empty());
    }

    #[test]
    fn column_filters_iterate_active_entries() {
        let mut filters = ColumnFilters::default();
        filters.set("email", Some(FilterValue::text("ken")));
        filters.set("status", Some(FilterValue::multi(["paid"])));
        filters.set("amount", None);
        let mut ids: Vec<&str> = filters.iter().map(|(id, _)| id).collect();
        ids.sort();
        assert_eq!(ids, vec!["email", "status"]);
        assert_eq!(
            filters.iter().find(|(id, _)| *id == "email").map(|(_, v)| v),
            Some(&FilterValue::text("ken"))
        );
    }
}
