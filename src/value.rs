//! Typed cell values and the record abstraction every table row implements.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// A single cell as extracted from a record by a column accessor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Tags(Vec<String>),
}

/// A row of a table. Columns reach into a record by field key.
pub trait Record {
    /// Value of the field `key`, `CellValue::Null` when the record has no such field.
    fn field(&self, key: &str) -> CellValue;
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CellValue::Tags(tags.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric reading of the cell. Text is trimmed and parsed, booleans count as 0/1.
    /// NaN and infinities have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }

    /// Null or a NaN number. Sorting puts these last.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Text(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            CellValue::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    /// Plain string form used for text matching, select equality and export.
    pub fn to_plain_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Tags(tags) => tags.join(", "),
        }
    }

    /// Ordering used by column sorting. `None` when either cell is missing; callers decide
    /// where those go.
    ///
    /// Everything else is totally ordered: cells with a numeric reading come first, then
    /// dates, then the rest in natural alphanumeric order.
    pub fn compare(&self, other: &CellValue) -> Option<Ordering> {
        if self.is_missing() || other.is_missing() {
            return None;
        }
        Some(match (self.sort_key(), other.sort_key()) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(&b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(&b),
            (SortKey::Other, SortKey::Other) => {
                compare_alphanumeric(&self.to_plain_string(), &other.to_plain_string())
            }
            (a, b) => a.rank().cmp(&b.rank()),
        })
    }

    fn sort_key(&self) -> SortKey {
        if let Some(n) = self.as_number() {
            SortKey::Number(n)
        } else if let Some(d) = self.as_date() {
            SortKey::Date(d)
        } else {
            SortKey::Other
        }
    }
}

enum SortKey {
    Number(f64),
    Date(NaiveDate),
    Other,
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Date(_) => 1,
            SortKey::Other => 2,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Parses a calendar date from `YYYY-MM-DD`, RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|dt| dt.date())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Case-insensitive natural ordering: runs of digits compare by value, everything else by
/// character, so "item2" sorts before "item10".
pub fn compare_alphanumeric(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                let ord = na
                    .trim_start_matches('0')
                    .len()
                    .cmp(&nb.trim_start_matches('0').len())
                    .then_with(|| na.trim_start_matches('0').cmp(nb.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        it.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parse_from_text() {
        assert_eq!(CellValue::text(" 42.5 ").as_number(), Some(42.5));
        assert_eq!(CellValue::text("abc").as_number(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::Number(f64::INFINITY).as_number(), None);
        assert_eq!(CellValue::text("inf").as_number(), None);
        assert_eq!(CellValue::text("-Infinity").as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
    }

    #[test]
    fn dates_parse_from_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("2024-01-15T08:30:00Z"), Some(expected));
        assert_eq!(parse_date("2024-01-15 08:30:00.000"), Some(expected));
        assert_eq!(parse_date("15/01/2024"), None);
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn plain_strings() {
        assert_eq!(CellValue::Number(150.0).to_plain_string(), "150");
        assert_eq!(CellValue::Number(1.25).to_plain_string(), "1.25");
        assert_eq!(CellValue::tags(["a", "b"]).to_plain_string(), "a, b");
        assert_eq!(CellValue::Null.to_plain_string(), "");
    }

    #[test]
    fn alphanumeric_order_is_natural_and_case_insensitive() {
        assert_eq!(compare_alphanumeric("item2", "item10"), Ordering::Less);
        assert_eq!(compare_alphanumeric("Apple", "banana"), Ordering::Less);
        assert_eq!(compare_alphanumeric("abc", "ABC"), Ordering::Equal);
        assert_eq!(compare_alphanumeric("a", "ab"), Ordering::Less);
        assert_eq!(compare_alphanumeric("x007", "x7"), Ordering::Equal);
    }

    #[test]
    fn compare_mixed_cells() {
        assert_eq!(
            CellValue::Number(2.0).compare(&CellValue::text("10")),
            Some(Ordering::Less)
        );
        assert_eq!(CellValue::Null.compare(&CellValue::Number(1.0)), None);
        assert_eq!(CellValue::Number(f64::NAN).compare(&CellValue::Number(1.0)), None);
        assert_eq!(
            CellValue::text("10").compare(&CellValue::text("apple")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn text_comparison_is_transitive() {
        let cells = ["9", "1e1", "1f", "item2", "2024-01-01", "10", "A"].map(CellValue::text);
        for a in &cells {
            for b in &cells {
                for c in &cells {
                    let ab = a.compare(b).unwrap();
                    let bc = b.compare(c).unwrap();
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(a.compare(c), Some(Ordering::Greater), "{a:?} {b:?} {c:?}");
                    }
                }
            }
        }
    }
}
