//! Row models: the data as a tree of rows, then filtered, sorted, expanded and paginated.

use std::cmp::Ordering;

use tracing::trace;

use crate::column::ColumnDef;
use crate::expand::{ExpandedState, SubRowsFn};
use crate::filter::{ColumnFilters, FilterValue};
use crate::state::{Pagination, SortSpec};
use crate::value::{CellValue, Record};

/// A record placed in the table. Ids are index paths into the data: `"3"`, `"3.1"`.
#[derive(Debug)]
pub struct Row<'a, R> {
    pub id: String,
    pub index: usize,
    pub depth: usize,
    pub original: &'a R,
    pub sub_rows: Vec<Row<'a, R>>,
}

impl<R> Clone for Row<'_, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            index: self.index,
            depth: self.depth,
            original: self.original,
            sub_rows: self.sub_rows.clone(),
        }
    }
}

impl<R: Record> Row<'_, R> {
    pub fn value(&self, column: &ColumnDef) -> CellValue {
        column
            .key()
            .map(|key| self.original.field(key))
            .unwrap_or_default()
    }
}

impl<R> Row<'_, R> {
    pub fn can_expand(&self, has_detail: bool) -> bool {
        has_detail || !self.sub_rows.is_empty()
    }
}

pub fn core_rows<R>(data: &[R], sub_rows: Option<SubRowsFn<R>>) -> Vec<Row<'_, R>> {
    build_level(data, sub_rows, None, 0)
}

fn build_level<'a, R>(
    data: &'a [R],
    sub_rows: Option<SubRowsFn<R>>,
    parent: Option<&str>,
    depth: usize,
) -> Vec<Row<'a, R>> {
    data.iter()
        .enumerate()
        .map(|(index, original)| {
            let id = match parent {
                Some(parent) => format!("{parent}.{index}"),
                None => index.to_string(),
            };
            let children = sub_rows
                .and_then(|children| children(original))
                .map(|children| build_level(children, sub_rows, Some(id.as_str()), depth + 1))
                .unwrap_or_default();
            Row {
                id,
                index,
                depth,
                original,
                sub_rows: children,
            }
        })
        .collect()
}

/// Keeps rows passing every column filter. Sub rows of kept rows are filtered in turn,
/// a dropped row takes its sub rows with it.
pub fn filter_rows<'a, R: Record>(
    rows: Vec<Row<'a, R>>,
    columns: &[ColumnDef],
    filters: &ColumnFilters,
) -> Vec<Row<'a, R>> {
    if filters.is_empty() {
        return rows;
    }
    let active: Vec<_> = filters
        .iter()
        .filter_map(|(column_id, value)| {
            let column = columns.iter().find(|c| c.id == column_id);
            if column.is_none() {
                trace!("Ignoring filter on unknown column {column_id}");
            }
            column.and_then(ColumnDef::key).map(|key| (key, value))
        })
        .collect();
    filter_level(rows, &active)
}

fn filter_level<'a, R: Record>(
    rows: Vec<Row<'a, R>>,
    active: &[(&str, &FilterValue)],
) -> Vec<Row<'a, R>> {
    rows.into_iter()
        .filter(|row| {
            active
                .iter()
                .all(|(key, value)| value.matches(&row.original.field(key)))
        })
        .map(|mut row| {
            row.sub_rows = filter_level(std::mem::take(&mut row.sub_rows), active);
            row
        })
        .collect()
}

/// Stable sort of every level by the sort specs. Missing values go last in both directions.
pub fn sort_rows<R: Record>(rows: &mut [Row<'_, R>], columns: &[ColumnDef], sorting: &[SortSpec]) {
    let keys: Vec<(&str, bool)> = sorting
        .iter()
        .filter_map(|spec| {
            columns
                .iter()
                .find(|c| c.id == spec.column_id && c.can_sort())
                .and_then(ColumnDef::key)
                .map(|key| (key, spec.desc))
        })
        .collect();
    if keys.is_empty() {
        return;
    }
    sort_level(rows, &keys);
}

fn sort_level<R: Record>(rows: &mut [Row<'_, R>], keys: &[(&str, bool)]) {
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|(key, desc)| compare_cells(&a.original.field(key), &b.original.field(key), *desc))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    for row in rows.iter_mut() {
        sort_level(&mut row.sub_rows, keys);
    }
}

fn compare_cells(a: &CellValue, b: &CellValue, desc: bool) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a.compare(b).unwrap_or(Ordering::Equal);
            if desc { ord.reverse() } else { ord }
        }
    }
}

/// Flattens the tree: every row followed by its sub rows when it is expanded.
pub fn expand_rows<'a, R>(rows: &[Row<'a, R>], expanded: &ExpandedState) -> Vec<Row<'a, R>> {
    let mut flat = Vec::with_capacity(rows.len());
    push_expanded(rows, expanded, &mut flat);
    flat
}

fn push_expanded<'a, R>(rows: &[Row<'a, R>], expanded: &ExpandedState, out: &mut Vec<Row<'a, R>>) {
    for row in rows {
        out.push(row.clone());
        if !row.sub_rows.is_empty() && expanded.is_expanded(&row.id) {
            push_expanded(&row.sub_rows, expanded, out);
        }
    }
}

pub fn paginate<'a, R>(rows: &[Row<'a, R>], pagination: &Pagination) -> Vec<Row<'a, R>> {
    rows[pagination.range(rows.len())].to_vec()
}

/// Ids of every row in the tree that has sub rows.
pub fn expandable_ids<R>(rows: &[Row<'_, R>], has_detail: bool, out: &mut Vec<String>) {
    for row in rows {
        if row.can_expand(has_detail) {
            out.push(row.id.clone());
        }
        expandable_ids(&row.sub_rows, has_detail, out);
    }
}
