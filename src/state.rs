//! The table view state and the actions that change it.
//!
//! All interactive state of a table lives in one [`TableViewState`]. It only changes through
//! [`crate::table::DataTable::dispatch`], which resolves each [`TableAction`] against the
//! current columns and row model.

use std::collections::{HashMap, HashSet};

use crate::expand::ExpandedState;
use crate::filter::{ColumnFilters, FilterValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column_id: String,
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size)
    }

    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self, row_count: usize) -> bool {
        self.page_index + 1 < self.page_count(row_count)
    }

    /// Clamps into `0..page_count`, an empty table keeps page 0.
    pub fn set_page_index(&mut self, index: usize, row_count: usize) {
        let last = self.page_count(row_count).saturating_sub(1);
        self.page_index = index.min(last);
    }

    /// Changes the page size and moves to the page that holds the row previously on top.
    pub fn set_page_size(&mut self, size: usize) {
        let size = size.max(1);
        let top_row = self.page_index * self.page_size;
        self.page_index = top_row / size;
        self.page_size = size;
    }

    pub fn range(&self, row_count: usize) -> std::ops::Range<usize> {
        let start = (self.page_index * self.page_size).min(row_count);
        let end = (start + self.page_size).min(row_count);
        start..end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Everything a user can do to a table view.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    ToggleSorting(String),
    ClearSorting,
    SetFilter(String, Option<FilterValue>),
    ResetFilter(String),
    ResetFilters,
    ToggleColumnVisibility(String),
    ToggleRowSelected(String),
    ToggleAllPageRowsSelected,
    ToggleRowExpanded(String),
    ToggleAllRowsExpanded,
    ResizeColumn(String, i32),
    MoveColumn(String, Direction),
    SetPageIndex(usize),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    SetPageSize(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableViewState {
    pub sorting: Vec<SortSpec>,
    pub column_filters: ColumnFilters,
    /// Only hidden columns are recorded; a missing entry means visible.
    pub column_visibility: HashMap<String, bool>,
    pub row_selection: HashSet<String>,
    pub expanded: ExpandedState,
    /// Column widths in pixels that differ from the column defaults.
    pub column_sizing: HashMap<String, u16>,
    pub column_order: Vec<String>,
    pub pagination: Pagination,
}

impl TableViewState {
    pub fn new(column_order: Vec<String>, page_size: usize) -> Self {
        Self {
            sorting: Vec::new(),
            column_filters: ColumnFilters::default(),
            column_visibility: HashMap::new(),
            row_selection: HashSet::new(),
            expanded: ExpandedState::default(),
            column_sizing: HashMap::new(),
            column_order,
            pagination: Pagination::new(page_size),
        }
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.column_visibility.get(column_id).copied().unwrap_or(true)
    }

    pub fn sort_direction(&self, column_id: &str) -> Option<bool> {
        self.sorting
            .iter()
            .find(|s| s.column_id == column_id)
            .map(|s| s.desc)
    }

    /// Single column sort cycle: unsorted, first direction, the other direction, unsorted.
    pub fn toggle_sorting(&mut self, column_id: &str, desc_first: bool) {
        let next = match self.sort_direction(column_id) {
            None => Some(desc_first),
            Some(desc) if desc == desc_first => Some(!desc_first),
            Some(_) => None,
        };
        self.sorting.clear();
        if let Some(desc) = next {
            self.sorting.push(SortSpec {
                column_id: column_id.to_string(),
                desc,
            });
        }
    }

    /// Moves a column one slot; returns whether the order changed.
    pub fn move_column(&mut self, column_id: &str, direction: Direction) -> bool {
        let Some(pos) = self.column_order.iter().position(|id| id == column_id) else {
            return false;
        };
        let target = match direction {
            Direction::Left if pos > 0 => pos - 1,
            Direction::Right if pos + 1 < self.column_order.len() => pos + 1,
            _ => return false,
        };
        self.column_order.swap(pos, target);
        true
    }

    pub fn toggle_row_selected(&mut self, row_id: &str) {
        if !self.row_selection.remove(row_id) {
            self.row_selection.insert(row_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TableViewState {
        TableViewState::new(vec!["a".into(), "b".into(), "c".into()], 10)
    }

    #[test]
    fn sort_cycle_text_first_ascending() {
        let mut s = state();
        s.toggle_sorting("a", false);
        assert_eq!(s.sort_direction("a"), Some(false));
        s.toggle_sorting("a", false);
        assert_eq!(s.sort_direction("a"), Some(true));
        s.toggle_sorting("a", false);
        assert_eq!(s.sort_direction("a"), None);
        assert!(s.sorting.is_empty());
    }

    #[test]
    fn sort_cycle_number_first_descending() {
        let mut s = state();
        s.toggle_sorting("b", true);
        assert_eq!(s.sort_direction("b"), Some(true));
        s.toggle_sorting("b", true);
        assert_eq!(s.sort_direction("b"), Some(false));
    }

    #[test]
    fn sorting_another_column_replaces() {
        let mut s = state();
        s.toggle_sorting("a", false);
        s.toggle_sorting("b", true);
        assert_eq!(s.sorting.len(), 1);
        assert_eq!(s.sort_direction("a"), None);
    }

    #[test]
    fn pagination_counts() {
        let mut p = Pagination::new(10);
        assert_eq!(p.page_count(0), 0);
        assert_eq!(p.page_count(25), 3);
        assert!(!p.can_previous());
        assert!(p.can_next(25));
        p.set_page_index(7, 25);
        assert_eq!(p.page_index, 2);
        assert!(!p.can_next(25));
        assert_eq!(p.range(25), 20..25);
        p.set_page_index(3, 0);
        assert_eq!(p.page_index, 0);
        assert_eq!(p.range(0), 0..0);
    }

    #[test]
    fn page_size_change_keeps_top_row() {
        let mut p = Pagination::new(10);
        p.page_index = 3; // rows 30..40
        p.set_page_size(20);
        assert_eq!(p.page_index, 1); // rows 20..40
        p.set_page_size(5);
        assert_eq!(p.page_index, 4); // rows 20..25
    }

    #[test]
    fn moves_columns_within_bounds() {
        let mut s = state();
        assert!(!s.move_column("a", Direction::Left));
        assert!(s.move_column("a", Direction::Right));
        assert_eq!(s.column_order, vec!["b", "a", "c"]);
        assert!(!s.move_column("c", Direction::Right));
        assert!(!s.move_column("zzz", Direction::Left));
    }

    #[test]
    fn selection_toggles() {
        let mut s = state();
        s.toggle_row_selected("3");
        assert!(s.row_selection.contains("3"));
        s.toggle_row_selected("3");
        assert!(s.row_selection.is_empty());
    }

    #[test]
    fn visibility_defaults_to_visible() {
        let mut s = state();
        assert!(s.is_visible("a"));
        s.column_visibility.insert("a".into(), false);
        assert!(!s.is_visible("a"));
    }
}
