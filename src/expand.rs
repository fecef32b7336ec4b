//! Row expansion: the injected expand column and the expanded-row state.

use std::collections::HashSet;

use crate::column::ColumnDef;

/// Child accessor of a table whose rows nest rows of the same type.
pub type SubRowsFn<R> = fn(&R) -> Option<&[R]>;

/// Prepends the expand toggle column when rows can expand at all: some row has children
/// through `sub_rows`, or a detail view is configured. Otherwise the columns come back as is.
pub fn with_expand_column<R>(
    columns: Vec<ColumnDef>,
    data: &[R],
    sub_rows: Option<SubRowsFn<R>>,
    has_detail: bool,
) -> Vec<ColumnDef> {
    let has_sub_rows = sub_rows.is_some_and(|children| {
        data.iter()
            .any(|row| children(row).is_some_and(|c| !c.is_empty()))
    });
    if !has_sub_rows && !has_detail {
        return columns;
    }

    let mut augmented = Vec::with_capacity(columns.len() + 1);
    augmented.push(ColumnDef::expander());
    augmented.extend(columns);
    augmented
}

/// Which rows are expanded. `All` is the state the "expand all" toggle produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandedState {
    All,
    Rows(HashSet<String>),
}

impl Default for ExpandedState {
    fn default() -> Self {
        ExpandedState::Rows(HashSet::new())
    }
}

impl ExpandedState {
    pub fn is_expanded(&self, row_id: &str) -> bool {
        match self {
            ExpandedState::All => true,
            ExpandedState::Rows(ids) => ids.contains(row_id),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ExpandedState::All)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ExpandedState::All => false,
            ExpandedState::Rows(ids) => ids.is_empty(),
        }
    }

    /// Flips one row. Leaving `All` keeps every other expandable row open.
    pub fn toggle<'a>(&mut self, row_id: &str, expandable: impl IntoIterator<Item = &'a str>) {
        match self {
            ExpandedState::All => {
                let ids = expandable
                    .into_iter()
                    .filter(|id| *id != row_id)
                    .map(str::to_string)
                    .collect();
                *self = ExpandedState::Rows(ids);
            }
            ExpandedState::Rows(ids) => {
                if !ids.remove(row_id) {
                    ids.insert(row_id.to_string());
                }
            }
        }
    }

    /// Expands everything unless everything already is, in which case it collapses all.
    pub fn toggle_all(&mut self, all_expanded: bool) {
        *self = if all_expanded {
            ExpandedState::default()
        } else {
            ExpandedState::All
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::EXPAND_COLUMN_ID;

    struct Node {
        children: Vec<Node>,
    }

    fn children(node: &Node) -> Option<&[Node]> {
        Some(&node.children)
    }

    fn columns() -> Vec<ColumnDef> {
        vec![ColumnDef::field("name", "Name"), ColumnDef::field("budget", "Budget")]
    }

    #[test]
    fn no_expand_column_without_mechanism() {
        let data = vec![Node { children: vec![] }];
        let cols = with_expand_column(columns(), &data, None, false);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].id, "name");
    }

    #[test]
    fn no_expand_column_when_no_row_has_children() {
        let data = vec![Node { children: vec![] }, Node { children: vec![] }];
        let cols = with_expand_column(columns(), &data, Some(children), false);
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn expand_column_for_children_or_detail() {
        let data = vec![Node { children: vec![] }, Node {
            children: vec![Node { children: vec![] }],
        }];
        let cols = with_expand_column(columns(), &data, Some(children), false);
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].id, EXPAND_COLUMN_ID);

        let empty: Vec<Node> = Vec::new();
        let cols = with_expand_column(columns(), &empty, None, true);
        assert_eq!(cols[0].id, EXPAND_COLUMN_ID);
    }

    #[test]
    fn toggling_rows() {
        let mut state = ExpandedState::default();
        state.toggle("1", []);
        assert!(state.is_expanded("1"));
        state.toggle("1", []);
        assert!(!state.is_expanded("1"));
        assert!(state.is_empty());
    }

    #[test]
    fn toggling_a_row_out_of_all() {
        let mut state = ExpandedState::default();
        state.toggle_all(false);
        assert!(state.is_all());
        assert!(state.is_expanded("7"));

        state.toggle("1", ["0", "1", "2"]);
        assert!(!state.is_expanded("1"));
        assert!(state.is_expanded("0"));
        assert!(state.is_expanded("2"));

        state.toggle_all(true);
        assert!(state.is_empty());
    }
}
