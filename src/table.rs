//! `DataTable`: columns, records, options and view state behind one entry point.

use derive_setters::Setters;
use tracing::{debug, trace};

use crate::column::{ColumnDef, FilterKind};
use crate::domain::GridError;
use crate::expand::{SubRowsFn, with_expand_column};
use crate::filter::FilterValue;
use crate::rows::{self, Row};
use crate::state::{Direction, TableAction, TableViewState};
use crate::value::{CellValue, Record};

/// Renders the detail view of an expanded row as plain lines.
pub type DetailRenderer<R> = Box<dyn Fn(&R) -> Vec<String>>;

/// Called with the new column order after a column was moved.
pub type ColumnOrderCallback = Box<dyn FnMut(&[String])>;

#[derive(Debug, Clone, PartialEq, Setters)]
pub struct TableOptions {
    /// Column the toolbar search box filters.
    #[setters(into)]
    pub filter_column: String,
    #[setters(into)]
    pub filter_placeholder: String,
    /// Show per column filter widgets.
    pub enable_column_search: bool,
    pub show_toolbar: bool,
    pub show_pagination: bool,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Stretch the table to the available width.
    pub full_width: bool,
    pub enable_column_reordering: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            filter_column: "email".to_string(),
            filter_placeholder: "Filter invoices...".to_string(),
            enable_column_search: false,
            show_toolbar: true,
            show_pagination: true,
            page_size: 10,
            page_size_options: vec![10, 20, 30, 40, 50],
            full_width: true,
            enable_column_reordering: false,
        }
    }
}

/// The rows a table currently shows, and the counts around them.
pub struct RowModel<'a, R> {
    /// Top level rows after filtering and sorting, sub rows still nested.
    pub filtered: Vec<Row<'a, R>>,
    /// Rows of the current page, expanded sub rows flattened in.
    pub rows: Vec<Row<'a, R>>,
    /// Flattened rows before pagination.
    pub row_count: usize,
    pub page_count: usize,
}

pub struct DataTable<R> {
    base_columns: Vec<ColumnDef>,
    columns: Vec<ColumnDef>,
    data: Vec<R>,
    options: TableOptions,
    sub_rows: Option<SubRowsFn<R>>,
    detail: Option<DetailRenderer<R>>,
    on_column_reorder: Option<ColumnOrderCallback>,
    state: TableViewState,
}

impl<R: Record> DataTable<R> {
    pub fn new(columns: Vec<ColumnDef>, data: Vec<R>, options: TableOptions) -> Self {
        let state = TableViewState::new(Vec::new(), options.page_size);
        let mut table = Self {
            base_columns: columns,
            columns: Vec::new(),
            data,
            options,
            sub_rows: None,
            detail: None,
            on_column_reorder: None,
            state,
        };
        table.refresh_columns();
        table
    }

    /// Rows nest rows of the same type through `sub_rows`.
    pub fn with_sub_rows(mut self, sub_rows: SubRowsFn<R>) -> Self {
        self.sub_rows = Some(sub_rows);
        self.refresh_columns();
        self
    }

    /// Expanded rows show the lines `renderer` produces below them.
    pub fn with_detail(mut self, renderer: impl Fn(&R) -> Vec<String> + 'static) -> Self {
        self.detail = Some(Box::new(renderer));
        self.refresh_columns();
        self
    }

    pub fn on_column_reorder(mut self, callback: impl FnMut(&[String]) + 'static) -> Self {
        self.on_column_reorder = Some(Box::new(callback));
        self
    }

    fn refresh_columns(&mut self) {
        self.columns = with_expand_column(
            self.base_columns.clone(),
            &self.data,
            self.sub_rows,
            self.detail.is_some(),
        );
        self.state.column_order = self.columns.iter().map(|c| c.id.clone()).collect();
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn state(&self) -> &TableViewState {
        &self.state
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// All columns in display order.
    pub fn ordered_columns(&self) -> Vec<&ColumnDef> {
        self.state
            .column_order
            .iter()
            .filter_map(|id| self.column(id))
            .collect()
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.ordered_columns()
            .into_iter()
            .filter(|c| self.state.is_visible(&c.id))
            .collect()
    }

    /// Current width of a column in pixels.
    pub fn column_size(&self, column: &ColumnDef) -> u16 {
        self.state
            .column_sizing
            .get(&column.id)
            .copied()
            .unwrap_or(column.size)
    }

    /// Width of all visible columns in pixels.
    pub fn total_size(&self) -> u32 {
        self.visible_columns()
            .iter()
            .map(|c| self.column_size(c) as u32)
            .sum()
    }

    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }

    pub fn detail_lines(&self, row: &Row<'_, R>) -> Option<Vec<String>> {
        self.detail.as_ref().map(|render| render(row.original))
    }

    pub fn is_expanded(&self, row: &Row<'_, R>) -> bool {
        row.can_expand(self.has_detail()) && self.state.expanded.is_expanded(&row.id)
    }

    pub fn is_selected(&self, row: &Row<'_, R>) -> bool {
        self.state.row_selection.contains(&row.id)
    }

    /// Column the toolbar search targets: the configured one, else the first filterable column.
    pub fn toolbar_column(&self) -> Option<&ColumnDef> {
        self.column(&self.options.filter_column)
            .filter(|c| c.can_filter())
            .or_else(|| self.columns.iter().find(|c| c.can_filter()))
    }

    pub fn toolbar_value(&self) -> String {
        self.toolbar_column()
            .and_then(|c| self.state.column_filters.get(&c.id))
            .map(|v| match v {
                FilterValue::Text(s) => s.clone(),
                other => other.summary(&FilterKind::Text),
            })
            .unwrap_or_default()
    }

    pub fn filter_value(&self, column_id: &str) -> Option<&FilterValue> {
        self.state.column_filters.get(column_id)
    }

    pub fn row_model(&self) -> RowModel<'_, R> {
        let core = rows::core_rows(&self.data, self.sub_rows);
        let mut filtered = rows::filter_rows(core, &self.columns, &self.state.column_filters);
        rows::sort_rows(&mut filtered, &self.columns, &self.state.sorting);
        let flat = rows::expand_rows(&filtered, &self.state.expanded);
        let page = rows::paginate(&flat, &self.state.pagination);
        RowModel {
            row_count: flat.len(),
            page_count: self.state.pagination.page_count(flat.len()),
            filtered,
            rows: page,
        }
    }

    /// Every row that passes the filters, in display order, expanded sub rows included.
    pub fn filtered_records(&self) -> Vec<&R> {
        let model = self.row_model();
        rows::expand_rows(&model.filtered, &self.state.expanded)
            .into_iter()
            .map(|row| row.original)
            .collect()
    }

    /// Records of the current page.
    pub fn page_records(&self) -> Vec<&R> {
        self.row_model()
            .rows
            .into_iter()
            .map(|row| row.original)
            .collect()
    }

    /// Selected rows that pass the filters, at any depth.
    pub fn selected_count(&self) -> usize {
        fn count<R>(rows: &[Row<'_, R>], state: &TableViewState) -> usize {
            rows.iter()
                .map(|r| usize::from(state.row_selection.contains(&r.id)) + count(&r.sub_rows, state))
                .sum()
        }
        count(&self.row_model().filtered, &self.state)
    }

    pub fn is_all_rows_expanded(&self) -> bool {
        if self.state.expanded.is_all() {
            return true;
        }
        let ids = self.expandable_ids();
        !ids.is_empty() && ids.iter().all(|id| self.state.expanded.is_expanded(id))
    }

    fn expandable_ids(&self) -> Vec<String> {
        let core = rows::core_rows(&self.data, self.sub_rows);
        let mut ids = Vec::new();
        rows::expandable_ids(&core, self.has_detail(), &mut ids);
        ids
    }

    /// Sets a column filter. The value has to fit the column's filter kind; text values fit
    /// every field column.
    pub fn set_filter(&mut self, column_id: &str, value: Option<FilterValue>) -> Result<(), GridError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| GridError::UnknownColumn(column_id.to_string()))?;
        if let Some(v) = &value
            && (!column.can_filter() || !v.fits(&column.filter))
        {
            return Err(GridError::FilterKindMismatch(column_id.to_string()));
        }
        trace!("Filter {column_id} => {value:?}");
        self.state.column_filters.set(column_id, value);
        self.state.pagination.page_index = 0;
        Ok(())
    }

    /// Applies one action to the view state.
    pub fn dispatch(&mut self, action: TableAction) -> Result<(), GridError> {
        trace!("Dispatch {action:?}");
        match action {
            TableAction::ToggleSorting(column_id) => {
                let column = self
                    .column(&column_id)
                    .ok_or_else(|| GridError::UnknownColumn(column_id.clone()))?;
                if !column.can_sort() {
                    debug!("Column {column_id} is not sortable");
                    return Ok(());
                }
                let desc_first = self.sorts_descending_first(column);
                self.state.toggle_sorting(&column_id, desc_first);
                self.state.pagination.page_index = 0;
            }
            TableAction::ClearSorting => {
                self.state.sorting.clear();
                self.state.pagination.page_index = 0;
            }
            TableAction::SetFilter(column_id, value) => self.set_filter(&column_id, value)?,
            TableAction::ResetFilter(column_id) => self.set_filter(&column_id, None)?,
            TableAction::ResetFilters => {
                self.state.column_filters.clear();
                self.state.pagination.page_index = 0;
            }
            TableAction::ToggleColumnVisibility(column_id) => {
                let column = self
                    .column(&column_id)
                    .ok_or_else(|| GridError::UnknownColumn(column_id.clone()))?;
                if column.enable_hiding {
                    let visible = self.state.is_visible(&column_id);
                    if visible {
                        self.state.column_visibility.insert(column_id, false);
                    } else {
                        self.state.column_visibility.remove(&column_id);
                    }
                }
            }
            TableAction::ToggleRowSelected(row_id) => self.state.toggle_row_selected(&row_id),
            TableAction::ToggleAllPageRowsSelected => {
                let ids: Vec<String> = self.row_model().rows.into_iter().map(|r| r.id).collect();
                let all_selected =
                    !ids.is_empty() && ids.iter().all(|id| self.state.row_selection.contains(id));
                for id in ids {
                    if all_selected {
                        self.state.row_selection.remove(&id);
                    } else {
                        self.state.row_selection.insert(id);
                    }
                }
            }
            TableAction::ToggleRowExpanded(row_id) => {
                let ids = self.expandable_ids();
                if ids.contains(&row_id) {
                    self.state
                        .expanded
                        .toggle(&row_id, ids.iter().map(String::as_str));
                }
            }
            TableAction::ToggleAllRowsExpanded => {
                let all = self.is_all_rows_expanded();
                self.state.expanded.toggle_all(all);
            }
            TableAction::ResizeColumn(column_id, delta) => {
                let column = self
                    .column(&column_id)
                    .ok_or_else(|| GridError::UnknownColumn(column_id.clone()))?;
                if column.enable_resizing {
                    let size = column.clamp_size(self.column_size(column) as i32 + delta);
                    self.state.column_sizing.insert(column_id, size);
                }
            }
            TableAction::MoveColumn(column_id, direction) => self.move_column(&column_id, direction),
            TableAction::SetPageIndex(index) => {
                let count = self.row_model().row_count;
                self.state.pagination.set_page_index(index, count);
            }
            TableAction::NextPage => {
                let count = self.row_model().row_count;
                if self.state.pagination.can_next(count) {
                    self.state.pagination.page_index += 1;
                }
            }
            TableAction::PreviousPage => {
                if self.state.pagination.can_previous() {
                    self.state.pagination.page_index -= 1;
                }
            }
            TableAction::FirstPage => self.state.pagination.page_index = 0,
            TableAction::LastPage => {
                let count = self.row_model().row_count;
                self.state.pagination.set_page_index(usize::MAX, count);
            }
            TableAction::SetPageSize(size) => self.state.pagination.set_page_size(size),
        }
        Ok(())
    }

    /// Text sorts ascending first, everything else descending first; decided by the first record.
    fn sorts_descending_first(&self, column: &ColumnDef) -> bool {
        let first = self
            .data
            .first()
            .zip(column.key())
            .map(|(record, key)| record.field(key))
            .unwrap_or_default();
        !matches!(first, CellValue::Text(_))
    }

    fn move_column(&mut self, column_id: &str, direction: Direction) {
        if !self.options.enable_column_reordering {
            return;
        }
        if self.state.move_column(column_id, direction) {
            debug!("Column order: {:?}", self.state.column_order);
            if let Some(callback) = self.on_column_reorder.as_mut() {
                callback(&self.state.column_order);
            }
        }
    }
}
