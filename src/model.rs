use std::path::PathBuf;
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, trace, warn};

use crate::column::{ColumnDef, PIXELS_PER_CHAR};
use crate::domain::{AppConfig, GridError, HELP_TEXT, Message};
use crate::editor::{EditorEvent, FilterEditor};
use crate::export::ExportScope;
use crate::filter::FilterValue;
use crate::inputter::{InputResult, Inputter};
use crate::rows::Row;
use crate::state::{Direction, TableAction};
use crate::table::DataTable;
use crate::value::{CellValue, Record};

/// Pixels a column grows or shrinks per key press.
pub const RESIZE_STEP: i32 = 2 * PIXELS_PER_CHAR as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modus {
    Table,
    FilterEdit,
    Search,
    Columns,
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Exiting,
}

pub struct Model<R> {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    table: DataTable<R>,
    export_path: PathBuf,
    cursor_row: usize,
    cursor_column: usize,
    editor: Option<FilterEditor>,
    search: Inputter,
    last_input: InputResult,
    columns_cursor: usize,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
    clipboard: Option<Clipboard>,
    width: usize,
    height: usize,
}

impl<R: Record> Model<R> {
    pub fn new(name: impl Into<String>, table: DataTable<R>, config: &AppConfig) -> Self {
        let name = name.into();
        let status_message = format!("Loaded {} ({} rows)", name, table.data().len());
        let mut model = Self {
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            name,
            table,
            export_path: PathBuf::from(&config.export_path),
            cursor_row: 0,
            cursor_column: 0,
            editor: None,
            search: Inputter::default(),
            last_input: InputResult::default(),
            columns_cursor: 0,
            popup_message: String::new(),
            status_message,
            last_status_message_update: Instant::now(),
            clipboard: None,
            width: 0,
            height: 0,
        };
        model.cursor_column = model.first_field_column();
        model
    }

    pub fn table(&self) -> &DataTable<R> {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn editor(&self) -> Option<&FilterEditor> {
        self.editor.as_ref()
    }

    pub fn search_input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn columns_cursor(&self) -> usize {
        self.columns_cursor
    }

    pub fn popup_message(&self) -> &str {
        &self.popup_message
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Columns listed in the visibility popup.
    pub fn hideable_columns(&self) -> Vec<&ColumnDef> {
        self.table
            .ordered_columns()
            .into_iter()
            .filter(|c| c.enable_hiding)
            .collect()
    }

    /// Inputs and filter widgets read keys unmapped.
    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::FilterEdit | Modus::Search)
    }

    pub fn quit(&mut self) {
        self.status = Status::Exiting;
    }

    pub fn update(&mut self, message: Message) -> Result<(), GridError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        if let Message::Resize(width, height) = message {
            self.width = width;
            self.height = height;
            return Ok(());
        }
        match self.modus {
            Modus::Table => self.update_table(message),
            Modus::FilterEdit => {
                if let Message::RawKey(key) = message {
                    self.filter_input(key);
                }
            }
            Modus::Search => {
                if let Message::RawKey(key) = message {
                    self.search_input_key(key);
                }
            }
            Modus::Columns => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.columns_cursor = self.columns_cursor.saturating_sub(1),
                Message::MoveDown => {
                    let count = self.hideable_columns().len();
                    if self.columns_cursor + 1 < count {
                        self.columns_cursor += 1;
                    }
                }
                Message::ToggleSelect | Message::ToggleExpand => self.toggle_column_visibility(),
                Message::Exit | Message::Columns => self.exit(),
                _ => (),
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help | Message::ToggleExpand => self.exit(),
                _ => (),
            },
        }
        Ok(())
    }

    fn update_table(&mut self, message: Message) {
        match message {
            Message::Quit => self.quit(),
            Message::Exit => self.exit(),
            Message::Help => self.show_help(),
            Message::MoveUp => self.cursor_row = self.cursor_row.saturating_sub(1),
            Message::MoveDown => {
                let rows = self.table.row_model().rows.len();
                if self.cursor_row + 1 < rows {
                    self.cursor_row += 1;
                }
            }
            Message::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
            Message::MoveRight => {
                let columns = self.table.visible_columns().len();
                if self.cursor_column + 1 < columns {
                    self.cursor_column += 1;
                }
            }
            Message::ToggleSort => {
                if let Some(id) = self.current_column_id() {
                    self.apply(TableAction::ToggleSorting(id));
                    self.cursor_row = 0;
                }
            }
            Message::EditFilter => self.open_filter_editor(),
            Message::Search => self.open_search(),
            Message::ResetFilters => {
                self.apply(TableAction::ResetFilters);
                self.set_status_message("Filters reset");
            }
            Message::ToggleSelect => {
                if let Some(id) = self.current_row_id() {
                    self.apply(TableAction::ToggleRowSelected(id));
                }
            }
            Message::ToggleSelectPage => self.apply(TableAction::ToggleAllPageRowsSelected),
            Message::ToggleExpand => {
                if let Some(id) = self.current_row_id() {
                    self.apply(TableAction::ToggleRowExpanded(id));
                }
            }
            Message::ToggleExpandAll => self.apply(TableAction::ToggleAllRowsExpanded),
            Message::NextPage => self.apply(TableAction::NextPage),
            Message::PreviousPage => self.apply(TableAction::PreviousPage),
            Message::FirstPage => self.apply(TableAction::FirstPage),
            Message::LastPage => self.apply(TableAction::LastPage),
            Message::CyclePageSize => self.cycle_page_size(),
            Message::GrowColumn => self.resize_column(RESIZE_STEP),
            Message::ShrinkColumn => self.resize_column(-RESIZE_STEP),
            Message::MoveColumnLeft => self.move_column(Direction::Left),
            Message::MoveColumnRight => self.move_column(Direction::Right),
            Message::Columns => self.open_columns(),
            Message::CopyRowId => self.copy_row_id(),
            Message::Export => self.export(),
            Message::Resize(_, _) | Message::RawKey(_) => (),
        }
        self.clamp_cursor();
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::Table => {}
            Modus::Popup | Modus::Columns | Modus::FilterEdit | Modus::Search => {
                trace!("Close {:?} ...", self.modus);
                self.modus = self.previous_modus;
                self.previous_modus = Modus::Table;
                self.editor = None;
            }
        }
        self.clamp_cursor();
    }

    fn enter_modus(&mut self, modus: Modus) {
        self.previous_modus = self.modus;
        self.modus = modus;
    }

    fn show_help(&mut self) {
        self.popup_message = HELP_TEXT.to_string();
        self.enter_modus(Modus::Popup);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    /// Runs a table action; a rejected action ends up in the status line.
    fn apply(&mut self, action: TableAction) {
        if let Err(e) = self.table.dispatch(action) {
            warn!("{e}");
            self.set_status_message(e.to_string());
        }
    }

    fn first_field_column(&self) -> usize {
        self.table
            .visible_columns()
            .iter()
            .position(|c| c.key().is_some())
            .unwrap_or(0)
    }

    fn current_column(&self) -> Option<&ColumnDef> {
        self.table.visible_columns().get(self.cursor_column).copied()
    }

    fn current_column_id(&self) -> Option<String> {
        self.current_column().map(|c| c.id.clone())
    }

    fn current_row<'a>(&'a self, rows: &'a [Row<'a, R>]) -> Option<&'a Row<'a, R>> {
        rows.get(self.cursor_row)
    }

    fn current_row_id(&self) -> Option<String> {
        let model = self.table.row_model();
        self.current_row(&model.rows).map(|r| r.id.clone())
    }

    fn clamp_cursor(&mut self) {
        let rows = self.table.row_model().rows.len();
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        let columns = self.table.visible_columns().len();
        self.cursor_column = self.cursor_column.min(columns.saturating_sub(1));
    }

    fn open_filter_editor(&mut self) {
        if !self.table.options().enable_column_search {
            self.set_status_message("Column filters are disabled");
            return;
        }
        let Some(column) = self.current_column() else {
            return;
        };
        let current = self.table.filter_value(&column.id);
        match FilterEditor::for_column(column, current) {
            Some(editor) => {
                debug!("Editing filter of {}", editor.column_id);
                self.editor = Some(editor);
                self.enter_modus(Modus::FilterEdit);
            }
            None => {
                let message = format!("Column \"{}\" has no filter", column.header);
                self.set_status_message(message);
            }
        }
    }

    fn filter_input(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            self.exit();
            return;
        };
        let column_id = editor.column_id.clone();
        match editor.handle_key(key) {
            EditorEvent::Nothing => {}
            EditorEvent::Update(value) => self.apply(TableAction::SetFilter(column_id, value)),
            EditorEvent::Commit(value) => {
                let cleared = value.is_none();
                self.apply(TableAction::SetFilter(column_id.clone(), value));
                if cleared {
                    self.set_status_message(format!("Filter on {column_id} cleared"));
                }
                self.exit();
            }
            EditorEvent::Invalid(e) => self.set_status_message(e.to_string()),
        }
        self.clamp_cursor();
    }

    fn open_search(&mut self) {
        if !self.table.options().show_toolbar {
            return;
        }
        if self.table.toolbar_column().is_none() {
            self.set_status_message("Nothing to search");
            return;
        }
        self.search.clear();
        self.search.set(&self.table.toolbar_value());
        self.last_input = self.search.get();
        self.enter_modus(Modus::Search);
    }

    fn search_input_key(&mut self, key: KeyEvent) {
        let Some(column_id) = self.table.toolbar_column().map(|c| c.id.clone()) else {
            self.exit();
            return;
        };
        if key.code == KeyCode::Esc {
            self.apply(TableAction::ResetFilter(column_id));
            self.search.clear();
            self.last_input = self.search.get();
            self.exit();
            return;
        }
        self.last_input = self.search.read(key);
        let value = Some(FilterValue::text(self.last_input.input.as_str()));
        self.apply(TableAction::SetFilter(column_id, value));
        if self.last_input.finished {
            self.exit();
        }
        self.clamp_cursor();
    }

    fn open_columns(&mut self) {
        self.columns_cursor = 0;
        self.enter_modus(Modus::Columns);
    }

    fn toggle_column_visibility(&mut self) {
        let id = self
            .hideable_columns()
            .get(self.columns_cursor)
            .map(|c| c.id.clone());
        if let Some(id) = id {
            self.apply(TableAction::ToggleColumnVisibility(id));
        }
    }

    fn cycle_page_size(&mut self) {
        let options = &self.table.options().page_size_options;
        if options.is_empty() {
            return;
        }
        let current = self.table.state().pagination.page_size;
        let next = options
            .iter()
            .position(|size| *size == current)
            .map_or(options[0], |i| options[(i + 1) % options.len()]);
        self.apply(TableAction::SetPageSize(next));
        self.set_status_message(format!("{next} rows per page"));
    }

    fn resize_column(&mut self, delta: i32) {
        if let Some(id) = self.current_column_id() {
            self.apply(TableAction::ResizeColumn(id, delta));
        }
    }

    fn move_column(&mut self, direction: Direction) {
        if !self.table.options().enable_column_reordering {
            self.set_status_message("Column reordering is disabled");
            return;
        }
        let Some(id) = self.current_column_id() else {
            return;
        };
        self.apply(TableAction::MoveColumn(id.clone(), direction));
        if let Some(pos) = self.table.visible_columns().iter().position(|c| c.id == id) {
            self.cursor_column = pos;
        }
    }

    /// The record's own `id` field, the row id when it has none.
    fn copy_row_id(&mut self) {
        let id = {
            let model = self.table.row_model();
            self.current_row(&model.rows).map(|row| match row.original.field("id") {
                CellValue::Null => row.id.clone(),
                value => value.to_plain_string(),
            })
        };
        let Some(id) = id else {
            return;
        };
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    warn!("No clipboard: {e}");
                    self.set_status_message(format!("Clipboard unavailable: {e}"));
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(id.clone()) {
                Ok(_) => self.set_status_message(format!("Copied \"{id}\"")),
                Err(e) => self.set_status_message(format!("Copy failed: {e}")),
            }
        }
    }

    fn export(&mut self) {
        let start_time = Instant::now();
        match self.table.export(ExportScope::Page, &self.export_path) {
            Ok(rows) => {
                info!(
                    "Export took {}ms ...",
                    start_time.elapsed().as_millis()
                );
                let message = format!("Exported {rows} rows to {}", self.export_path.display());
                self.set_status_message(message);
            }
            Err(e) => {
                warn!("{e}");
                self.set_status_message(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::crossterm::event::KeyModifiers;

    use super::*;
    use crate::fixtures;
    use crate::table::TableOptions;

    fn people_model() -> Model<fixtures::Person> {
        let table = DataTable::new(
            fixtures::people_columns(),
            fixtures::people(),
            fixtures::people_options().enable_column_search(true).page_size(5),
        );
        Model::new("people", table, &AppConfig::default())
    }

    fn raw(model: &mut Model<fixtures::Person>, code: KeyCode) {
        model
            .update(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    fn typed(model: &mut Model<fixtures::Person>, text: &str) {
        for c in text.chars() {
            raw(model, KeyCode::Char(c));
        }
    }

    #[test]
    fn cursor_starts_on_first_field_and_stays_in_page() {
        let mut model = people_model();
        assert_eq!(model.cursor(), (0, 1));
        for _ in 0..10 {
            model.update(Message::MoveDown).unwrap();
        }
        assert_eq!(model.cursor().0, 4);
        model.update(Message::NextPage).unwrap();
        assert_eq!(model.cursor().0, 2);
    }

    #[test]
    fn toolbar_search_filters_live() {
        let mut model = people_model();
        model.update(Message::Search).unwrap();
        assert!(model.raw_keyevents());
        typed(&mut model, "jo");
        assert_eq!(model.table().row_model().row_count, 1);
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.table().toolbar_value(), "jo");

        model.update(Message::Search).unwrap();
        raw(&mut model, KeyCode::Esc);
        assert_eq!(model.table().row_model().row_count, 8);
    }

    #[test]
    fn filter_editor_applies_range() {
        let mut model = people_model();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::EditFilter).unwrap();
        assert_eq!(model.modus(), Modus::FilterEdit);
        assert_eq!(model.editor().map(|e| e.column_id.as_str()), Some("age"));

        typed(&mut model, "30");
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.table().row_model().row_count, 4);
    }

    #[test]
    fn invalid_range_keeps_editor_open() {
        let mut model = people_model();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::EditFilter).unwrap();
        typed(&mut model, "old");
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::FilterEdit);
        assert!(model.status_message().contains("invalid filter input"));
        assert_eq!(model.table().row_model().row_count, 8);
    }

    #[test]
    fn filter_editor_needs_column_search() {
        let table = DataTable::new(
            fixtures::people_columns(),
            fixtures::people(),
            TableOptions::default(),
        );
        let mut model = Model::new("people", table, &AppConfig::default());
        model.update(Message::EditFilter).unwrap();
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.status_message(), "Column filters are disabled");
    }

    #[test]
    fn sorting_and_selection() {
        let mut model = people_model();
        model.update(Message::ToggleSort).unwrap();
        let first = model.table().page_records()[0].first_name;
        assert_eq!(first, "Alice");

        model.update(Message::ToggleSelect).unwrap();
        model.update(Message::MoveDown).unwrap();
        model.update(Message::ToggleSelect).unwrap();
        assert_eq!(model.table().selected_count(), 2);
        model.update(Message::ToggleSelectPage).unwrap();
        assert_eq!(model.table().selected_count(), 5);
    }

    #[test]
    fn page_size_cycles_through_options() {
        let mut model = people_model();
        model.update(Message::CyclePageSize).unwrap();
        assert_eq!(model.table().state().pagination.page_size, 10);
        model.update(Message::CyclePageSize).unwrap();
        assert_eq!(model.table().state().pagination.page_size, 20);
    }

    #[test]
    fn resize_is_recorded_in_every_modus() {
        let mut model = people_model();
        model.update(Message::Columns).unwrap();
        model.update(Message::Resize(120, 40)).unwrap();
        assert_eq!(model.size(), (120, 40));
        assert_eq!(model.modus(), Modus::Columns);
    }

    #[test]
    fn columns_popup_hides_columns() {
        let mut model = people_model();
        model.update(Message::Columns).unwrap();
        assert_eq!(model.modus(), Modus::Columns);
        model.update(Message::ToggleSelect).unwrap();
        assert!(!model.table().state().is_visible("firstName"));
        model.update(Message::Exit).unwrap();
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.table().visible_columns().len(), 6);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = people_model();
        model.update(Message::Help).unwrap();
        assert_eq!(model.modus(), Modus::Popup);
        assert!(model.popup_message().contains("toolbar search"));
        model.update(Message::Exit).unwrap();
        assert_eq!(model.modus(), Modus::Table);
        model.update(Message::Quit).unwrap();
        assert_eq!(model.status, Status::Exiting);
    }

    #[test]
    fn export_writes_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            export_path: dir.path().join("people.xlsx").display().to_string(),
            ..AppConfig::default()
        };
        let table = DataTable::new(
            fixtures::people_columns(),
            fixtures::people(),
            fixtures::people_options().page_size(5),
        );
        let mut model = Model::new("people", table, &config);
        model.update(Message::Export).unwrap();
        assert!(model.status_message().starts_with("Exported 5 rows"));
        assert!(dir.path().join("people.xlsx").exists());
    }

    #[test]
    fn reordering_moves_the_cursor_with_the_column() {
        let table = DataTable::new(
            fixtures::people_columns(),
            fixtures::people(),
            fixtures::people_options().enable_column_reordering(true),
        );
        let mut model = Model::new("people", table, &AppConfig::default());
        model.update(Message::MoveColumnRight).unwrap();
        assert_eq!(model.cursor().1, 2);
        assert_eq!(model.table().visible_columns()[2].id, "firstName");
    }
}
