use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::trace;

use crate::column::{ColumnDef, ColumnSource, FilterKind, chars_for_pixels};
use crate::editor::{Bound, FilterEditor, Widget};
use crate::inputter::Inputter;
use crate::model::{Model, Modus};
use crate::rows::Row;
use crate::table::DataTable;
use crate::value::Record;

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(8);
const COLUMN_SPACER: usize = 1;
const DETAIL_INDENT: usize = 4;
const SEARCH_PROMPT: &str = "Search: ";

/// Renders a [`Model`]. Keeps the scroll offsets between frames.
#[derive(Debug, Default)]
pub struct TableUI {
    column_offset: usize,
    line_offset: usize,
}

struct Styles {
    header: Style,
    dimmed: Style,
    filter: Style,
    cursor_row: Style,
    cursor_cell: Style,
    selected: Style,
    detail: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            dimmed: Style::default().fg(Color::DarkGray),
            filter: Style::default().fg(Color::Yellow),
            cursor_row: Style::default().bg(Color::Rgb(40, 40, 60)),
            cursor_cell: Style::default().add_modifier(Modifier::REVERSED),
            selected: Style::default().fg(Color::LightBlue),
            detail: Style::default().fg(Color::Gray),
        }
    }
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw<R: Record>(&mut self, model: &Model<R>, frame: &mut Frame) {
        let styles = Styles::default();
        let options = model.table().options();
        let header_height = if options.enable_column_search { 2 } else { 1 };
        let [toolbar, header, body, footer, status] = Layout::vertical([
            Constraint::Length(u16::from(options.show_toolbar)),
            Constraint::Length(header_height),
            Constraint::Min(1),
            Constraint::Length(u16::from(options.show_pagination)),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        if options.show_toolbar {
            self.draw_toolbar(model, frame, toolbar, &styles);
        }
        self.draw_table(model, frame, header, body, &styles);
        if options.show_pagination {
            self.draw_footer(model.table(), frame, footer);
        }
        self.draw_status(model, frame, status, &styles);

        match model.modus() {
            Modus::Popup => draw_popup(frame, model.popup_message()),
            Modus::Columns => draw_columns(model, frame, &styles),
            Modus::FilterEdit => {
                if let Some(editor) = model.editor() {
                    draw_editor(editor, frame, &styles);
                }
            }
            Modus::Table | Modus::Search => {}
        }
    }

    fn draw_toolbar<R: Record>(&self, model: &Model<R>, frame: &mut Frame, area: Rect, styles: &Styles) {
        let table = model.table();
        let mut actions = vec![Span::raw("Columns (c) ")];
        if !table.state().column_filters.is_empty() {
            actions.insert(0, Span::styled("Reset (R)  ", styles.filter));
        }
        let actions = Line::from(actions);
        let [search, buttons] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(actions.width() as u16)])
                .areas(area);

        let line = if model.modus() == Modus::Search {
            let input = model.search_input();
            let cursor = (SEARCH_PROMPT.len() + input.cursor_pos) as u16;
            frame.set_cursor_position(Position::new(search.x + cursor.min(search.width), search.y));
            Line::from(vec![
                Span::styled(SEARCH_PROMPT, styles.filter),
                Span::raw(input.input.clone()),
            ])
        } else {
            let value = table.toolbar_value();
            if value.is_empty() {
                Line::from(Span::styled(table.options().filter_placeholder.clone(), styles.dimmed))
            } else {
                Line::from(vec![Span::styled(SEARCH_PROMPT, styles.dimmed), Span::raw(value)])
            }
        };
        frame.render_widget(Paragraph::new(line), search);
        frame.render_widget(Paragraph::new(actions).right_aligned(), buttons);
    }

    /// Picks the columns that fit the width, keeping the cursor column in view.
    fn column_window(
        &mut self,
        widths: &[usize],
        cursor: usize,
        full_width: bool,
        available: usize,
    ) -> Vec<(usize, usize)> {
        if widths.is_empty() {
            return Vec::new();
        }
        let cursor = cursor.min(widths.len() - 1);
        self.column_offset = self.column_offset.min(cursor);
        let span = |from: usize| -> usize { widths[from..=cursor].iter().map(|w| w + COLUMN_SPACER).sum() };
        while self.column_offset < cursor && span(self.column_offset) > available {
            self.column_offset += 1;
        }

        let mut window = Vec::new();
        let mut used = 0;
        for (idx, width) in widths.iter().enumerate().skip(self.column_offset) {
            if used >= available {
                break;
            }
            let width = (*width).min(available - used);
            window.push((idx, width));
            used += width + COLUMN_SPACER;
        }
        if full_width
            && used < available
            && let Some(last) = window.last_mut()
        {
            last.1 += available - used;
        }
        window
    }

    fn draw_table<R: Record>(
        &mut self,
        model: &Model<R>,
        frame: &mut Frame,
        header: Rect,
        body: Rect,
        styles: &Styles,
    ) {
        let table = model.table();
        let columns = table.visible_columns();
        let widths: Vec<usize> = columns
            .iter()
            .map(|c| chars_for_pixels(table.column_size(c)))
            .collect();
        let (cursor_row, cursor_column) = model.cursor();
        let window = self.column_window(
            &widths,
            cursor_column,
            table.options().full_width,
            header.width as usize,
        );
        let row_model = table.row_model();

        let mut titles = Vec::new();
        let mut filters = Vec::new();
        for &(idx, width) in &window {
            let column = columns[idx];
            let title = header_title(table, column, &row_model.rows);
            titles.push(Span::styled(fit(&title, width), styles.header));
            titles.push(Span::raw(" "));
            let (text, style) = match table.filter_value(&column.id) {
                Some(value) => (value.summary(&column.filter), styles.filter),
                None => (filter_placeholder(column), styles.dimmed),
            };
            filters.push(Span::styled(fit(&text, width), style));
            filters.push(Span::raw(" "));
        }
        let mut header_lines = vec![Line::from(titles)];
        if table.options().enable_column_search {
            header_lines.push(Line::from(filters));
        }
        frame.render_widget(Paragraph::new(header_lines), header);

        if row_model.rows.is_empty() {
            frame.render_widget(Paragraph::new("No results.").centered(), body);
            return;
        }

        let mut lines = Vec::new();
        let mut cursor_line = 0;
        for (i, row) in row_model.rows.iter().enumerate() {
            let is_cursor = i == cursor_row;
            if is_cursor {
                cursor_line = lines.len();
            }
            let mut spans = Vec::new();
            for &(idx, width) in &window {
                let column = columns[idx];
                let mut style = if table.is_selected(row) {
                    styles.selected
                } else {
                    Style::default()
                };
                if is_cursor && idx == cursor_column {
                    style = style.patch(styles.cursor_cell);
                }
                spans.push(Span::styled(fit(&cell_text(table, column, row), width), style));
                spans.push(Span::raw(" "));
            }
            let line = Line::from(spans);
            lines.push(if is_cursor {
                line.style(styles.cursor_row)
            } else {
                line
            });

            if table.is_expanded(row)
                && let Some(detail) = table.detail_lines(row)
            {
                let indent = " ".repeat(DETAIL_INDENT + 2 * row.depth);
                for text in detail {
                    lines.push(Line::styled(format!("{indent}{text}"), styles.detail));
                }
            }
        }

        let height = (body.height as usize).max(1);
        if cursor_line < self.line_offset {
            self.line_offset = cursor_line;
        } else if cursor_line >= self.line_offset + height {
            self.line_offset = cursor_line + 1 - height;
        }
        self.line_offset = self.line_offset.min(lines.len().saturating_sub(1));
        trace!("Body: {} lines, offset {}", lines.len(), self.line_offset);
        frame.render_widget(
            Paragraph::new(lines).scroll((self.line_offset as u16, 0)),
            body,
        );
    }

    fn draw_footer<R: Record>(&self, table: &DataTable<R>, frame: &mut Frame, area: Rect) {
        let row_model = table.row_model();
        let total = row_model.filtered.len();
        let selected = table.selected_count();
        let summary = if selected > 0 {
            Span::styled(
                format!("{selected} of {total} row(s) selected."),
                Style::default().fg(Color::LightBlue),
            )
        } else {
            Span::raw(format!("{total} row(s) total."))
        };
        let pagination = table.state().pagination;
        let pages = Line::from(vec![
            "Rows per page ".into(),
            pagination.page_size.to_string().bold(),
            "   ".into(),
            format!(
                "Page {} of {}",
                pagination.page_index + 1,
                row_model.page_count.max(1)
            )
            .bold(),
        ]);
        let [left, right] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(pages.width() as u16)])
                .areas(area);
        frame.render_widget(Paragraph::new(Line::from(summary)), left);
        frame.render_widget(Paragraph::new(pages).right_aligned(), right);
    }

    fn draw_status<R: Record>(&self, model: &Model<R>, frame: &mut Frame, area: Rect, styles: &Styles) {
        let fresh = model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT;
        let left = if fresh && !model.status_message().is_empty() {
            Span::raw(model.status_message().to_string())
        } else {
            Span::styled("? help  q quit", styles.dimmed)
        };
        let right = format!(" {} [{:?}]", model.name(), model.modus());
        let [left_area, right_area] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(right.len() as u16)])
                .areas(area);
        frame.render_widget(Paragraph::new(Line::from(left)), left_area);
        frame.render_widget(
            Paragraph::new(Span::styled(right, styles.dimmed)).right_aligned(),
            right_area,
        );
    }
}

fn checkbox(checked: bool, partial: bool) -> &'static str {
    match (checked, partial) {
        (true, _) => "[x]",
        (false, true) => "[-]",
        (false, false) => "[ ]",
    }
}

fn header_title<R: Record>(table: &DataTable<R>, column: &ColumnDef, page: &[Row<'_, R>]) -> String {
    match &column.source {
        ColumnSource::Expander => {
            let arrow = if table.is_all_rows_expanded() { "▾" } else { "▸" };
            arrow.to_string()
        }
        ColumnSource::Selector => {
            let selected = page.iter().filter(|r| table.is_selected(r)).count();
            checkbox(!page.is_empty() && selected == page.len(), selected > 0).to_string()
        }
        ColumnSource::Field(_) if column.can_sort() => {
            let arrow = match table.state().sort_direction(&column.id) {
                Some(false) => "↑",
                Some(true) => "↓",
                None => "↕",
            };
            format!("{} {arrow}", column.header)
        }
        ColumnSource::Field(_) => column.header.clone(),
    }
}

fn filter_placeholder(column: &ColumnDef) -> String {
    match &column.filter {
        FilterKind::Text => format!("Filter {}...", column.id),
        FilterKind::Select(_) => "All".to_string(),
        FilterKind::MultiSelect(_) => "Any".to_string(),
        FilterKind::NumericRange => "min..max".to_string(),
        FilterKind::DateRange => "from..to".to_string(),
        FilterKind::None => String::new(),
    }
}

fn cell_text<R: Record>(table: &DataTable<R>, column: &ColumnDef, row: &Row<'_, R>) -> String {
    match &column.source {
        ColumnSource::Expander => {
            let indent = "  ".repeat(row.depth);
            if !row.can_expand(table.has_detail()) {
                indent
            } else if table.is_expanded(row) {
                format!("{indent}▾")
            } else {
                format!("{indent}▸")
            }
        }
        ColumnSource::Selector => checkbox(table.is_selected(row), false).to_string(),
        ColumnSource::Field(_) => column.format_cell(&row.value(column)),
    }
}

/// Pads or cuts `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return format!("{text:<width$}");
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw_popup(frame: &mut Frame, message: &str) {
    let lines: Vec<Line> = message.lines().map(Line::raw).collect();
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
    let area = popup_area(frame.area(), width, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(popup_block("Help")), area);
}

fn draw_columns<R: Record>(model: &Model<R>, frame: &mut Frame, styles: &Styles) {
    let table = model.table();
    let lines: Vec<Line> = model
        .hideable_columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let text = format!("{} {}", checkbox(table.state().is_visible(&column.id), false), column.id);
            if i == model.columns_cursor() {
                Line::styled(text, styles.cursor_cell)
            } else {
                Line::raw(text)
            }
        })
        .collect();
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0).max(16) as u16 + 4;
    let area = popup_area(frame.area(), width, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(popup_block("Columns")), area);
}

/// A labelled input line; returns the line and the cursor column when focused.
fn input_line<'a>(label: &'a str, input: &Inputter, focused: bool, styles: &Styles) -> (Line<'a>, Option<u16>) {
    let label_style = if focused { styles.filter } else { styles.dimmed };
    let line = Line::from(vec![
        Span::styled(label, label_style),
        Span::raw(input.value().to_string()),
    ]);
    let cursor = focused.then(|| (label.chars().count() + input.get().cursor_pos) as u16);
    (line, cursor)
}

fn draw_editor(editor: &FilterEditor, frame: &mut Frame, styles: &Styles) {
    let mut lines = Vec::new();
    let mut cursor = None;
    match &editor.widget {
        Widget::Text(input) => {
            if input.value().is_empty() {
                lines.push(Line::styled(editor.placeholder.clone(), styles.dimmed));
                cursor = Some((0, 0));
            } else {
                let (line, col) = input_line("", input, true, styles);
                lines.push(line);
                cursor = col.map(|c| (c, 0));
            }
        }
        Widget::Select { options, selected } => {
            let labels = std::iter::once("All").chain(options.iter().map(|o| o.label.as_str()));
            for (i, label) in labels.enumerate() {
                if i == *selected {
                    lines.push(Line::styled(format!("(•) {label}"), styles.cursor_cell));
                } else {
                    lines.push(Line::raw(format!("( ) {label}")));
                }
            }
        }
        Widget::MultiSelect {
            options,
            cursor: at,
            selected,
        } => {
            for (i, option) in options.iter().enumerate() {
                let text = format!("{} {}", checkbox(selected.contains(&option.value), false), option.label);
                lines.push(if i == *at {
                    Line::styled(text, styles.cursor_cell)
                } else {
                    Line::raw(text)
                });
            }
        }
        Widget::NumericRange { min, max, focus } => {
            for (row, (label, input, bound)) in
                [("Min: ", min, Bound::Lower), ("Max: ", max, Bound::Upper)].into_iter().enumerate()
            {
                let (line, col) = input_line(label, input, *focus == bound, styles);
                lines.push(line);
                if let Some(col) = col {
                    cursor = Some((col, row as u16));
                }
            }
        }
        Widget::DateRange { from, to, focus } => {
            for (row, (label, input, bound)) in
                [("From: ", from, Bound::Lower), ("To:   ", to, Bound::Upper)].into_iter().enumerate()
            {
                let (line, col) = input_line(label, input, *focus == bound, styles);
                lines.push(line);
                if let Some(col) = col {
                    cursor = Some((col, row as u16));
                }
            }
            lines.push(Line::styled("dates as YYYY-MM-DD", styles.dimmed));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("enter apply  esc clear", styles.dimmed));

    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0).max(30) as u16 + 4;
    let area = popup_area(frame.area(), width, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    let title = format!("Filter {}", editor.title);
    frame.render_widget(Paragraph::new(lines).block(popup_block(&title)), area);
    if let Some((x, y)) = cursor {
        frame.set_cursor_position(Position::new(area.x + 1 + x, area.y + 1 + y));
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::domain::{AppConfig, Message};
    use crate::fixtures;

    fn people_model(column_search: bool) -> Model<fixtures::Person> {
        let table = DataTable::new(
            fixtures::people_columns(),
            fixtures::people(),
            fixtures::people_options().enable_column_search(column_search),
        );
        Model::new("people", table, &AppConfig::default())
    }

    fn render<R: Record>(ui: &mut TableUI, model: &Model<R>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn fit_pads_and_cuts() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn draws_toolbar_header_rows_and_footer() {
        let model = people_model(false);
        let screen = render(&mut TableUI::new(), &model, 140, 20);
        assert!(screen.contains("Filter by first name..."));
        assert!(screen.contains("Columns (c)"));
        assert!(screen.contains("First Name ↕"));
        assert!(screen.contains("John"));
        assert!(screen.contains("8 row(s) total."));
        assert!(screen.contains("Rows per page 10"));
        assert!(screen.contains("Page 1 of 1"));
        assert!(screen.contains("Loaded people (8 rows)"));
    }

    #[test]
    fn shows_selection_sorting_and_filters() {
        let mut model = people_model(true);
        model.update(Message::ToggleSort).unwrap();
        model.update(Message::ToggleSelect).unwrap();
        let screen = render(&mut TableUI::new(), &model, 140, 20);
        assert!(screen.contains("First Name ↑"));
        assert!(screen.contains("[x]"));
        assert!(screen.contains("1 of 8 row(s) selected."));
        assert!(screen.contains("Filter lastName..."));
        assert!(screen.contains("min..max"));
    }

    #[test]
    fn empty_result_and_search_prompt() {
        let mut model = people_model(false);
        model.update(Message::Search).unwrap();
        for c in "zzz".chars() {
            model
                .update(Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
                .unwrap();
        }
        let screen = render(&mut TableUI::new(), &model, 140, 20);
        assert!(screen.contains("Search: zzz"));
        assert!(screen.contains("No results."));
        assert!(screen.contains("0 row(s) total."));
        assert!(screen.contains("Page 1 of 1"));
    }

    #[test]
    fn popups() {
        let mut ui = TableUI::new();
        let mut model = people_model(true);
        model.update(Message::Help).unwrap();
        assert!(render(&mut ui, &model, 140, 40).contains("Navigation"));
        model.update(Message::Exit).unwrap();

        model.update(Message::Columns).unwrap();
        let screen = render(&mut ui, &model, 140, 20);
        assert!(screen.contains("[x] firstName"));
        model.update(Message::Exit).unwrap();

        model.update(Message::MoveRight).unwrap();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::EditFilter).unwrap();
        let screen = render(&mut ui, &model, 140, 20);
        assert!(screen.contains("Filter Age"));
        assert!(screen.contains("Min: "));
    }

    #[test]
    fn expanded_rows_show_sub_rows_and_details() {
        let table = DataTable::new(
            fixtures::department_columns(),
            fixtures::departments(),
            fixtures::department_options(),
        )
        .with_sub_rows(fixtures::org_children)
        .with_detail(fixtures::org_details);
        let mut model = Model::new("departments", table, &AppConfig::default());
        let collapsed = render(&mut TableUI::new(), &model, 160, 30);
        assert!(collapsed.contains("▸"));

        model.update(Message::ToggleExpand).unwrap();
        let expanded = render(&mut TableUI::new(), &model, 160, 30);
        assert!(expanded.contains("▾"));
        assert!(expanded.contains("Alice Johnson"));
    }

    #[test]
    fn horizontal_window_follows_the_cursor() {
        let mut ui = TableUI::new();
        let widths = [10, 10, 10, 10];
        let window = ui.column_window(&widths, 0, false, 25);
        assert_eq!(window, vec![(0, 10), (1, 10), (2, 3)]);

        let window = ui.column_window(&widths, 3, false, 25);
        assert_eq!(window[0].0, 2);
        assert_eq!(window.last(), Some(&(3, 10)));

        let mut ui = TableUI::new();
        let window = ui.column_window(&[5, 5], 0, true, 20);
        assert_eq!(window, vec![(0, 5), (1, 13)]);
    }
}
