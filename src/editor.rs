//! Interactive filter widgets, one per filter kind.

use std::collections::BTreeSet;

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::trace;

use crate::column::{ColumnDef, FilterKind, FilterOption};
use crate::domain::GridError;
use crate::filter::{FilterValue, parse_date_range, parse_numeric_range};
use crate::inputter::Inputter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

impl Bound {
    fn other(self) -> Self {
        match self {
            Bound::Lower => Bound::Upper,
            Bound::Upper => Bound::Lower,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Widget {
    Text(Inputter),
    /// `selected` 0 is "All", `i` is `options[i - 1]`.
    Select {
        options: Vec<FilterOption>,
        selected: usize,
    },
    MultiSelect {
        options: Vec<FilterOption>,
        cursor: usize,
        selected: BTreeSet<String>,
    },
    NumericRange {
        min: Inputter,
        max: Inputter,
        focus: Bound,
    },
    DateRange {
        from: Inputter,
        to: Inputter,
        focus: Bound,
    },
}

/// What the owner of an editor should do after a key.
#[derive(Debug)]
pub enum EditorEvent {
    Nothing,
    /// Apply the value and keep editing.
    Update(Option<FilterValue>),
    /// Apply the value and close the editor.
    Commit(Option<FilterValue>),
    /// Input was rejected, the previous filter stays.
    Invalid(GridError),
}

#[derive(Debug, Clone)]
pub struct FilterEditor {
    pub column_id: String,
    pub title: String,
    pub placeholder: String,
    pub widget: Widget,
}

impl FilterEditor {
    /// Editor for `column` starting from its current filter. `None` for columns without one.
    pub fn for_column(column: &ColumnDef, current: Option<&FilterValue>) -> Option<Self> {
        if !column.can_filter() {
            return None;
        }
        let widget = match &column.filter {
            FilterKind::None => return None,
            FilterKind::Text => {
                let text = match current {
                    Some(FilterValue::Text(s)) => s.as_str(),
                    _ => "",
                };
                Widget::Text(Inputter::with_value(text))
            }
            FilterKind::Select(options) => {
                let selected = match current {
                    Some(FilterValue::Select(Some(v))) => options
                        .iter()
                        .position(|o| &o.value == v)
                        .map_or(0, |i| i + 1),
                    _ => 0,
                };
                Widget::Select {
                    options: options.clone(),
                    selected,
                }
            }
            FilterKind::MultiSelect(options) => Widget::MultiSelect {
                options: options.clone(),
                cursor: 0,
                selected: match current {
                    Some(FilterValue::MultiSelect(values)) => values.clone(),
                    _ => BTreeSet::new(),
                },
            },
            FilterKind::NumericRange => {
                let (min, max) = match current {
                    Some(FilterValue::NumericRange { min, max }) => (*min, *max),
                    _ => (None, None),
                };
                let show = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
                Widget::NumericRange {
                    min: Inputter::with_value(&show(min)),
                    max: Inputter::with_value(&show(max)),
                    focus: Bound::Lower,
                }
            }
            FilterKind::DateRange => {
                let (from, to) = match current {
                    Some(FilterValue::DateRange { from, to }) => (*from, *to),
                    _ => (None, None),
                };
                let show = |d: Option<chrono::NaiveDate>| {
                    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
                };
                Widget::DateRange {
                    from: Inputter::with_value(&show(from)),
                    to: Inputter::with_value(&show(to)),
                    focus: Bound::Lower,
                }
            }
        };
        Some(Self {
            column_id: column.id.clone(),
            title: column.header.clone(),
            placeholder: format!("Filter {}...", column.id),
            widget,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorEvent {
        let event = match key.code {
            KeyCode::Esc => EditorEvent::Commit(None),
            KeyCode::Enter => self.confirm(),
            _ => self.edit(key),
        };
        trace!("Editor {}: {:?} => {event:?}", self.column_id, key.code);
        event
    }

    /// The value the widget holds now. Range inputs are parsed and may be rejected.
    pub fn current_value(&self) -> Result<Option<FilterValue>, GridError> {
        let value = match &self.widget {
            Widget::Text(input) => Some(FilterValue::text(input.value())),
            Widget::Select { options, selected } => selected
                .checked_sub(1)
                .and_then(|i| options.get(i))
                .map(|o| FilterValue::select(o.value.as_str())),
            Widget::MultiSelect { selected, .. } => {
                Some(FilterValue::MultiSelect(selected.clone()))
            }
            Widget::NumericRange { min, max, .. } => {
                parse_numeric_range(min.value(), max.value())?
            }
            Widget::DateRange { from, to, .. } => parse_date_range(from.value(), to.value())?,
        };
        Ok(value.filter(|v| !v.is_empty()))
    }

    fn confirm(&self) -> EditorEvent {
        match self.current_value() {
            Ok(value) => EditorEvent::Commit(value),
            Err(err) => EditorEvent::Invalid(err),
        }
    }

    fn live_value(&self) -> EditorEvent {
        match self.current_value() {
            Ok(value) => EditorEvent::Update(value),
            Err(err) => EditorEvent::Invalid(err),
        }
    }

    fn edit(&mut self, key: KeyEvent) -> EditorEvent {
        match &mut self.widget {
            Widget::Text(input) => {
                input.read(key);
                self.live_value()
            }
            Widget::Select { options, selected } => {
                let slots = options.len() + 1;
                match key.code {
                    KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                        *selected = (*selected + 1) % slots;
                    }
                    KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                        *selected = (*selected + slots - 1) % slots;
                    }
                    _ => return EditorEvent::Nothing,
                }
                self.live_value()
            }
            Widget::MultiSelect {
                options,
                cursor,
                selected,
            } => {
                match key.code {
                    KeyCode::Down | KeyCode::Char('j') if *cursor + 1 < options.len() => {
                        *cursor += 1;
                    }
                    KeyCode::Up | KeyCode::Char('k') => *cursor = cursor.saturating_sub(1),
                    KeyCode::Char(' ') => {
                        if let Some(option) = options.get(*cursor)
                            && !selected.remove(&option.value)
                        {
                            selected.insert(option.value.clone());
                        }
                        return self.live_value();
                    }
                    _ => {}
                }
                EditorEvent::Nothing
            }
            Widget::NumericRange { min, max, focus } | Widget::DateRange {
                from: min,
                to: max,
                focus,
            } => {
                match (key.code, *focus) {
                    (KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down, _) => {
                        *focus = focus.other();
                    }
                    (_, Bound::Lower) => {
                        min.read(key);
                    }
                    (_, Bound::Upper) => {
                        max.read(key);
                    }
                }
                EditorEvent::Nothing
            }
        }
    }
}
