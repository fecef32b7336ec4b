use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode};

use crate::domain::{AppConfig, GridError, Message};
use crate::model::Model;
use crate::value::Record;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event<R: Record>(&self, model: &Model<R>) -> Result<Option<Message>, GridError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                Ok(map_key(key, model.raw_keyevents()))
            }
            Event::Resize(width, height) => {
                Ok(Some(Message::Resize(width as usize, height as usize)))
            }
            _ => Ok(None),
        }
    }
}

/// Maps a key press to a message. Inputs and filter widgets receive the raw key.
pub fn map_key(key: event::KeyEvent, raw: bool) -> Option<Message> {
    if raw {
        return Some(Message::RawKey(key));
    }
    let message = match key.code {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Esc => Some(Message::Exit),
        KeyCode::Char('?') => Some(Message::Help),
        KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
        KeyCode::Char('s') => Some(Message::ToggleSort),
        KeyCode::Char('f') => Some(Message::EditFilter),
        KeyCode::Char('/') => Some(Message::Search),
        KeyCode::Char('R') => Some(Message::ResetFilters),
        KeyCode::Char(' ') => Some(Message::ToggleSelect),
        KeyCode::Char('a') => Some(Message::ToggleSelectPage),
        KeyCode::Enter => Some(Message::ToggleExpand),
        KeyCode::Char('E') => Some(Message::ToggleExpandAll),
        KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
        KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PreviousPage),
        KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
        KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
        KeyCode::Char('z') => Some(Message::CyclePageSize),
        KeyCode::Char('>') => Some(Message::GrowColumn),
        KeyCode::Char('<') => Some(Message::ShrinkColumn),
        KeyCode::Char('H') => Some(Message::MoveColumnLeft),
        KeyCode::Char('L') => Some(Message::MoveColumnRight),
        KeyCode::Char('c') => Some(Message::Columns),
        KeyCode::Char('y') => Some(Message::CopyRowId),
        KeyCode::Char('x') => Some(Message::Export),
        _ => None,
    };
    trace!("Mapped: {key:?} => {message:?}");
    message
}
