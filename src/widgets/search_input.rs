//! Text input for the search view.
//!
//! Editing is reported on every keystroke; the owning controller does the
//! debouncing, so this widget stays a thin wrapper around `tui_input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

/// What a key press meant to the input.
#[derive(Debug, Clone)]
pub enum SearchInputAction {
    /// Key consumed, content unchanged.
    Consumed,
    /// Content changed to this value.
    Edited(String),
    /// Enter pressed: run the search.
    Submit(String),
    /// Key was not for the input; let the app handle it.
    PassThrough,
}

pub struct SearchInput {
    input: Input,
    title: String,
}

impl SearchInput {
    pub fn new(title: &str) -> Self {
        Self {
            input: Input::default(),
            title: title.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SearchInputAction {
        match key.code {
            KeyCode::Enter => SearchInputAction::Submit(self.input.value().to_string()),
            // Control chords belong to the app (quit, watch, yank, ...).
            _ if key.modifiers.contains(KeyModifiers::CONTROL) => SearchInputAction::PassThrough,
            KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab => SearchInputAction::PassThrough,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                SearchInputAction::PassThrough
            }
            KeyCode::F(_) => SearchInputAction::PassThrough,
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&crossterm::event::Event::Key(key));
                let after = self.input.value().to_string();
                if before != after {
                    SearchInputAction::Edited(after)
                } else {
                    SearchInputAction::Consumed
                }
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, pending: bool) {
        let title = if pending {
            format!("{} (typing...)", self.title)
        } else {
            self.title.clone()
        };

        let widget = Paragraph::new(self.input.value())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(widget, area);
        frame.set_cursor_position((area.x + self.input.cursor() as u16 + 1, area.y + 1));
    }
}
