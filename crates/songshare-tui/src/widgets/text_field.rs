//! TextField — a labelled single-line input built on tui-input.

use ratatui::crossterm::event::{Event, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthStr;

use crate::theme::{style_input, C_INPUT_BG, C_MUTED, C_PRIMARY, C_SECONDARY};

pub struct TextField {
    input: Input,
    label: &'static str,
    placeholder: String,
    masked: bool,
}

impl TextField {
    pub fn new(label: &'static str, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            label,
            placeholder: placeholder.into(),
            masked: false,
        }
    }

    /// Render the value as bullets (passwords).
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    /// Feed a key to the input. Returns true if the value changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let before = self.input.value().to_string();
        self.input.handle_event(&Event::Key(key));
        self.input.value() != before
    }

    fn label_width(&self) -> u16 {
        self.label.width() as u16 + 2
    }

    /// `label  value` on one row; the cursor is placed when `focused`.
    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let label_w = self.label_width().min(area.width);
        let field_w = area.width.saturating_sub(label_w);
        let scroll = self.input.visual_scroll(field_w.saturating_sub(1) as usize);
        let value = self.input.value();

        let label_style = if focused {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY)
        };

        let value_span = if value.is_empty() {
            Span::styled(self.placeholder.clone(), Style::default().fg(C_MUTED))
        } else if self.masked {
            let shown = value.chars().count().saturating_sub(scroll);
            Span::styled("•".repeat(shown), style_input())
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(visible, style_input())
        };

        let line = Line::from(vec![
            Span::styled(format!("{:<width$}", self.label, width = label_w as usize), label_style),
            value_span,
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if focused {
            let cursor = (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            let cursor_x = area.x + label_w + cursor;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_changes_value() {
        let mut field = TextField::new("title", "untitled");
        assert!(field.handle_key(key(KeyCode::Char('h'))));
        assert!(field.handle_key(key(KeyCode::Char('i'))));
        assert_eq!(field.text(), "hi");
        assert!(field.handle_key(key(KeyCode::Backspace)));
        assert_eq!(field.text(), "h");
    }

    #[test]
    fn cursor_moves_do_not_count_as_changes() {
        let mut field = TextField::new("title", "");
        field.set_value("abc");
        assert!(!field.handle_key(key(KeyCode::Left)));
        assert_eq!(field.text(), "abc");
    }
}
