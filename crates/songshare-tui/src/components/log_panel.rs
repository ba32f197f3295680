//! LogPanel component — tail of songshare.log, toggled with `L`.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_MUTED, C_PENDING, C_SECONDARY},
    widgets::pane_chrome::pane_chrome_borders,
};

/// Lines kept from the end of the log file.
pub const LOG_TAIL: usize = 500;

pub struct LogPanel {
    /// First visible line; `usize::MAX` pins the view to the newest line.
    scroll: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self { scroll: usize::MAX }
    }

    pub fn jump_to_end(&mut self) {
        self.scroll = usize::MAX;
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LogPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.jump_to_end(),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);
        let block = pane_chrome_borders(
            "log",
            Some('2'),
            focused,
            None,
            Borders::LEFT | Borders::BOTTOM | Borders::RIGHT | Borders::TOP,
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.log_lines;
        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let max_scroll = logs.len().saturating_sub(height);
        let start = self.scroll.min(max_scroll);
        if self.scroll != usize::MAX {
            self.scroll = start;
        }

        let lines: Vec<Line> = logs
            .iter()
            .skip(start)
            .take(height)
            .map(|raw| {
                let (level, msg) = compact_log_line(raw);
                let color = match level {
                    Some("ERROR") => C_ACCENT,
                    Some("WARN") => C_PENDING,
                    _ => C_SECONDARY,
                };
                Line::from(vec![Span::raw(" "), Span::styled(msg, Style::default().fg(color))])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

// ── Log line formatting ───────────────────────────────────────────────────────

/// `2026-10-18T09:12:44.123Z  INFO songshare::core: msg` → (`INFO`, `09:12:44 INFO msg`).
fn compact_log_line(raw: &str) -> (Option<&'static str>, String) {
    let mut rest = raw.trim();
    let mut head: Vec<String> = Vec::new();

    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(tok) {
            head.push(ts.with_timezone(&chrono::Local).format("%H:%M:%S").to_string());
            rest = rem.trim_start();
        }
    }

    let mut level = None;
    if let Some((tok, rem)) = rest.split_once(char::is_whitespace) {
        level = match tok {
            "TRACE" => Some("TRACE"),
            "DEBUG" => Some("DEBUG"),
            "INFO" => Some("INFO"),
            "WARN" => Some("WARN"),
            "ERROR" => Some("ERROR"),
            _ => None,
        };
        if let Some(l) = level {
            head.push(l.to_string());
            rest = rem.trim_start();
        }
    }

    // Module path prefix like "songshare::core: "
    if let Some((target, msg)) = rest.split_once(": ") {
        if !target.is_empty()
            && target
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':'))
        {
            rest = msg;
        }
    }

    head.push(rest.to_string());
    (level, head.join(" "))
}
