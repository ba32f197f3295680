//! Status bar — bottom line with input mode and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_FORM, C_MODE_NORMAL, C_MUTED, C_PENDING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    SignIn,
    Normal,
    Form,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::SignIn => "SIGN IN",
            Self::Normal => "SONGS",
            Self::Form => "ADD SONG",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::SignIn => C_PENDING,
            Self::Normal => C_MODE_NORMAL,
            Self::Form => C_MODE_FORM,
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let keys = match mode {
        InputMode::SignIn => " Tab next field  Enter sign in  Esc quit",
        InputMode::Normal => {
            " ↑↓/jk select  Enter/Space play/stop  l like  a add  R refresh  y copy link  Tab panes  L logs  ^o sign out  q quit"
        }
        InputMode::Form => " Tab/Shift-Tab field  Enter next/submit  ^s submit  Esc cancel",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
