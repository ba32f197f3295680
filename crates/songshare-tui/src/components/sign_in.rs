//! SignIn component — the gate shown until a session exists.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PENDING},
    widgets::{pane_chrome::pane_chrome, text_field::TextField, toast::Severity},
};

pub struct SignInForm {
    username: TextField,
    password: TextField,
    on_password: bool,
}

impl SignInForm {
    pub fn new() -> Self {
        Self {
            username: TextField::new("username", "your username"),
            password: TextField::new("password", "").masked(),
            on_password: false,
        }
    }

    /// Forget the typed password (after a failed attempt or sign-out).
    pub fn clear_password(&mut self) {
        self.password.clear();
        self.on_password = !self.username.is_empty();
    }

    fn submit(&mut self) -> Vec<Action> {
        let username = self.username.text().trim().to_string();
        if username.is_empty() || self.password.is_empty() {
            return vec![Action::Notify(
                Severity::Warning,
                "enter a username and password".to_string(),
            )];
        }
        vec![Action::SignIn {
            username,
            password: self.password.text().to_string(),
        }]
    }
}

impl Default for SignInForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SignInForm {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || state.signing_in {
            return vec![];
        }
        match key.code {
            KeyCode::Esc => return vec![Action::Quit],
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.on_password = !self.on_password;
            }
            KeyCode::Enter => {
                if self.on_password {
                    return self.submit();
                }
                self.on_password = true;
            }
            _ => {
                let field = if self.on_password {
                    &mut self.password
                } else {
                    &mut self.username
                };
                field.handle_key(key);
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let width = area.width.saturating_sub(4).min(56);
        let height = 6u16.min(area.height);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };
        frame.render_widget(Clear, popup);
        let block = pane_chrome("sign in", None, focused, None);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);
        if inner.height < 2 {
            return;
        }

        let row = |n: u16| Rect {
            y: inner.y + n,
            height: 1,
            ..inner
        };
        let typing = focused && !state.signing_in;
        self.username.draw(frame, row(0), typing && !self.on_password);
        self.password.draw(frame, row(1), typing && self.on_password);

        if inner.height >= 4 {
            let status = if state.signing_in {
                Span::styled(" signing in…", Style::default().fg(C_PENDING))
            } else {
                Span::styled(" Enter to sign in, Esc to quit", Style::default().fg(C_MUTED))
            };
            frame.render_widget(Paragraph::new(status), row(3));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(form: &mut SignInForm, code: KeyCode, state: &AppState) -> Vec<Action> {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn enter_walks_fields_then_signs_in() {
        let state = AppState::new();
        let mut form = SignInForm::new();
        for c in "ana".chars() {
            press(&mut form, KeyCode::Char(c), &state);
        }
        assert!(press(&mut form, KeyCode::Enter, &state).is_empty());
        for c in "pw".chars() {
            press(&mut form, KeyCode::Char(c), &state);
        }
        match press(&mut form, KeyCode::Enter, &state).as_slice() {
            [Action::SignIn { username, password }] => {
                assert_eq!(username, "ana");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn blank_credentials_warn() {
        let state = AppState::new();
        let mut form = SignInForm::new();
        press(&mut form, KeyCode::Tab, &state);
        assert!(matches!(
            press(&mut form, KeyCode::Enter, &state).as_slice(),
            [Action::Notify(Severity::Warning, _)]
        ));
    }

    #[test]
    fn keys_ignored_while_signing_in() {
        let mut state = AppState::new();
        state.signing_in = true;
        let mut form = SignInForm::new();
        assert!(press(&mut form, KeyCode::Esc, &state).is_empty());
    }
}
