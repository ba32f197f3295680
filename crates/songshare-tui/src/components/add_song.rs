//! AddSong component — modal form over the song list.
//!
//! The component owns the [`AddSongForm`] model and one text field per input.
//! Field edits are mirrored into the model as they happen; the model decides
//! whether a submit may start.

use std::path::PathBuf;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tracing::debug;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PENDING, C_SECONDARY},
    upload::{has_audio_extension, read_tags, AddSongForm, UploadOutcome, AUDIO_EXTENSIONS},
    widgets::{pane_chrome::pane_chrome, text_field::TextField, toast::Severity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Owner,
    Description,
    File,
}

const FIELDS: [Field; 4] = [Field::Title, Field::Owner, Field::Description, Field::File];

pub struct AddSongPanel {
    pub open: bool,
    form: AddSongForm,
    title: TextField,
    owner: TextField,
    description: TextField,
    file: TextField,
    focus: usize,
}

impl AddSongPanel {
    pub fn new() -> Self {
        Self {
            open: false,
            form: AddSongForm::new(),
            title: TextField::new("title", "song title"),
            owner: TextField::new("owner", "artist or uploader"),
            description: TextField::new("description", "optional"),
            file: TextField::new("file", format!("path to .{}", AUDIO_EXTENSIONS.join(" / ."))),
            focus: 0,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> crate::upload::FormPhase {
        self.form.phase()
    }

    /// Show an empty form.
    pub fn open(&mut self) {
        self.reset();
        self.open = true;
    }

    fn reset(&mut self) {
        self.form = AddSongForm::new();
        self.title.clear();
        self.owner.clear();
        self.description.clear();
        self.file.clear();
        self.focus = 0;
    }

    /// Close unless an upload is in flight. Returns whether it closed.
    pub fn close(&mut self) -> bool {
        if self.form.is_submitting() {
            return false;
        }
        self.open = false;
        self.reset();
        true
    }

    /// Close even mid-upload (sign-out). The outcome, if any, is dropped.
    pub fn discard(&mut self) {
        self.open = false;
        self.reset();
    }

    /// A created song closes the form; a failure returns to editing.
    pub fn on_outcome(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Created(_) => {
                self.form = AddSongForm::new();
                self.close();
            }
            UploadOutcome::Failed(_) => self.form.submit_failed(),
        }
    }

    fn field(&self) -> Field {
        FIELDS[self.focus % FIELDS.len()]
    }

    fn field_mut(&mut self, field: Field) -> &mut TextField {
        match field {
            Field::Title => &mut self.title,
            Field::Owner => &mut self.owner,
            Field::Description => &mut self.description,
            Field::File => &mut self.file,
        }
    }

    fn sync_model(&mut self, field: Field) {
        match field {
            Field::Title => self.form.set_title(self.title.text()),
            Field::Owner => self.form.set_owner(self.owner.text()),
            Field::Description => self.form.set_description(self.description.text()),
            Field::File => {
                let path = self.file.text().trim();
                let path = (!path.is_empty()).then(|| PathBuf::from(expand_home(path)));
                self.form.set_file(path);
            }
        }
    }

    /// Fill still-empty title/owner from the chosen file's tags.
    fn prefill_from_tags(&mut self) {
        let Some(path) = self.form.file().map(|p| p.to_path_buf()) else {
            return;
        };
        if !path.is_file() {
            return;
        }
        let Some((title, artist)) = read_tags(&path) else {
            return;
        };
        debug!("add-song: tags from {}: {:?} / {:?}", path.display(), title, artist);
        if let Some(title) = title.filter(|_| self.title.is_empty()) {
            self.title.set_value(&title);
            self.sync_model(Field::Title);
        }
        if let Some(artist) = artist.filter(|_| self.owner.is_empty()) {
            self.owner.set_value(&artist);
            self.sync_model(Field::Owner);
        }
    }

    fn move_focus(&mut self, forward: bool) {
        if self.field() == Field::File {
            self.prefill_from_tags();
        }
        self.focus = if forward {
            (self.focus + 1) % FIELDS.len()
        } else {
            (self.focus + FIELDS.len() - 1) % FIELDS.len()
        };
    }

    fn submit(&mut self) -> Vec<Action> {
        if let Some(path) = self.form.file() {
            if !has_audio_extension(path) {
                return vec![Action::Notify(
                    Severity::Warning,
                    format!("{} does not look like audio", path.display()),
                )];
            }
        }
        match self.form.begin_submit() {
            Ok(request) => vec![Action::SubmitUpload(request)],
            Err(e) => vec![Action::Notify(Severity::Warning, e.to_string())],
        }
    }
}

impl Default for AddSongPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/x` → `<home>/x`.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}

impl Component for AddSongPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.form.is_submitting() {
            // Everything waits for the outcome
            return vec![];
        }
        match key.code {
            KeyCode::Esc => return vec![Action::CloseAddSong],
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.prefill_from_tags();
                return self.submit();
            }
            KeyCode::Enter => {
                if self.field() == Field::File {
                    self.prefill_from_tags();
                    return self.submit();
                }
                self.move_focus(true);
            }
            _ => {
                let field = self.field();
                if self.field_mut(field).handle_key(key) {
                    self.sync_model(field);
                }
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let width = area.width.saturating_sub(4).min(72);
        let height = 10u16.min(area.height);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };
        frame.render_widget(Clear, popup);
        let block = pane_chrome("add song", None, focused, None);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let submitting = self.form.is_submitting();
        let current = self.field();
        self.title.draw(frame, rows[0], !submitting && current == Field::Title);
        self.owner.draw(frame, rows[1], !submitting && current == Field::Owner);
        self.description
            .draw(frame, rows[2], !submitting && current == Field::Description);
        self.file.draw(frame, rows[3], !submitting && current == Field::File);

        let footer = if submitting {
            Span::styled(" uploading…", Style::default().fg(C_PENDING))
        } else {
            Span::styled(" Enter on file or ^s to upload, Esc to cancel", Style::default().fg(C_MUTED))
        };
        frame.render_widget(Paragraph::new(Line::from(footer)), rows[6]);

        if let Some(path) = self.form.file() {
            if !path.is_file() {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        " file not found",
                        Style::default().fg(C_SECONDARY),
                    )),
                    rows[4],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::FormPhase;

    fn press(panel: &mut AddSongPanel, code: KeyCode) -> Vec<Action> {
        panel.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &AppState::new())
    }

    fn type_str(panel: &mut AddSongPanel, s: &str) {
        for c in s.chars() {
            press(panel, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_moves_form_to_editing() {
        let mut panel = AddSongPanel::new();
        panel.open();
        assert_eq!(panel.phase(), FormPhase::Idle);
        type_str(&mut panel, "Song");
        assert_eq!(panel.phase(), FormPhase::Editing);
        assert_eq!(panel.form.draft().title, "Song");
    }

    #[test]
    fn submit_without_file_stays_editing() {
        let mut panel = AddSongPanel::new();
        panel.open();
        type_str(&mut panel, "Song");
        let actions = panel.handle_key(
            KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
            &AppState::new(),
        );
        assert!(matches!(actions.as_slice(), [Action::Notify(Severity::Warning, _)]));
        assert_eq!(panel.phase(), FormPhase::Editing);
    }

    #[test]
    fn full_form_submits_once() {
        let mut panel = AddSongPanel::new();
        panel.open();
        type_str(&mut panel, "T");
        press(&mut panel, KeyCode::Tab);
        type_str(&mut panel, "O");
        press(&mut panel, KeyCode::Tab);
        type_str(&mut panel, "D");
        press(&mut panel, KeyCode::Tab);
        type_str(&mut panel, "/tmp/none.mp3");

        let actions = press(&mut panel, KeyCode::Enter);
        let request = match actions.as_slice() {
            [Action::SubmitUpload(r)] => r.clone(),
            other => panic!("unexpected actions: {other:?}"),
        };
        assert_eq!(request.draft.title, "T");
        assert_eq!(request.draft.owner, "O");
        assert_eq!(request.draft.description, "D");
        assert_eq!(panel.phase(), FormPhase::Submitting);

        // Second submit and Esc are both swallowed while uploading
        assert!(press(&mut panel, KeyCode::Enter).is_empty());
        assert!(press(&mut panel, KeyCode::Esc).is_empty());
        assert!(!panel.close());
    }

    #[test]
    fn outcome_drives_phase() {
        let mut panel = AddSongPanel::new();
        panel.open();
        press(&mut panel, KeyCode::BackTab);
        type_str(&mut panel, "a.mp3");
        press(&mut panel, KeyCode::Enter);
        assert_eq!(panel.phase(), FormPhase::Submitting);

        panel.on_outcome(&UploadOutcome::Failed("nope".into()));
        assert_eq!(panel.phase(), FormPhase::Editing);
        assert!(panel.open);

        press(&mut panel, KeyCode::Enter);
        let song = songshare_proto::Song::from(songshare_proto::SongInput::new_upload(
            "id".into(),
            panel.form.draft(),
            "k.mp3".into(),
        ));
        panel.on_outcome(&UploadOutcome::Created(song));
        assert!(!panel.open);
        assert_eq!(panel.phase(), FormPhase::Idle);
    }

    #[test]
    fn non_audio_file_is_refused() {
        let mut panel = AddSongPanel::new();
        panel.open();
        press(&mut panel, KeyCode::BackTab);
        type_str(&mut panel, "notes.txt");
        let actions = press(&mut panel, KeyCode::Enter);
        assert!(matches!(actions.as_slice(), [Action::Notify(Severity::Warning, _)]));
        assert_eq!(panel.phase(), FormPhase::Editing);
    }
}
