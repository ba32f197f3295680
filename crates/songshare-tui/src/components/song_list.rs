//! SongList component — the main pane once signed in.

use chrono::Utc;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use songshare_proto::Song;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    core::SongRef,
    playback::PlaybackSession,
    theme::{
        style_playing, style_secondary, style_selected_focused, C_LIKES, C_MUTED, C_OWNER,
        C_PENDING, C_PRIMARY, C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

const TITLE_WIDTH: usize = 28;
const OWNER_WIDTH: usize = 18;

pub struct SongList {
    list: ScrollableList<Song>,
    table_state: TableState,
}

impl SongList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            table_state: TableState::default(),
        }
    }

    /// Pick up a new snapshot, keeping the cursor on the same song when it
    /// is still listed.
    pub fn sync_songs(&mut self, state: &AppState) {
        let selected_id = self.list.selected_item().map(|s| s.id.clone());
        self.list.set_items(state.songs.clone());
        if let Some(id) = selected_id {
            if let Some(pos) = self.list.items.iter().position(|s| s.id == id) {
                self.list.select(pos);
            }
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list.selected_index()
    }

    fn selected_ref(&self) -> Option<SongRef> {
        let idx = self.list.selected_index()?;
        self.list.selected_item().map(|song| SongRef::new(idx, song))
    }

    fn render_row<'a>(
        song: &'a Song,
        playing: Option<&PlaybackSession>,
        is_selected: bool,
        focused: bool,
    ) -> Row<'a> {
        let marker = if playing.is_some() { "▶ " } else { "  " };
        let title_style = if playing.is_some() {
            style_playing()
        } else if is_selected && focused {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_PRIMARY)
        };

        let expiry = match playing {
            Some(session) => {
                let left = session.remaining_secs(Utc::now());
                if left > 0 {
                    Span::styled(format!("link {}s", left), Style::default().fg(C_SECONDARY))
                } else {
                    Span::styled("link expired", Style::default().fg(C_PENDING))
                }
            }
            None => Span::raw(""),
        };

        let row = Row::new(vec![
            Line::from(vec![
                Span::styled(marker, style_playing()),
                Span::styled(truncate(&song.title, TITLE_WIDTH), title_style),
            ]),
            Line::from(Span::styled(
                truncate(song.owner_name(), OWNER_WIDTH),
                Style::default().fg(C_OWNER),
            )),
            Line::from(Span::styled(
                format!("♥ {}", song.like),
                Style::default().fg(C_LIKES),
            )),
            Line::from(expiry),
            Line::from(Span::styled(song.description_text(), style_secondary())),
        ]);

        if is_selected {
            row.style(style_selected_focused())
        } else {
            row
        }
    }
}

impl Default for SongList {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

impl Component for SongList {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(target) = self.selected_ref() {
                    return vec![Action::TogglePlay(target)];
                }
            }
            KeyCode::Char('l') => {
                if let Some(target) = self.selected_ref() {
                    return vec![Action::Like(target)];
                }
            }
            KeyCode::Char('a') => return vec![Action::OpenAddSong],
            KeyCode::Char('R') => return vec![Action::Refresh],
            KeyCode::Char('y') => {
                return match state.playback.as_ref() {
                    Some(session) => vec![Action::CopyToClipboard(session.url.clone())],
                    None => vec![Action::Notify(
                        crate::widgets::toast::Severity::Info,
                        "nothing playing".to_string(),
                    )],
                };
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                // Border row plus header row
                let first_row = area.y + 2;
                if event.row >= first_row {
                    let row = (event.row - first_row) as usize;
                    let was = self.selected_index();
                    if self.list.handle_click(row) && was == self.selected_index() {
                        if let Some(target) = self.selected_ref() {
                            return vec![Action::TogglePlay(target)];
                        }
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let count = format!("{} songs", state.songs.len());
        let badge = state.loaded.then(|| Badge {
            text: count.as_str(),
            color: C_SECONDARY,
        });
        let block = pane_chrome("songs", Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            let msg = if state.loaded {
                "  no songs yet, press a to add one"
            } else {
                "  loading songs…"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        // One row for the header
        let content_h = inner.height.saturating_sub(1) as usize;
        self.list.ensure_visible(content_h);
        let selected = self.list.selected;
        let rows: Vec<Row> = self
            .list
            .visible_items(content_h)
            .into_iter()
            .map(|(idx, song)| {
                let playing = state.playback.as_ref().filter(|p| p.index == idx);
                Self::render_row(song, playing, idx == selected, focused)
            })
            .collect();

        let header = Row::new(vec!["  title", "owner", "likes", "", "description"])
            .style(Style::default().fg(C_MUTED));
        let widths = [
            ratatui::layout::Constraint::Length(TITLE_WIDTH as u16 + 2),
            ratatui::layout::Constraint::Length(OWNER_WIDTH as u16),
            ratatui::layout::Constraint::Length(8),
            ratatui::layout::Constraint::Length(13),
            ratatui::layout::Constraint::Min(10),
        ];
        let table = Table::new(rows, widths).header(header).column_spacing(1);

        self.table_state
            .select(Some(self.list.selected.saturating_sub(self.list.scroll_offset)));
        frame.render_stateful_widget(table, inner, &mut self.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            owner: Some("o".to_string()),
            file_path: format!("{id}.mp3"),
            like: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn press(list: &mut SongList, code: KeyCode, state: &AppState) -> Vec<Action> {
        list.handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn selection_follows_song_across_snapshots() {
        let mut state = AppState::new();
        state.songs = vec![song("a"), song("b"), song("c")];
        let mut list = SongList::new();
        list.sync_songs(&state);
        press(&mut list, KeyCode::Down, &state);
        assert_eq!(list.selected_index(), Some(1));

        state.songs = vec![song("z"), song("a"), song("b")];
        list.sync_songs(&state);
        assert_eq!(list.selected_index(), Some(2));
    }

    #[test]
    fn keys_map_to_actions() {
        let mut state = AppState::new();
        state.songs = vec![song("a"), song("b")];
        let mut list = SongList::new();
        list.sync_songs(&state);
        press(&mut list, KeyCode::Char('j'), &state);

        assert!(matches!(
            press(&mut list, KeyCode::Enter, &state).as_slice(),
            [Action::TogglePlay(SongRef { index: 1, id })] if id == "b"
        ));
        assert!(matches!(
            press(&mut list, KeyCode::Char('l'), &state).as_slice(),
            [Action::Like(SongRef { index: 1, id })] if id == "b"
        ));
        assert!(matches!(
            press(&mut list, KeyCode::Char('a'), &state).as_slice(),
            [Action::OpenAddSong]
        ));
        assert!(matches!(
            press(&mut list, KeyCode::Char('R'), &state).as_slice(),
            [Action::Refresh]
        ));
    }

    #[test]
    fn empty_list_ignores_play_and_like() {
        let state = AppState::new();
        let mut list = SongList::new();
        list.sync_songs(&state);
        assert!(press(&mut list, KeyCode::Enter, &state).is_empty());
        assert!(press(&mut list, KeyCode::Char('l'), &state).is_empty());
    }

    #[test]
    fn truncation_marks_the_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
