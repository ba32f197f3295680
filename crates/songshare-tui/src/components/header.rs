//! Header — 2-row top bar.
//!
//! Row 1: app name, signed-in user, now-playing song with link validity.
//! Row 2: separator.
//!
//! Not focusable.

use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    app_state::AppState,
    theme::{C_ACCENT, C_MUTED, C_OWNER, C_PENDING, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SEPARATOR},
};

pub fn draw(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.height == 0 {
        return;
    }
    let row1 = Rect { height: 1, ..area };
    frame.render_widget(Clear, row1);
    frame.render_widget(Paragraph::new(build_row1(state)), row1);

    if area.height >= 2 {
        let row2 = Rect {
            y: area.y + 1,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                "─".repeat(area.width as usize),
                Style::default().fg(C_SEPARATOR),
            )),
            row2,
        );
    }
}

fn build_row1(state: &AppState) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " songshare ",
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    )];

    match (&state.username, state.signing_in) {
        (Some(user), _) => {
            spans.push(Span::styled("· ", Style::default().fg(C_MUTED)));
            spans.push(Span::styled(user.clone(), Style::default().fg(C_SECONDARY)));
        }
        (None, true) => {
            spans.push(Span::styled("· signing in…", Style::default().fg(C_PENDING)));
        }
        (None, false) => {
            spans.push(Span::styled("· signed out", Style::default().fg(C_MUTED)));
        }
    }

    if let (Some(session), Some(song)) = (state.playback.as_ref(), state.playing_song()) {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("▶ ", Style::default().fg(C_PLAYING)));
        spans.push(Span::styled(
            song.title.clone(),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ));
        let owner = song.owner_name();
        if !owner.is_empty() {
            spans.push(Span::styled(" · ", Style::default().fg(C_MUTED)));
            spans.push(Span::styled(owner.to_string(), Style::default().fg(C_OWNER)));
        }
        let left = session.remaining_secs(Utc::now());
        let (text, color) = if left > 0 {
            (format!("  [link {}s]", left), C_MUTED)
        } else {
            ("  [link expired]".to_string(), C_PENDING)
        };
        spans.push(Span::styled(text, Style::default().fg(color)));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackSession;
    use songshare_proto::Song;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn shows_user_and_playing_song() {
        let mut state = AppState::new();
        state.username = Some("ana".into());
        state.songs = vec![Song {
            id: "a".into(),
            title: "Tune".into(),
            description: None,
            owner: Some("Band".into()),
            file_path: "a.mp3".into(),
            like: 0,
            created_at: None,
            updated_at: None,
        }];
        state.playback = Some(PlaybackSession {
            index: 0,
            song_id: "a".into(),
            url: "u".into(),
            expires_at: Utc::now() + chrono::Duration::seconds(30),
        });
        let row = text(&build_row1(&state));
        assert!(row.contains("ana"));
        assert!(row.contains("▶ Tune · Band"));
        assert!(row.contains("[link"));
    }

    #[test]
    fn signed_out_has_no_now_playing() {
        let row = text(&build_row1(&AppState::new()));
        assert!(row.contains("signed out"));
        assert!(!row.contains('▶'));
    }
}
