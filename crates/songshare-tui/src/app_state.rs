//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it. The App event-loop is the only
//! writer; song data arrives as snapshots from the board core.

use songshare_proto::Song;

use crate::core::BoardSnapshot;
use crate::playback::PlaybackSession;
use crate::widgets::status_bar::InputMode;

pub struct AppState {
    pub input_mode: InputMode,

    // ── Session ─────────────────────────────────────────────────────────────
    pub username: Option<String>,
    pub signing_in: bool,

    // ── Board ───────────────────────────────────────────────────────────────
    pub songs: Vec<Song>,
    pub playback: Option<PlaybackSession>,
    /// A first snapshot arrived for this session.
    pub loaded: bool,

    // ── Log ─────────────────────────────────────────────────────────────────
    pub log_lines: Vec<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            input_mode: InputMode::SignIn,
            username: None,
            signing_in: false,
            songs: Vec::new(),
            playback: None,
            loaded: false,
            log_lines: Vec::new(),
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: BoardSnapshot) {
        self.songs = snapshot.songs;
        self.playback = snapshot.playback;
        self.loaded = true;
    }

    pub fn playing_song(&self) -> Option<&Song> {
        let session = self.playback.as_ref()?;
        self.songs.get(session.index)
    }

    /// Drop everything tied to the signed-in user.
    pub fn clear_session(&mut self) {
        self.username = None;
        self.signing_in = false;
        self.songs.clear();
        self.playback = None;
        self.loaded = false;
        self.input_mode = InputMode::SignIn;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
