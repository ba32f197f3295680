//! Action enum — all user-initiated intents and internal events.

use crate::core::SongRef;
use crate::upload::UploadRequest;
use crate::widgets::toast::Severity;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    SignIn,
    SongList,
    AddSong,
    LogPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Session ──────────────────────────────────────────────────────────────
    SignIn { username: String, password: String },
    SignOut,

    // ── Songs ────────────────────────────────────────────────────────────────
    TogglePlay(SongRef),
    Like(SongRef),
    Refresh,

    // ── Add-song form ────────────────────────────────────────────────────────
    OpenAddSong,
    CloseAddSong,
    SubmitUpload(UploadRequest),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,

    // ── UI ───────────────────────────────────────────────────────────────────
    ToggleLogs,
    CopyToClipboard(String),
    Notify(Severity, String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
