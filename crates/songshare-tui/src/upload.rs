//! Add-song form model and upload helpers.
//!
//! ```text
//!  Idle ──edit──▶ Editing ──submit──▶ Submitting ──ok──▶ (closed by caller)
//!                    ▲                     │
//!                    └───────failed────────┘
//! ```

use std::path::{Path, PathBuf};

use songshare_proto::{Song, SongDraft};

/// Extensions offered in the file hint.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "ogg", "flac", "wav"];

const FALLBACK_EXTENSION: &str = "mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Editing,
    Submitting,
}

/// Everything the upload needs, detached from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub draft: SongDraft,
    pub file: PathBuf,
}

/// Result of a submit, handed back to whoever owns the form.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Created(Song),
    Failed(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("upload already in progress")]
    AlreadySubmitting,
    #[error("choose an audio file first")]
    NoFile,
}

#[derive(Debug, Clone)]
pub struct AddSongForm {
    phase: FormPhase,
    draft: SongDraft,
    file: Option<PathBuf>,
}

impl Default for AddSongForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AddSongForm {
    pub fn new() -> Self {
        Self {
            phase: FormPhase::Idle,
            draft: SongDraft::default(),
            file: None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn draft(&self) -> &SongDraft {
        &self.draft
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    // Edits are dropped while a submit is in flight so the request and the
    // form never diverge.
    fn edit(&mut self, apply: impl FnOnce(&mut Self)) {
        if self.is_submitting() {
            return;
        }
        apply(self);
        self.phase = FormPhase::Editing;
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|f| f.draft.title = value);
    }

    pub fn set_owner(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|f| f.draft.owner = value);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|f| f.draft.description = value);
    }

    pub fn set_file(&mut self, path: Option<PathBuf>) {
        self.edit(|f| f.file = path);
    }

    /// Enter `Submitting` and hand out the request. A second submit while one
    /// is in flight is refused.
    pub fn begin_submit(&mut self) -> Result<UploadRequest, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::AlreadySubmitting);
        }
        let file = self.file.clone().ok_or(SubmitError::NoFile)?;
        self.phase = FormPhase::Submitting;
        Ok(UploadRequest {
            draft: self.draft.clone(),
            file,
        })
    }

    /// Back to `Editing` with the draft intact.
    pub fn submit_failed(&mut self) {
        if self.is_submitting() {
            self.phase = FormPhase::Editing;
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// A fresh storage key: `<uuid>.<ext>`.
pub fn storage_key(file: &Path) -> String {
    format!("{}.{}", uuid::Uuid::new_v4(), extension_of(file))
}

/// Content type for the upload, from the file extension.
pub fn content_type_for(file: &Path, default: &str) -> String {
    match extension_of(file).as_str() {
        "mp3" => default.to_string(),
        "m4a" | "mp4" | "aac" => "audio/mp4".to_string(),
        "ogg" | "oga" | "opus" => "audio/ogg".to_string(),
        "flac" => "audio/flac".to_string(),
        "wav" => "audio/wav".to_string(),
        _ => default.to_string(),
    }
}

pub fn has_audio_extension(file: &Path) -> bool {
    file.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Title and artist from the file's tags, when it has any.
pub fn read_tags(file: &Path) -> Option<(Option<String>, Option<String>)> {
    use lofty::file::TaggedFileExt;
    use lofty::tag::Accessor;

    let tagged = lofty::read_from_path(file).ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    let title = tag.title().map(|t| t.to_string());
    let artist = tag.artist().map(|a| a.to_string());
    if title.is_none() && artist.is_none() {
        return None;
    }
    Some((title, artist))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_moves_idle_to_editing() {
        let mut form = AddSongForm::new();
        assert_eq!(form.phase(), FormPhase::Idle);
        form.set_title("T");
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.draft().title, "T");
    }

    #[test]
    fn submit_without_file_is_refused() {
        let mut form = AddSongForm::new();
        form.set_title("T");
        assert_eq!(form.begin_submit(), Err(SubmitError::NoFile));
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn submit_hands_out_request_and_blocks_second_submit() {
        let mut form = AddSongForm::new();
        form.set_title("T");
        form.set_owner("O");
        form.set_description("D");
        form.set_file(Some(PathBuf::from("/music/t.mp3")));

        let req = form.begin_submit().unwrap();
        assert_eq!(req.draft.title, "T");
        assert_eq!(req.draft.owner, "O");
        assert_eq!(req.draft.description, "D");
        assert_eq!(req.file, PathBuf::from("/music/t.mp3"));
        assert!(form.is_submitting());

        assert_eq!(form.begin_submit(), Err(SubmitError::AlreadySubmitting));
        form.set_title("changed mid-flight");
        assert_eq!(form.draft().title, "T");
    }

    #[test]
    fn failure_returns_to_editing_with_draft() {
        let mut form = AddSongForm::new();
        form.set_title("T");
        form.set_file(Some(PathBuf::from("a.mp3")));
        form.begin_submit().unwrap();
        form.submit_failed();
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.draft().title, "T");
        assert!(form.file().is_some());
    }

    #[test]
    fn storage_keys_are_fresh() {
        let a = storage_key(Path::new("song.MP3"));
        let b = storage_key(Path::new("song.mp3"));
        assert_ne!(a, b);
        assert!(a.ends_with(".mp3"));
        assert!(storage_key(Path::new("noext")).ends_with(".mp3"));
        assert!(storage_key(Path::new("x.flac")).ends_with(".flac"));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a.mp3"), "audio/mp3"), "audio/mp3");
        assert_eq!(content_type_for(Path::new("a.FLAC"), "audio/mp3"), "audio/flac");
        assert_eq!(content_type_for(Path::new("a.bin"), "audio/mp3"), "audio/mp3");
        assert!(has_audio_extension(Path::new("x.Ogg")));
        assert!(!has_audio_extension(Path::new("x.txt")));
    }

    #[test]
    fn untagged_file_has_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.mp3");
        std::fs::write(&path, b"not really audio").unwrap();
        assert!(read_tags(&path).is_none());
    }
}
