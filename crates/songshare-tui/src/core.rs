/// BoardCore — single-owner event loop for the song list and playback.
///
/// Spawned once per signed-in session. The UI sends `BoardEvent`s; the core
/// runs the matching gateway calls one at a time against its own `SongBoard`
/// and answers with `BoardUpdate`s (a fresh snapshot after every change, plus
/// notices for the toast area). Remote failures never leave this loop: they
/// are logged, turned into a notice, and the board keeps whatever local state
/// the operation defines for failure.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use songshare_proto::gateway::{BlobGateway, DataGateway};
use songshare_proto::{GatewayError, Song, SongInput};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::playback::{Playback, PlaybackSession, ToggleStep};
use crate::upload::{content_type_for, storage_key, UploadOutcome, UploadRequest};
use crate::widgets::toast::Severity;

// ── Events ────────────────────────────────────────────────────────────────────

/// A row as the UI saw it. The board may have been refreshed since, so the
/// id is what counts; `index` is only a hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub index: usize,
    pub id: String,
}

impl SongRef {
    pub fn new(index: usize, song: &Song) -> Self {
        Self {
            index,
            id: song.id.clone(),
        }
    }
}

#[derive(Debug)]
pub enum BoardEvent {
    Refresh,
    TogglePlay(SongRef),
    /// Stop only if the song is still playing (player exited on its own).
    PlaybackEnded(SongRef),
    Like(SongRef),
    Upload(UploadRequest),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub songs: Vec<Song>,
    pub playback: Option<PlaybackSession>,
}

#[derive(Debug, Clone)]
pub enum BoardUpdate {
    Snapshot(BoardSnapshot),
    Notice(Severity, String),
    Uploaded(UploadOutcome),
    /// The backend refused the session's credentials.
    SessionRejected,
}

/// What a toggle did.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayChange {
    Started(usize),
    Stopped(usize),
    Failed { reason: String, unauthorized: bool },
    Ignored,
}

/// What a like did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeChange {
    Saved(i64),
    /// The song is no longer listed; nothing was sent.
    Gone,
}

// ── SongBoard ─────────────────────────────────────────────────────────────────

pub struct BoardSettings {
    pub url_validity: Duration,
    pub default_content_type: String,
}

/// Session cache of songs plus the playback session, driven through the
/// gateways.
pub struct SongBoard {
    data: Arc<dyn DataGateway>,
    blob: Arc<dyn BlobGateway>,
    settings: BoardSettings,
    songs: Vec<Song>,
    playback: Playback,
}

impl SongBoard {
    pub fn new(
        data: Arc<dyn DataGateway>,
        blob: Arc<dyn BlobGateway>,
        settings: BoardSettings,
    ) -> Self {
        Self {
            data,
            blob,
            settings,
            songs: Vec::new(),
            playback: Playback::default(),
        }
    }

    #[cfg(test)]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[cfg(test)]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Current row of `target`: its index if the id still matches there,
    /// otherwise wherever the id moved to.
    fn resolve(&self, target: &SongRef) -> Option<usize> {
        match self.songs.get(target.index) {
            Some(song) if song.id == target.id => Some(target.index),
            _ => self.songs.iter().position(|s| s.id == target.id),
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            songs: self.songs.clone(),
            playback: self.playback.current().cloned(),
        }
    }

    /// Replace the cache with the server's list, keeping its order. On
    /// failure the cache is left as it was.
    pub async fn refresh(&mut self) -> Result<usize, GatewayError> {
        let songs = self.data.list_songs().await?;
        info!("board: fetched {} songs", songs.len());
        self.songs = songs;
        self.playback.reindex(&self.songs);
        Ok(self.songs.len())
    }

    /// Stop the song if it is playing, otherwise fetch a signed URL and play it.
    pub async fn toggle_play(&mut self, target: &SongRef) -> PlayChange {
        let Some(index) = self.resolve(target) else {
            warn!("board: toggle on song {} which is no longer listed", target.id);
            return PlayChange::Ignored;
        };
        let file_path = match self.playback.toggle(index, &self.songs) {
            ToggleStep::Stopped => return PlayChange::Stopped(index),
            ToggleStep::OutOfRange => {
                warn!("board: toggle on missing row {}", index);
                return PlayChange::Ignored;
            }
            ToggleStep::NeedsUrl { file_path } => file_path,
        };

        match self
            .blob
            .signed_url(&file_path, self.settings.url_validity)
            .await
        {
            Ok(url) => {
                debug!("board: access URL for {}: {}", file_path, url);
                let song = &self.songs[index];
                self.playback
                    .started(index, song, url, self.settings.url_validity, Utc::now());
                PlayChange::Started(index)
            }
            Err(e) => {
                error!("board: signed URL for {} failed [{}]: {}", file_path, e.error_code(), e);
                self.playback.failed();
                PlayChange::Failed {
                    reason: e.to_string(),
                    unauthorized: e.is_unauthorized(),
                }
            }
        }
    }

    pub fn playback_ended(&mut self, target: &SongRef) -> bool {
        let playing = self
            .playback
            .current()
            .is_some_and(|session| session.song_id == target.id);
        if playing {
            self.playback.stop();
            return true;
        }
        false
    }

    /// Add one like and write the record back. The local increment stays even
    /// when the write fails.
    pub async fn like(&mut self, target: &SongRef) -> Result<LikeChange, GatewayError> {
        let Some(index) = self.resolve(target) else {
            warn!("board: like on song {} which is no longer listed", target.id);
            return Ok(LikeChange::Gone);
        };
        let song = &mut self.songs[index];
        song.like += 1;
        let input = SongInput::from(&*song);

        let updated = self.data.update_song(input).await?;
        let likes = updated.like;
        // The list may have been refreshed meanwhile; match by id
        match self.songs.iter().position(|s| s.id == updated.id) {
            Some(pos) => self.songs[pos] = updated,
            None => warn!("board: updated song {} no longer listed", updated.id),
        }
        Ok(LikeChange::Saved(likes))
    }

    /// Upload the file, then create its record. No cleanup if the second step
    /// fails: the blob stays in storage.
    pub async fn upload(&mut self, request: UploadRequest) -> anyhow::Result<Song> {
        use anyhow::Context;

        let bytes = tokio::fs::read(&request.file)
            .await
            .with_context(|| format!("reading {}", request.file.display()))?;
        let key = storage_key(&request.file);
        let content_type = content_type_for(&request.file, &self.settings.default_content_type);

        let stored_key = self
            .blob
            .put(&key, bytes, &content_type)
            .await
            .context("storing audio")?;
        info!("board: stored {} as {}", request.file.display(), stored_key);

        let input = SongInput::new_upload(
            uuid::Uuid::new_v4().to_string(),
            &request.draft,
            stored_key,
        );
        let created = self
            .data
            .create_song(input)
            .await
            .context("creating song record")?;
        info!("board: created song {} ({})", created.id, created.title);
        Ok(created)
    }
}

// ── BoardCore ─────────────────────────────────────────────────────────────────

pub struct BoardCore {
    board: SongBoard,
    update_tx: mpsc::Sender<BoardUpdate>,
}

impl BoardCore {
    pub fn new(board: SongBoard, update_tx: mpsc::Sender<BoardUpdate>) -> Self {
        Self { board, update_tx }
    }

    /// Run until `Shutdown` or until the UI drops its sender.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<BoardEvent>) {
        info!("BoardCore: starting event loop");
        loop {
            let Some(event) = event_rx.recv().await else {
                info!("BoardCore: event channel closed, shutting down");
                break;
            };
            debug!("BoardCore: {:?}", event);
            if matches!(event, BoardEvent::Shutdown) {
                info!("BoardCore: shutdown requested");
                break;
            }
            if !self.handle(event).await {
                break;
            }
        }
    }

    /// Returns `false` once the UI side is gone.
    async fn handle(&mut self, event: BoardEvent) -> bool {
        let mut updates = Vec::new();
        let mut rejected = false;
        match event {
            BoardEvent::Refresh => match self.board.refresh().await {
                Ok(n) => updates.push(notice(Severity::Info, format!("{} songs", n))),
                Err(e) => {
                    error!("BoardCore: fetching songs failed: {}", e);
                    rejected |= e.is_unauthorized();
                    updates.push(notice(Severity::Error, format!("could not load songs: {}", e)));
                }
            },
            BoardEvent::TogglePlay(target) => match self.board.toggle_play(&target).await {
                PlayChange::Failed {
                    reason,
                    unauthorized,
                } => {
                    rejected |= unauthorized;
                    updates.push(notice(Severity::Error, format!("playback failed: {}", reason)));
                }
                other => debug!("BoardCore: toggle {} → {:?}", target.id, other),
            },
            BoardEvent::PlaybackEnded(target) => {
                if !self.board.playback_ended(&target) {
                    return true;
                }
            }
            BoardEvent::Like(target) => match self.board.like(&target).await {
                Ok(LikeChange::Saved(likes)) => {
                    debug!("BoardCore: song {} now has {} likes", target.id, likes);
                    updates.push(notice(Severity::Success, format!("♥ {}", likes)));
                }
                Ok(LikeChange::Gone) => {
                    updates.push(notice(
                        Severity::Warning,
                        "that song is no longer listed".to_string(),
                    ));
                }
                Err(e) => {
                    error!("BoardCore: like on song {} failed: {}", target.id, e);
                    rejected |= e.is_unauthorized();
                    updates.push(notice(Severity::Error, format!("like not saved: {}", e)));
                }
            },
            BoardEvent::Upload(request) => {
                let outcome = match self.board.upload(request).await {
                    Ok(song) => UploadOutcome::Created(song),
                    Err(e) => {
                        error!("BoardCore: upload failed: {:#}", e);
                        rejected |= rejected_by_backend(&e);
                        UploadOutcome::Failed(format!("{:#}", e))
                    }
                };
                let created = matches!(outcome, UploadOutcome::Created(_));
                updates.push(BoardUpdate::Uploaded(outcome));
                if created {
                    if let Err(e) = self.board.refresh().await {
                        error!("BoardCore: refresh after upload failed: {}", e);
                        rejected |= e.is_unauthorized();
                        updates.push(notice(Severity::Error, format!("could not load songs: {}", e)));
                    }
                }
            }
            BoardEvent::Shutdown => return false,
        }

        updates.insert(0, BoardUpdate::Snapshot(self.board.snapshot()));
        if rejected {
            warn!("BoardCore: backend rejected the session");
            updates.push(BoardUpdate::SessionRejected);
        }
        for update in updates {
            if self.update_tx.send(update).await.is_err() {
                return false;
            }
        }
        true
    }
}

fn notice(severity: Severity, message: String) -> BoardUpdate {
    BoardUpdate::Notice(severity, message)
}

fn rejected_by_backend(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<GatewayError>())
        .any(GatewayError::is_unauthorized)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
