//! The current playback session.
//!
//! At most one song plays at a time. The session is either absent or names
//! the playing row together with the signed URL fetched for it; every change
//! goes through [`Playback`] so the URL can never outlive its song.

use std::time::Duration;

use chrono::{DateTime, Utc};
use songshare_proto::Song;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub index: usize,
    /// Id of the song at `index` when the session started.
    pub song_id: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl PlaybackSession {
    /// Seconds of URL validity left, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// What a toggle on a row asks the caller to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleStep {
    /// The row was playing; the session has been cleared.
    Stopped,
    /// The row is not playing; fetch a signed URL for `file_path`.
    NeedsUrl { file_path: String },
    /// No such row.
    OutOfRange,
}

#[derive(Debug, Clone, Default)]
pub struct Playback {
    session: Option<PlaybackSession>,
}

impl Playback {
    pub fn current(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn is_playing(&self, index: usize) -> bool {
        self.playing_index() == Some(index)
    }

    /// First half of a toggle. Stopping happens immediately; starting needs
    /// a URL and completes with [`Playback::started`] or [`Playback::failed`].
    pub fn toggle(&mut self, index: usize, songs: &[Song]) -> ToggleStep {
        if self.is_playing(index) {
            self.session = None;
            return ToggleStep::Stopped;
        }
        match songs.get(index) {
            Some(song) => ToggleStep::NeedsUrl {
                file_path: song.file_path.clone(),
            },
            None => ToggleStep::OutOfRange,
        }
    }

    /// Replace any prior session with `index` playing `url`.
    pub fn started(
        &mut self,
        index: usize,
        song: &Song,
        url: String,
        valid_for: Duration,
        now: DateTime<Utc>,
    ) {
        let valid_for = chrono::Duration::from_std(valid_for).unwrap_or(chrono::Duration::zero());
        self.session = Some(PlaybackSession {
            index,
            song_id: song.id.clone(),
            url,
            expires_at: now + valid_for,
        });
    }

    /// URL fetch failed: nothing plays.
    pub fn failed(&mut self) {
        self.session = None;
    }

    pub fn stop(&mut self) {
        self.session = None;
    }

    /// Follow the playing song to its row in a freshly fetched list. Stops if
    /// the song is gone.
    pub fn reindex(&mut self, songs: &[Song]) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match songs.iter().position(|s| s.id == session.song_id) {
            Some(idx) => session.index = idx,
            None => self.session = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            title: format!("title {id}"),
            description: None,
            owner: Some("artist".to_string()),
            file_path: format!("{id}.mp3"),
            like: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn toggle_on_idle_row_requests_url() {
        let songs = vec![song("a"), song("b")];
        let mut pb = Playback::default();
        assert_eq!(
            pb.toggle(1, &songs),
            ToggleStep::NeedsUrl {
                file_path: "b.mp3".into()
            }
        );
        assert!(pb.current().is_none());
    }

    #[test]
    fn toggle_same_row_twice_clears() {
        let songs = vec![song("a")];
        let now = Utc::now();
        let mut pb = Playback::default();
        pb.started(0, &songs[0], "https://u/a".into(), Duration::from_secs(60), now);
        assert!(pb.is_playing(0));
        assert_eq!(pb.current().map(|s| s.url.as_str()), Some("https://u/a"));
        assert_eq!(pb.toggle(0, &songs), ToggleStep::Stopped);
        assert!(pb.current().is_none());
    }

    #[test]
    fn starting_another_row_replaces_session() {
        let songs = vec![song("a"), song("b")];
        let now = Utc::now();
        let mut pb = Playback::default();
        pb.started(0, &songs[0], "u0".into(), Duration::from_secs(60), now);
        pb.started(1, &songs[1], "u1".into(), Duration::from_secs(60), now);
        assert_eq!(pb.playing_index(), Some(1));
        assert_eq!(pb.current().map(|s| s.url.as_str()), Some("u1"));
    }

    #[test]
    fn expiry_follows_validity_window() {
        let songs = vec![song("a")];
        let now = Utc::now();
        let mut pb = Playback::default();
        pb.started(0, &songs[0], "u".into(), Duration::from_secs(60), now);
        let session = pb.current().unwrap();
        assert_eq!(session.remaining_secs(now), 60);
        assert_eq!(session.remaining_secs(now + chrono::Duration::seconds(59)), 1);
        assert_eq!(session.remaining_secs(now + chrono::Duration::seconds(90)), 0);
    }

    #[test]
    fn out_of_range_toggle_is_reported() {
        let mut pb = Playback::default();
        assert_eq!(pb.toggle(3, &[]), ToggleStep::OutOfRange);
    }

    #[test]
    fn reindex_follows_song_or_stops() {
        let now = Utc::now();
        let mut pb = Playback::default();
        pb.started(0, &song("a"), "u".into(), Duration::from_secs(60), now);

        pb.reindex(&[song("x"), song("a")]);
        assert_eq!(pb.playing_index(), Some(1));

        pb.reindex(&[song("x")]);
        assert!(pb.current().is_none());
    }
}
