/// mpv child-process player.
///
/// One process per signed URL:
///
/// ```text
///   Player::play(url)   ── kill previous ──▶ spawn `mpv --no-video <url>`
///   Player::stop()      ── kill
///   Player::finished()  ── true once the child exited on its own
/// ```
///
/// mpv's stderr is appended to `<data_dir>/mpv-stderr.log`.
use std::path::PathBuf;
use std::process::Stdio;

use tracing::{debug, info, warn};

pub struct Player {
    process: Option<tokio::process::Child>,
    current_url: Option<String>,
    volume: f32,
    binary: Option<PathBuf>,
}

impl Player {
    pub fn new(volume: f32) -> Self {
        Self {
            process: None,
            current_url: None,
            volume,
            binary: songshare_proto::platform::find_mpv_binary(),
        }
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn volume_arg(&self) -> String {
        format!(
            "--volume={}",
            (self.volume * 100.0).clamp(0.0, 100.0).round() as i64
        )
    }

    /// Start playing `url`, replacing whatever was playing.
    pub async fn play(&mut self, url: &str) -> anyhow::Result<()> {
        self.stop().await;

        let binary = self
            .binary
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let stderr_path = songshare_proto::platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(&binary)
            .arg("--no-video")
            .arg("--quiet")
            .arg(self.volume_arg())
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned process with pid {:?}", child.id());
        self.process = Some(child);
        self.current_url = Some(url.to_string());
        Ok(())
    }

    /// Kill the process if running.
    pub async fn stop(&mut self) {
        if let Some(mut p) = self.process.take() {
            debug!("mpv: stopping pid {:?}", p.id());
            let _ = p.kill().await;
        }
        self.current_url = None;
    }

    /// True once when a started process has exited by itself. The player is
    /// idle afterwards.
    pub fn finished(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => false,
            Ok(Some(status)) => {
                match status.code() {
                    Some(0) => info!("mpv: playback finished"),
                    Some(code) => warn!("mpv process exited with code: {}", code),
                    None => warn!("mpv process terminated by signal"),
                }
                self.process = None;
                self.current_url = None;
                true
            }
            Err(e) => {
                warn!("mpv: exit check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_a_clamped_percentage() {
        assert_eq!(Player::new(0.5).volume_arg(), "--volume=50");
        assert_eq!(Player::new(1.7).volume_arg(), "--volume=100");
        assert_eq!(Player::new(-1.0).volume_arg(), "--volume=0");
    }

    #[tokio::test]
    async fn idle_player_is_not_finished() {
        let mut player = Player::new(0.5);
        assert!(!player.finished());
        player.stop().await;
        assert!(player.current_url().is_none());
    }
}
