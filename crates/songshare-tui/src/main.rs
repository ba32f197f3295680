mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod focus;
mod playback;
mod player;
mod theme;
mod upload;
mod widgets;

use std::sync::Arc;

use songshare_proto::auth::CognitoAuth;
use songshare_proto::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = songshare_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("songshare.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("songshare log: {}", log_path.display());
    tracing::info!("songshare starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {:#}; using defaults", e);
        Config::default()
    });
    if config.auth.client_id.is_empty() {
        tracing::warn!(
            "auth.client_id is empty; set it in {}",
            Config::config_path().display()
        );
    }

    let auth = CognitoAuth::new(&config.auth)?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config, Arc::new(auth), log_path);
    app.run().await
}
