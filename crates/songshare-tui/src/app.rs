//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks:
//!   terminal input, sign-in results and board updates.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Remote work goes to the per-session `BoardCore` through `BoardEvent`s.
//!   Its updates come back tagged with the session generation so a late
//!   update from a signed-out session is dropped.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use songshare_proto::auth::Session;
use songshare_proto::blob::HttpBlobStore;
use songshare_proto::config::Config;
use songshare_proto::gateway::AuthProvider;
use songshare_proto::graphql::GraphQlGateway;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        add_song::AddSongPanel,
        header,
        log_panel::{LogPanel, LOG_TAIL},
        sign_in::SignInForm,
        song_list::SongList,
    },
    core::{BoardCore, BoardEvent, BoardSettings, BoardUpdate, SongBoard, SongRef},
    focus::FocusRing,
    player::Player,
    upload::UploadOutcome,
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    SignedIn(Result<Session, String>),
    /// An update from the board core of session `generation`.
    Board(u64, BoardUpdate),
}

/// Last-drawn rects for mouse hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    songs: Rect,
    log: Rect,
}

pub struct App {
    config: Config,
    auth: Arc<dyn AuthProvider>,
    session: Option<Session>,
    board_tx: Option<mpsc::Sender<BoardEvent>>,
    /// Bumped on every sign-in and sign-out.
    generation: u64,
    tx: Option<mpsc::Sender<AppMessage>>,

    state: AppState,
    focus: FocusRing,
    sign_in: SignInForm,
    song_list: SongList,
    add_song: AddSongPanel,
    log_panel: LogPanel,
    toast: ToastManager,
    player: Player,

    log_path: PathBuf,
    show_log_panel: bool,
    pane_areas: PaneAreas,
    player_warned: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, auth: Arc<dyn AuthProvider>, log_path: PathBuf) -> Self {
        let player = Player::new(config.player.volume);
        Self {
            config,
            auth,
            session: None,
            board_tx: None,
            generation: 0,
            tx: None,
            state: AppState::new(),
            focus: FocusRing::new(vec![ComponentId::SignIn]),
            sign_in: SignInForm::new(),
            song_list: SongList::new(),
            add_song: AddSongPanel::new(),
            log_panel: LogPanel::new(),
            toast: ToastManager::new(),
            player,
            log_path,
            show_log_panel: false,
            pane_areas: PaneAreas::default(),
            player_warned: false,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Link-validity countdown
        let mut ui_tick = tokio::time::interval(Duration::from_secs(1));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // mpv exit check
        let mut player_tick = tokio::time::interval(Duration::from_millis(500));
        player_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // songshare.log tail, only while the log panel is open
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }

                _ = ui_tick.tick() => {
                    needs_redraw = self.state.playback.is_some();
                }

                _ = player_tick.tick() => {
                    if self.player.finished() {
                        let ended = self.state.playback.as_ref().map(|p| SongRef {
                            index: p.index,
                            id: p.song_id.clone(),
                        });
                        if let Some(target) = ended {
                            self.send_board(BoardEvent::PlaybackEnded(target)).await;
                        }
                    }
                }

                _ = log_refresh.tick() => {
                    if self.show_log_panel {
                        self.reload_log();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("songshare shutting down");
        self.player.stop().await;
        if let Some(board_tx) = self.board_tx.take() {
            let _ = board_tx.send(BoardEvent::Shutdown).await;
        }
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Returns whether a redraw is needed.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for action in self.handle_key(key) {
                        self.dispatch(action).await;
                    }
                }
                Event::Mouse(mouse) => {
                    for action in self.handle_mouse(mouse) {
                        self.dispatch(action).await;
                    }
                }
                Event::Resize(..) => {}
                _ => return false,
            },

            AppMessage::SignedIn(Ok(session)) => {
                self.start_session(session).await;
            }

            AppMessage::SignedIn(Err(msg)) => {
                warn!("sign-in failed: {}", msg);
                self.state.signing_in = false;
                self.sign_in.clear_password();
                self.toast.error(format!("sign-in failed: {}", msg));
            }

            AppMessage::Board(generation, update) => {
                if generation != self.generation {
                    debug!("dropping update from session {}", generation);
                    return false;
                }
                self.on_board_update(update).await;
            }
        }
        true
    }

    async fn on_board_update(&mut self, update: BoardUpdate) {
        match update {
            BoardUpdate::Snapshot(snapshot) => {
                self.state.apply_snapshot(snapshot);
                self.song_list.sync_songs(&self.state);
                self.sync_player().await;
            }
            BoardUpdate::Notice(severity, message) => {
                self.toast.push(message, severity);
            }
            BoardUpdate::Uploaded(outcome) => {
                self.add_song.on_outcome(&outcome);
                match &outcome {
                    UploadOutcome::Created(song) => {
                        self.toast
                            .resolve_spinner(Severity::Success, format!("added \"{}\"", song.title));
                        self.set_mode(InputMode::Normal);
                    }
                    UploadOutcome::Failed(msg) => {
                        self.toast
                            .resolve_spinner(Severity::Error, format!("upload failed: {}", msg));
                    }
                }
            }
            BoardUpdate::SessionRejected => {
                warn!("backend rejected the session");
                self.end_session().await;
                self.toast.warning("session no longer valid, sign in again");
            }
        }
    }

    /// Make mpv follow the playback session.
    async fn sync_player(&mut self) {
        let wanted = self.state.playback.as_ref().map(|p| p.url.clone());
        if wanted.as_deref() == self.player.current_url() {
            return;
        }
        match wanted {
            Some(url) => {
                if let Err(e) = self.player.play(&url).await {
                    warn!("player: {:#}", e);
                    if !self.player_warned {
                        self.player_warned = true;
                        self.toast
                            .warning(format!("cannot play audio ({}), y copies the link", e));
                    }
                }
            }
            None => self.player.stop().await,
        }
    }

    // ── Session ───────────────────────────────────────────────────────────────

    async fn start_session(&mut self, session: Session) {
        self.state.signing_in = false;

        let gateways = GraphQlGateway::new(&self.config.backend, &session).and_then(|data| {
            HttpBlobStore::new(&self.config.storage, &session).map(|blob| (data, blob))
        });
        let (data, blob) = match gateways {
            Ok(pair) => pair,
            Err(e) => {
                error!("building gateways failed: {}", e);
                self.toast.error(format!("cannot reach backend: {}", e));
                return;
            }
        };
        let board = SongBoard::new(
            Arc::new(data),
            Arc::new(blob),
            BoardSettings {
                url_validity: self.config.storage.signed_url_expiry(),
                default_content_type: self.config.storage.default_content_type.clone(),
            },
        );

        self.generation += 1;
        let (event_tx, event_rx) = mpsc::channel::<BoardEvent>(64);
        let (update_tx, mut update_rx) = mpsc::channel::<BoardUpdate>(64);
        tokio::spawn(BoardCore::new(board, update_tx).run(event_rx));

        // ── Forward board updates into the app bus ───────────────────────────
        if let Some(tx) = self.tx.clone() {
            let generation = self.generation;
            tokio::spawn(async move {
                while let Some(update) = update_rx.recv().await {
                    if tx.send(AppMessage::Board(generation, update)).await.is_err() {
                        break;
                    }
                }
            });
        }

        info!("signed in as {}", session.username);
        self.toast.success(format!("signed in as {}", session.username));
        self.state.username = Some(session.username.clone());
        self.session = Some(session);
        self.board_tx = Some(event_tx);
        self.set_mode(InputMode::Normal);
        self.send_board(BoardEvent::Refresh).await;
    }

    async fn end_session(&mut self) {
        if let Some(board_tx) = self.board_tx.take() {
            let _ = board_tx.send(BoardEvent::Shutdown).await;
        }
        self.generation += 1;
        self.player.stop().await;
        self.add_song.discard();
        if self.toast.has_spinner() {
            self.toast.resolve_spinner(Severity::Warning, "upload abandoned");
        }

        if let Some(session) = self.session.take() {
            info!("signing out {}", session.username);
            let auth = self.auth.clone();
            tokio::spawn(async move {
                if let Err(e) = auth.sign_out(&session).await {
                    warn!("sign-out call failed: {}", e);
                }
            });
        }
        self.state.clear_session();
        self.song_list.sync_songs(&self.state);
        self.sign_in.clear_password();
        self.set_mode(InputMode::SignIn);
    }

    /// Hand an event to the board core. An expired session signs out instead.
    async fn send_board(&mut self, event: BoardEvent) {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.is_expired(Utc::now()))
        {
            warn!("session expired");
            self.end_session().await;
            self.toast.warning("session expired, sign in again");
            return;
        }
        match &self.board_tx {
            Some(tx) => {
                if tx.send(event).await.is_err() {
                    error!("board core is gone");
                    self.toast.error("song service stopped, sign in again");
                }
            }
            None => debug!("no board; dropping {:?}", event),
        }
    }

    // ── Focus / mode ──────────────────────────────────────────────────────────

    fn set_mode(&mut self, mode: InputMode) {
        self.state.input_mode = mode;
        let items = match mode {
            InputMode::SignIn => vec![ComponentId::SignIn],
            InputMode::Form => vec![ComponentId::AddSong],
            InputMode::Normal => {
                let mut items = vec![ComponentId::SongList];
                if self.show_log_panel {
                    items.push(ComponentId::LogPanel);
                }
                items
            }
        };
        self.focus.set_items(items);
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // Global keys, whatever the mode
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return vec![Action::Quit],
                KeyCode::Char('o') if self.session.is_some() => return vec![Action::SignOut],
                _ => {}
            }
        }

        match self.state.input_mode {
            InputMode::SignIn => return self.sign_in.handle_key(key, &self.state),
            InputMode::Form => return self.add_song.handle_key(key, &self.state),
            InputMode::Normal => {}
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        match self.focus.current() {
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, &self.state),
            _ => self.song_list.handle_key(key, &self.state),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Action> {
        if self.state.input_mode != InputMode::Normal {
            return vec![];
        }
        let pos = Position::new(mouse.column, mouse.row);
        let areas = self.pane_areas.clone();
        if areas.songs.contains(pos) {
            self.focus.set(ComponentId::SongList);
            return self.song_list.handle_mouse(mouse, areas.songs, &self.state);
        }
        if areas.log.contains(pos) {
            self.focus.set(ComponentId::LogPanel);
            return self.log_panel.handle_mouse(mouse, areas.log, &self.state);
        }
        vec![]
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        match action {
            Action::SignIn { username, password } => {
                if self.state.signing_in {
                    return;
                }
                let Some(tx) = self.tx.clone() else {
                    return;
                };
                info!("signing in as {}", username);
                self.state.signing_in = true;
                let auth = self.auth.clone();
                tokio::spawn(async move {
                    let result = auth
                        .sign_in(&username, &password)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppMessage::SignedIn(result)).await;
                });
            }
            Action::SignOut => {
                self.end_session().await;
                self.toast.info("signed out");
            }

            Action::TogglePlay(target) => self.send_board(BoardEvent::TogglePlay(target)).await,
            Action::Like(target) => self.send_board(BoardEvent::Like(target)).await,
            Action::Refresh => self.send_board(BoardEvent::Refresh).await,

            Action::OpenAddSong => {
                self.add_song.open();
                self.set_mode(InputMode::Form);
            }
            Action::CloseAddSong => {
                if self.add_song.close() {
                    self.set_mode(InputMode::Normal);
                }
            }
            Action::SubmitUpload(request) => {
                let name = request
                    .file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                info!("uploading {}", request.file.display());
                self.toast.spinner(format!("uploading {}", name));
                self.send_board(BoardEvent::Upload(request)).await;
            }

            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }

            Action::ToggleLogs => {
                self.show_log_panel = !self.show_log_panel;
                if self.show_log_panel {
                    self.reload_log();
                    self.log_panel.jump_to_end();
                }
                let mode = self.state.input_mode;
                self.set_mode(mode);
            }
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Notify(severity, message) => self.toast.push(message, severity),

            Action::Quit => self.should_quit = true,
        }
    }

    fn reload_log(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.log_path) {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(LOG_TAIL);
            self.state.log_lines = lines[start..].iter().map(|l| l.to_string()).collect();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | (log) | statusbar ──────────────────
        let log_h = if self.show_log_panel { 10u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(1),
            ])
            .split(area);
        let (header_area, body_area, log_area, status_area) = (outer[0], outer[1], outer[2], outer[3]);

        header::draw(frame, header_area, &self.state);
        status_bar::draw_keys_bar(frame, status_area, self.state.input_mode);

        if self.show_log_panel {
            let focused = self.focus.is_focused(ComponentId::LogPanel);
            self.log_panel.draw(frame, log_area, focused, &self.state);
            self.pane_areas.log = log_area;
        } else {
            self.pane_areas.log = Rect::default();
        }

        match self.state.input_mode {
            InputMode::SignIn => {
                self.pane_areas.songs = Rect::default();
                self.sign_in.draw(frame, body_area, true, &self.state);
            }
            InputMode::Normal | InputMode::Form => {
                let focused = self.focus.is_focused(ComponentId::SongList);
                self.song_list.draw(frame, body_area, focused, &self.state);
                self.pane_areas.songs = body_area;
                if self.add_song.open {
                    self.add_song.draw(frame, body_area, true, &self.state);
                }
            }
        }

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}
