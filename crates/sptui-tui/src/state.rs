//! Root state: the single owner of everything on screen and the only place
//! state changes.
//!
//! `update` handles one message at a time, in arrival order, and returns at
//! most one command (possibly a batch). Dispatch order:
//! ```text
//!  1. unauthenticated    quit keys and login messages only
//!  2. Authenticated      store client, fetch the three tabs + now playing
//!  3. TextMode::Input    editing keys go to the command line
//!  4. timer ticks        progress / marquee
//!  5. global keys and result messages
//!  6. TextMode::Input    stop here
//!  7. depth              track list or tab handler
//! ```

use std::ops::ControlFlow;
use std::time::Duration;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sptui_proto::catalog::{
    AlbumSummary, CatalogKind, PlayRequest, PlaylistSummary, ShowSummary,
};
use tracing::{debug, info, warn};

use crate::collection::{Collection, TabView};
use crate::command::{Client, Command};
use crate::message::{CatalogPage, Message};
use crate::navigation::{cursor_move, Depth, Navigator, TextCommand, TextMode};
use crate::ticker::PlaybackTicker;
use crate::widgets::command_input::CommandInput;

/// Delay before re-reading the player after a playback command, so the
/// snapshot reflects the change.
pub const PLAYBACK_SETTLE: Duration = Duration::from_millis(500);

pub struct RootState {
    client: Option<Client>,
    login_url: Option<String>,
    auth_error: Option<String>,
    active_tab: CatalogKind,
    playlists: Collection<PlaylistSummary>,
    albums: Collection<AlbumSummary>,
    shows: Collection<ShowSummary>,
    nav: Navigator,
    input: CommandInput,
    ticker: PlaybackTicker,
}

impl Default for RootState {
    fn default() -> Self {
        Self::new()
    }
}

impl RootState {
    pub fn new() -> Self {
        Self {
            client: None,
            login_url: None,
            auth_error: None,
            active_tab: CatalogKind::Playlist,
            playlists: Collection::new(CatalogKind::Playlist),
            albums: Collection::new(CatalogKind::Album),
            shows: Collection::new(CatalogKind::Podcast),
            nav: Navigator::default(),
            input: CommandInput::default(),
            ticker: PlaybackTicker::default(),
        }
    }

    /// First command of the program: authenticate.
    pub fn init(&self) -> Command {
        Command::Login
    }

    // ── Accessors (read by the renderer and the dispatcher) ───────────────────

    pub fn is_authorized(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn login_url(&self) -> Option<&str> {
        self.login_url.as_deref()
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    pub fn active_tab(&self) -> CatalogKind {
        self.active_tab
    }

    pub fn depth(&self) -> Depth {
        self.nav.depth()
    }

    pub fn text_mode(&self) -> TextMode {
        self.nav.text_mode()
    }

    pub fn nav(&self) -> &Navigator {
        &self.nav
    }

    pub fn nav_mut(&mut self) -> &mut Navigator {
        &mut self.nav
    }

    pub fn input(&self) -> &CommandInput {
        &self.input
    }

    pub fn ticker(&self) -> &PlaybackTicker {
        &self.ticker
    }

    pub fn tab(&self, kind: CatalogKind) -> &dyn TabView {
        match kind {
            CatalogKind::Playlist => &self.playlists,
            CatalogKind::Album => &self.albums,
            CatalogKind::Podcast => &self.shows,
        }
    }

    pub fn tab_mut(&mut self, kind: CatalogKind) -> &mut dyn TabView {
        match kind {
            CatalogKind::Playlist => &mut self.playlists,
            CatalogKind::Album => &mut self.albums,
            CatalogKind::Podcast => &mut self.shows,
        }
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub fn update(&mut self, msg: Message) -> Option<Command> {
        if let Message::Resize(cols, _) = msg {
            return self.ticker.set_terminal_width(cols);
        }

        // 1.
        if !self.is_authorized() {
            return self.update_unauthorized(msg);
        }

        // 3.
        if self.nav.text_mode() == TextMode::Input {
            if let Message::Key(key) = &msg {
                if !is_input_control_key(key) {
                    self.input.handle_key(*key);
                    return None;
                }
            }
        }

        // 4.
        match msg {
            Message::ProgressTick(generation) => return self.ticker.progress_tick(generation),
            Message::MarqueeTick(generation) => return self.ticker.marquee_tick(generation),
            _ => {}
        }

        // 5.
        let key = match msg {
            Message::Key(key) => {
                if let ControlFlow::Break(cmd) = self.handle_global_key(key) {
                    return cmd;
                }
                key
            }
            Message::NowPlaying(snapshot) => return self.ticker.apply_snapshot(snapshot),
            Message::PlaybackDone => {
                return Some(Command::FetchNowPlaying {
                    delay: PLAYBACK_SETTLE,
                })
            }
            Message::Failed(text) => {
                warn!("request failed: {}", text);
                self.nav.show_error(text);
                return None;
            }
            Message::Page(page) => {
                self.apply_page(page);
                return None;
            }
            Message::PageFailed { kind, error } => {
                warn!("{} page failed: {}", kind.label(), error);
                self.tab_mut(kind).fetch_failed();
                self.nav.show_error(error);
                return None;
            }
            Message::DetailLoaded(detail) => {
                self.nav.accept_detail(detail);
                return None;
            }
            Message::Authenticated(_) | Message::LoginUrl(_) | Message::AuthFailed(_) => {
                debug!("login message after authentication ignored");
                return None;
            }
            Message::Resize(..) | Message::ProgressTick(_) | Message::MarqueeTick(_) => {
                return None
            }
        };

        // 6.
        if self.nav.text_mode() == TextMode::Input {
            return None;
        }

        // 7.
        match self.nav.depth() {
            Depth::TrackList => self.handle_tracklist_key(key),
            Depth::Top => self.handle_tab_key(key),
        }
    }

    fn update_unauthorized(&mut self, msg: Message) -> Option<Command> {
        match msg {
            Message::Key(key) if is_ctrl_c(&key) || key.code == KeyCode::Char('q') => {
                Some(Command::Quit)
            }
            Message::LoginUrl(url) => {
                self.login_url = Some(url);
                None
            }
            Message::AuthFailed(error) => {
                self.auth_error = Some(error);
                None
            }
            // 2.
            Message::Authenticated(client) => {
                info!("authorized, loading library");
                self.client = Some(client);
                self.login_url = None;
                self.auth_error = None;
                self.playlists.begin_first_fetch();
                self.albums.begin_first_fetch();
                self.shows.begin_first_fetch();
                Some(Command::Batch(vec![
                    Command::FetchPage {
                        kind: CatalogKind::Album,
                        offset: 0,
                    },
                    Command::FetchPage {
                        kind: CatalogKind::Playlist,
                        offset: 0,
                    },
                    Command::FetchPage {
                        kind: CatalogKind::Podcast,
                        offset: 0,
                    },
                    Command::FetchNowPlaying {
                        delay: Duration::ZERO,
                    },
                ]))
            }
            _ => None,
        }
    }

    fn apply_page(&mut self, page: CatalogPage) {
        match page {
            CatalogPage::Playlists(p) => self.playlists.append(p),
            CatalogPage::Albums(p) => self.albums.append(p),
            CatalogPage::Shows(p) => self.shows.append(p),
        }
    }

    /// Keys that act regardless of depth. `Break` means handled.
    fn handle_global_key(&mut self, key: KeyEvent) -> ControlFlow<Option<Command>> {
        if is_ctrl_c(&key) {
            return ControlFlow::Break(Some(Command::Quit));
        }
        match (self.nav.text_mode(), key.code) {
            (TextMode::None, KeyCode::Char(':')) => {
                self.nav.open_input();
                self.input.clear();
                ControlFlow::Break(None)
            }
            (TextMode::Input, KeyCode::Enter) => {
                let text = self.input.take();
                self.nav.close_input();
                ControlFlow::Break(self.run_text_command(&text))
            }
            (TextMode::Input, KeyCode::Esc) => {
                self.input.clear();
                self.nav.close_input();
                ControlFlow::Break(None)
            }
            (TextMode::Error, KeyCode::Enter) => {
                self.nav.dismiss_error();
                ControlFlow::Break(None)
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn run_text_command(&self, text: &str) -> Option<Command> {
        let Some(command) = TextCommand::parse(text) else {
            debug!("unknown command {:?}", text);
            return None;
        };
        match command {
            TextCommand::Play => {
                let playback = self.ticker.playback()?;
                if playback.is_playing {
                    return None;
                }
                Some(Command::Play(PlayRequest::uri(
                    playback.item.uri.clone(),
                    Some(playback.elapsed_ms),
                )))
            }
            TextCommand::Pause => Some(Command::Pause),
            TextCommand::Next => Some(Command::Next),
            TextCommand::Prev => Some(Command::Previous),
        }
    }

    fn handle_tab_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') => return Some(Command::Quit),
            KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Tab | KeyCode::Right => {
                self.switch_tab(1);
                return None;
            }
            KeyCode::Char('h') | KeyCode::Char('p') | KeyCode::BackTab | KeyCode::Left => {
                self.switch_tab(-1);
                return None;
            }
            _ => {}
        }

        let kind = self.active_tab;
        if !self.tab(kind).is_loaded() {
            let wants_items = cursor_move(&key).is_some()
                || matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
            if !wants_items {
                return None;
            }
            return self
                .tab_mut(kind)
                .retry_first_page()
                .map(|offset| Command::FetchPage { kind, offset });
        }

        if let Some(movement) = cursor_move(&key) {
            let tab = self.tab_mut(kind);
            tab.move_cursor(movement);
            return tab
                .request_more()
                .map(|offset| Command::FetchPage { kind, offset });
        }

        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                let (id, name) = self.tab(kind).selected_entry()?;
                self.nav.drill_in(kind, id.clone(), name);
                Some(Command::FetchDetail { kind, id })
            }
            _ => None,
        }
    }

    /// Move the active tab by `step`, clamped to the first/last tab.
    fn switch_tab(&mut self, step: isize) {
        let last = CatalogKind::ALL.len() as isize - 1;
        let idx = (self.active_tab.index() as isize + step).clamp(0, last);
        if let Some(kind) = CatalogKind::from_index(idx as usize) {
            self.active_tab = kind;
        }
    }

    fn handle_tracklist_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Esc {
            self.nav.back();
            return None;
        }
        let selection = self.nav.selection_mut()?;
        if let Some(movement) = cursor_move(&key) {
            selection.tracks().apply(movement);
            return None;
        }
        match key.code {
            KeyCode::Enter => selection.play_selected().map(Command::Play),
            _ => None,
        }
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Keys the command line never consumes.
fn is_input_control_key(key: &KeyEvent) -> bool {
    is_ctrl_c(key) || matches!(key.code, KeyCode::Enter | KeyCode::Esc)
}
