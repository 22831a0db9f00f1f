//! Everything that can happen to the application, as one sum type.

use ratatui::crossterm::event::KeyEvent;
use sptui_proto::catalog::{
    AlbumSummary, CatalogKind, Detail, NowPlaying, Page, PlaylistSummary, ShowSummary,
};

use crate::command::Client;
use crate::ticker::Generation;

/// A fetched page, tagged with its catalog kind.
#[derive(Debug, Clone)]
pub enum CatalogPage {
    Playlists(Page<PlaylistSummary>),
    Albums(Page<AlbumSummary>),
    Shows(Page<ShowSummary>),
}

#[derive(Debug)]
pub enum Message {
    // ── Terminal ─────────────────────────────────────────────────────────────
    Key(KeyEvent),
    Resize(u16, u16),

    // ── Login ────────────────────────────────────────────────────────────────
    /// Authorize URL of the running login attempt.
    LoginUrl(String),
    Authenticated(Client),
    AuthFailed(String),

    // ── Catalog ──────────────────────────────────────────────────────────────
    Page(CatalogPage),
    PageFailed { kind: CatalogKind, error: String },
    DetailLoaded(Detail),

    // ── Playback ─────────────────────────────────────────────────────────────
    /// `None` when nothing is loaded in the player.
    NowPlaying(Option<NowPlaying>),
    /// A play/pause/next/previous call succeeded.
    PlaybackDone,
    /// Any failed API call, shown as an error line.
    Failed(String),

    // ── Timers ───────────────────────────────────────────────────────────────
    ProgressTick(Generation),
    MarqueeTick(Generation),
}
