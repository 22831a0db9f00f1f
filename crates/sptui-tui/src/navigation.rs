//! View depth, the text-command overlay and the drilled-in track list.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use sptui_proto::catalog::{CatalogKind, Detail, PlayRequest, TrackEntry};
use tracing::debug;

use crate::widgets::scrollable_list::{CursorMove, ScrollableList};

/// Rows moved by PageUp/PageDown.
const PAGE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Top,
    TrackList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    None,
    Input,
    Error,
}

/// Commands accepted on the `:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCommand {
    Play,
    Pause,
    Next,
    Prev,
}

impl TextCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "next" => Some(Self::Next),
            "prev" => Some(Self::Prev),
            _ => None,
        }
    }
}

/// Decode list movement keys.
pub fn cursor_move(key: &KeyEvent) -> Option<CursorMove> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(CursorMove::Down(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(CursorMove::Up(1)),
        KeyCode::PageDown => Some(CursorMove::Down(PAGE_ROWS)),
        KeyCode::PageUp => Some(CursorMove::Up(PAGE_ROWS)),
        KeyCode::Char('g') | KeyCode::Home => Some(CursorMove::First),
        KeyCode::Char('G') | KeyCode::End => Some(CursorMove::Last),
        _ => None,
    }
}

/// The entity drilled into from a tab. Tracks stay empty ("Loading…") until
/// the matching detail arrives.
pub struct DetailSelection {
    pub kind: CatalogKind,
    pub id: String,
    pub name: String,
    detail: Option<Detail>,
    tracks: ScrollableList<TrackEntry>,
}

impl DetailSelection {
    pub fn pending(kind: CatalogKind, id: String, name: String) -> Self {
        Self {
            kind,
            id,
            name,
            detail: None,
            tracks: ScrollableList::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.detail.is_none()
    }

    pub fn title(&self) -> String {
        match &self.detail {
            Some(d) => d.title(),
            None => self.name.clone(),
        }
    }

    pub fn tracks(&mut self) -> &mut ScrollableList<TrackEntry> {
        &mut self.tracks
    }

    fn fill(&mut self, detail: Detail) {
        self.tracks.set_items(detail.tracks.clone());
        self.tracks.select_first();
        self.detail = Some(detail);
    }

    /// Play request for the track under the cursor: playlists and albums play
    /// their context from that position, podcasts play the single episode.
    /// Unavailable rows play nothing.
    pub fn play_selected(&self) -> Option<PlayRequest> {
        let detail = self.detail.as_ref()?;
        let track = self.tracks.selected_item().filter(|t| t.is_playable())?;
        Some(match self.kind {
            CatalogKind::Playlist | CatalogKind::Album => {
                PlayRequest::context_at(detail.uri.clone(), self.tracks.selected)
            }
            CatalogKind::Podcast => PlayRequest::uri(track.uri.clone(), None),
        })
    }
}

/// Depth and text mode, plus the state that only exists in one of them.
pub struct Navigator {
    depth: Depth,
    text_mode: TextMode,
    error: Option<String>,
    selection: Option<DetailSelection>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            depth: Depth::Top,
            text_mode: TextMode::None,
            error: None,
            selection: None,
        }
    }
}

impl Navigator {
    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn text_mode(&self) -> TextMode {
        self.text_mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> Option<&DetailSelection> {
        self.selection.as_ref()
    }

    pub fn selection_mut(&mut self) -> Option<&mut DetailSelection> {
        self.selection.as_mut()
    }

    /// `None → Input`. Returns false (and changes nothing) from other modes.
    pub fn open_input(&mut self) -> bool {
        if self.text_mode != TextMode::None {
            return false;
        }
        self.text_mode = TextMode::Input;
        true
    }

    pub fn close_input(&mut self) {
        if self.text_mode == TextMode::Input {
            self.text_mode = TextMode::None;
        }
    }

    pub fn show_error(&mut self, text: String) {
        self.text_mode = TextMode::Error;
        self.error = Some(text);
    }

    pub fn dismiss_error(&mut self) {
        if self.text_mode == TextMode::Error {
            self.text_mode = TextMode::None;
            self.error = None;
        }
    }

    /// `Top → TrackList` with a placeholder until the detail arrives.
    pub fn drill_in(&mut self, kind: CatalogKind, id: String, name: String) {
        debug!("drill into {} {}", kind.label(), id);
        self.selection = Some(DetailSelection::pending(kind, id, name));
        self.depth = Depth::TrackList;
    }

    /// `TrackList → Top`; the selection is discarded.
    pub fn back(&mut self) {
        self.selection = None;
        self.depth = Depth::Top;
    }

    /// Populate the pending selection. Details for anything other than the
    /// current selection are dropped.
    pub fn accept_detail(&mut self, detail: Detail) -> bool {
        match self.selection.as_mut() {
            Some(sel) if sel.kind == detail.kind && sel.id == detail.id => {
                sel.fill(detail);
                true
            }
            _ => {
                debug!("dropping stale detail for {}", detail.id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(kind: CatalogKind, id: &str, n: usize) -> Detail {
        Detail {
            kind,
            id: id.to_string(),
            uri: format!("spotify:{}:{}", kind.label().to_lowercase(), id),
            name: "Name".to_string(),
            artist: None,
            tracks: (0..n)
                .map(|i| TrackEntry {
                    name: format!("t{}", i),
                    uri: format!("spotify:track:{}", i),
                })
                .collect(),
        }
    }

    #[test]
    fn text_commands_parse_trimmed() {
        assert_eq!(TextCommand::parse("  pause "), Some(TextCommand::Pause));
        assert_eq!(TextCommand::parse("prev"), Some(TextCommand::Prev));
        assert_eq!(TextCommand::parse("previous"), None);
        assert_eq!(TextCommand::parse(""), None);
    }

    #[test]
    fn input_opens_only_from_none() {
        let mut nav = Navigator::default();
        nav.show_error("oops".into());
        assert!(!nav.open_input());
        assert_eq!(nav.text_mode(), TextMode::Error);
        nav.dismiss_error();
        assert_eq!(nav.error(), None);
        assert!(nav.open_input());
        assert_eq!(nav.text_mode(), TextMode::Input);
    }

    #[test]
    fn stale_detail_is_dropped() {
        let mut nav = Navigator::default();
        nav.drill_in(CatalogKind::Album, "a1".into(), "First".into());
        nav.back();
        nav.drill_in(CatalogKind::Album, "a2".into(), "Second".into());

        assert!(!nav.accept_detail(detail(CatalogKind::Album, "a1", 3)));
        assert!(nav.selection().unwrap().is_loading());
        assert!(nav.accept_detail(detail(CatalogKind::Album, "a2", 3)));
        assert!(!nav.selection().unwrap().is_loading());
        assert_eq!(nav.depth(), Depth::TrackList);
    }

    #[test]
    fn play_request_depends_on_kind() {
        let mut album = DetailSelection::pending(CatalogKind::Album, "a".into(), "A".into());
        assert_eq!(album.play_selected(), None);
        album.fill(detail(CatalogKind::Album, "a", 4));
        album.tracks().select_down(2);
        assert_eq!(
            album.play_selected(),
            Some(PlayRequest::context_at("spotify:album:a", 2))
        );

        let mut show = DetailSelection::pending(CatalogKind::Podcast, "s".into(), "S".into());
        show.fill(detail(CatalogKind::Podcast, "s", 4));
        show.tracks().select_down(1);
        assert_eq!(
            show.play_selected(),
            Some(PlayRequest::uri("spotify:track:1", None))
        );
    }

    #[test]
    fn playlist_position_counts_unavailable_rows() {
        let mut playlist =
            DetailSelection::pending(CatalogKind::Playlist, "p1".into(), "Mix".into());
        let mut d = detail(CatalogKind::Playlist, "p1", 0);
        d.tracks = vec![
            TrackEntry::unavailable(),
            TrackEntry {
                name: "One".into(),
                uri: "spotify:track:1".into(),
            },
            TrackEntry {
                name: "Two".into(),
                uri: "spotify:track:2".into(),
            },
        ];
        playlist.fill(d);

        assert_eq!(playlist.play_selected(), None);
        playlist.tracks().select_down(2);
        assert_eq!(playlist.tracks().selected_item().unwrap().name, "Two");
        assert_eq!(
            playlist.play_selected(),
            Some(PlayRequest::context_at("spotify:playlist:p1", 2))
        );
    }
}
