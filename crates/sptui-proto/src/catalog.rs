//! Typed catalog model: saved collections, drill-in details, the
//! now-playing snapshot and play requests.

use serde::{Deserialize, Serialize};

/// The three browsable catalog kinds, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Playlist,
    Album,
    Podcast,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [Self::Playlist, Self::Album, Self::Podcast];

    pub fn label(self) -> &'static str {
        match self {
            Self::Playlist => "Playlist",
            Self::Album => "Album",
            Self::Podcast => "Podcast",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Playlist => 0,
            Self::Album => 1,
            Self::Podcast => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }
}

/// One page of a saved collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub total: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, offset: u32, total: u32) -> Self {
        Self {
            items,
            offset,
            total,
        }
    }
}

/// Anything that can appear as a row of a tab.
pub trait CatalogEntry {
    fn id(&self) -> &str;
    fn display_name(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub added_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl CatalogEntry for PlaylistSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl CatalogEntry for AlbumSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl CatalogEntry for ShowSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// A playable row of a detail view (track or episode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub name: String,
    pub uri: String,
}

impl TrackEntry {
    /// Placeholder row for an item the server no longer serves.
    pub fn unavailable() -> Self {
        Self {
            name: "(unavailable)".to_string(),
            uri: String::new(),
        }
    }

    pub fn is_playable(&self) -> bool {
        !self.uri.is_empty()
    }
}

/// Full detail of a drilled-into entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub kind: CatalogKind,
    pub id: String,
    pub uri: String,
    pub name: String,
    /// Primary artist for albums; shown next to the title.
    pub artist: Option<String>,
    pub tracks: Vec<TrackEntry>,
}

impl Detail {
    pub fn title(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} ({})", self.name, artist),
            None => self.name.clone(),
        }
    }
}

/// The item currently loaded in the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayingItem {
    pub name: String,
    pub uri: String,
    /// Artist for tracks, show name for episodes.
    pub by: Option<String>,
    pub duration_ms: u64,
}

impl PlayingItem {
    pub fn title(&self) -> String {
        match &self.by {
            Some(by) => format!("{} ({})", self.name, by),
            None => self.name.clone(),
        }
    }
}

/// "Currently playing" snapshot from the server. `item` is `None` when
/// nothing is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub item: Option<PlayingItem>,
    pub progress_ms: u64,
    pub is_playing: bool,
}

/// Body of a start/resume playback request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlayOffset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayOffset {
    pub position: usize,
}

impl PlayRequest {
    /// Play `context_uri` starting at the track at `position`.
    pub fn context_at(context_uri: impl Into<String>, position: usize) -> Self {
        Self {
            context_uri: Some(context_uri.into()),
            offset: Some(PlayOffset { position }),
            ..Self::default()
        }
    }

    /// Play a single item, optionally from `position_ms`.
    pub fn uri(uri: impl Into<String>, position_ms: Option<u64>) -> Self {
        Self {
            uris: vec![uri.into()],
            position_ms,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_request_serializes_only_set_fields() {
        let req = PlayRequest::context_at("spotify:album:1", 3);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"context_uri": "spotify:album:1", "offset": {"position": 3}})
        );

        let req = PlayRequest::uri("spotify:track:9", Some(1500));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"uris": ["spotify:track:9"], "position_ms": 1500})
        );
    }

    #[test]
    fn kind_index_round_trip() {
        for kind in CatalogKind::ALL {
            assert_eq!(CatalogKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(CatalogKind::from_index(3), None);
    }
}
