//! Spotify Web API client.
//!
//! [`CatalogApi`] is the seam the UI talks to; [`SpotifyClient`] is the
//! HTTP implementation. Wire structs mirror the JSON the Web API returns and
//! are converted into the catalog model before leaving this module.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::catalog::{
    AlbumSummary, CatalogKind, Detail, NowPlaying, Page, PlayRequest, PlayingItem,
    PlaylistSummary, ShowSummary, TrackEntry,
};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::{CredentialStore, Session};

/// Refresh the session this long before it actually expires.
const REFRESH_MARGIN_SECS: i64 = 30;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn saved_playlists(&self, offset: u32) -> Result<Page<PlaylistSummary>, ApiError>;
    async fn saved_albums(&self, offset: u32) -> Result<Page<AlbumSummary>, ApiError>;
    async fn saved_shows(&self, offset: u32) -> Result<Page<ShowSummary>, ApiError>;

    async fn playlist(&self, id: &str) -> Result<Detail, ApiError>;
    async fn album(&self, id: &str) -> Result<Detail, ApiError>;
    async fn show(&self, id: &str) -> Result<Detail, ApiError>;

    /// `None` when the player has nothing loaded.
    async fn currently_playing(&self) -> Result<Option<NowPlaying>, ApiError>;

    async fn play(&self, request: PlayRequest) -> Result<(), ApiError>;
    async fn pause(&self) -> Result<(), ApiError>;
    async fn next(&self) -> Result<(), ApiError>;
    async fn previous(&self) -> Result<(), ApiError>;

    async fn detail(&self, kind: CatalogKind, id: &str) -> Result<Detail, ApiError> {
        match kind {
            CatalogKind::Playlist => self.playlist(id).await,
            CatalogKind::Album => self.album(id).await,
            CatalogKind::Podcast => self.show(id).await,
        }
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WirePage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    offset: u32,
    #[serde(default)]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct WireName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireOwner {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePlaylist {
    id: String,
    name: String,
    uri: String,
    #[serde(default)]
    owner: Option<WireOwner>,
}

#[derive(Debug, Deserialize)]
struct WireSavedAlbum {
    #[serde(default)]
    added_at: Option<String>,
    album: WireAlbum,
}

#[derive(Debug, Deserialize)]
struct WireAlbum {
    id: String,
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<WireName>,
    #[serde(default)]
    tracks: Option<WirePage<WireTrack>>,
}

#[derive(Debug, Deserialize)]
struct WireSavedShow {
    show: WireShow,
}

#[derive(Debug, Deserialize)]
struct WireShow {
    id: String,
    name: String,
    uri: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    episodes: Option<WirePage<Option<WireTrack>>>,
}

#[derive(Debug, Deserialize)]
struct WireFullPlaylist {
    id: String,
    name: String,
    uri: String,
    tracks: WirePage<WirePlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct WirePlaylistItem {
    #[serde(default)]
    track: Option<WireTrack>,
}

#[derive(Debug, Deserialize)]
struct WireTrack {
    name: String,
    uri: String,
}

#[derive(Debug, Deserialize)]
struct WireCurrentlyPlaying {
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    item: Option<WirePlayingItem>,
}

/// Track or episode; tracks carry `artists`, episodes carry `show`.
#[derive(Debug, Deserialize)]
struct WirePlayingItem {
    name: String,
    uri: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<WireName>,
    #[serde(default)]
    show: Option<WireName>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

impl From<WireTrack> for TrackEntry {
    fn from(t: WireTrack) -> Self {
        TrackEntry {
            name: t.name,
            uri: t.uri,
        }
    }
}

impl From<WirePlaylist> for PlaylistSummary {
    fn from(p: WirePlaylist) -> Self {
        PlaylistSummary {
            id: p.id,
            name: p.name,
            uri: p.uri,
            owner: p.owner.and_then(|o| o.display_name),
        }
    }
}

impl From<WireSavedAlbum> for AlbumSummary {
    fn from(saved: WireSavedAlbum) -> Self {
        let a = saved.album;
        AlbumSummary {
            id: a.id,
            name: a.name,
            uri: a.uri,
            artists: a.artists.into_iter().map(|n| n.name).collect(),
            added_at: saved.added_at,
        }
    }
}

impl From<WireSavedShow> for ShowSummary {
    fn from(saved: WireSavedShow) -> Self {
        let s = saved.show;
        ShowSummary {
            id: s.id,
            name: s.name,
            uri: s.uri,
            publisher: s.publisher,
        }
    }
}

impl From<WireFullPlaylist> for Detail {
    fn from(p: WireFullPlaylist) -> Self {
        Detail {
            kind: CatalogKind::Playlist,
            id: p.id,
            uri: p.uri,
            name: p.name,
            artist: None,
            // Removed/unavailable items come back as `"track": null`. They keep
            // their row so the row index stays the playlist position.
            tracks: p
                .tracks
                .items
                .into_iter()
                .map(|i| i.track.map(TrackEntry::from).unwrap_or_else(TrackEntry::unavailable))
                .collect(),
        }
    }
}

impl From<WireAlbum> for Detail {
    fn from(a: WireAlbum) -> Self {
        Detail {
            kind: CatalogKind::Album,
            id: a.id,
            uri: a.uri,
            name: a.name,
            artist: a.artists.into_iter().next().map(|n| n.name),
            tracks: a
                .tracks
                .map(|page| page.items.into_iter().map(TrackEntry::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<WireShow> for Detail {
    fn from(s: WireShow) -> Self {
        Detail {
            kind: CatalogKind::Podcast,
            id: s.id,
            uri: s.uri,
            name: s.name,
            artist: None,
            tracks: s
                .episodes
                .map(|page| page.items.into_iter().flatten().map(TrackEntry::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<WireCurrentlyPlaying> for NowPlaying {
    fn from(c: WireCurrentlyPlaying) -> Self {
        let item = c.item.map(|i| {
            let by = match i.artists.into_iter().next() {
                Some(artist) => Some(artist.name),
                None => i.show.map(|s| s.name),
            };
            PlayingItem {
                name: i.name,
                uri: i.uri,
                by,
                duration_ms: i.duration_ms,
            }
        });
        NowPlaying {
            item,
            progress_ms: c.progress_ms.unwrap_or(0),
            is_playing: c.is_playing,
        }
    }
}

fn into_page<W, T: From<W>>(wire: WirePage<W>) -> Page<T> {
    Page::new(
        wire.items.into_iter().map(T::from).collect(),
        wire.offset,
        wire.total,
    )
}

// ── HTTP client ───────────────────────────────────────────────────────────────

pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    page_limit: u32,
    session: Mutex<Session>,
    auth: Authenticator,
    store: CredentialStore,
}

impl SpotifyClient {
    pub fn new(
        config: &ApiConfig,
        session: Session,
        auth: Authenticator,
        store: CredentialStore,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            session: Mutex::new(session),
            auth,
            store,
        }
    }

    /// Current access token, refreshing and persisting the session first if
    /// it is about to expire.
    async fn access_token(&self) -> Result<String, ApiError> {
        let mut session = self.session.lock().await;
        if session.expires_within(chrono::Duration::seconds(REFRESH_MARGIN_SECS)) {
            let fresh = self.auth.refresh(&session).await?;
            self.store.save(&fresh).map_err(crate::error::AuthError::from)?;
            info!("session refreshed, expires {}", fresh.expiry);
            *session = fresh;
        }
        Ok(session.access_token.clone())
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let resp = self.request(Method::GET, path).await?.query(query).send().await?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn page_query<W, T>(&self, path: &str, offset: u32) -> Result<Page<T>, ApiError>
    where
        W: DeserializeOwned,
        T: From<W>,
    {
        let query = [
            ("limit", self.page_limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let wire: WirePage<W> = self.get_json(path, &query).await?;
        Ok(into_page(wire))
    }

    async fn player_command(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let resp = self
            .request(method, path)
            .await?
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// Map non-success statuses to [`ApiError::Status`], using the Web API's
/// error message when the body has one.
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<WireErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn saved_playlists(&self, offset: u32) -> Result<Page<PlaylistSummary>, ApiError> {
        self.page_query::<WirePlaylist, _>("/me/playlists", offset).await
    }

    async fn saved_albums(&self, offset: u32) -> Result<Page<AlbumSummary>, ApiError> {
        self.page_query::<WireSavedAlbum, _>("/me/albums", offset).await
    }

    async fn saved_shows(&self, offset: u32) -> Result<Page<ShowSummary>, ApiError> {
        self.page_query::<WireSavedShow, _>("/me/shows", offset).await
    }

    async fn playlist(&self, id: &str) -> Result<Detail, ApiError> {
        let wire: WireFullPlaylist = self.get_json(&format!("/playlists/{}", id), &[]).await?;
        Ok(wire.into())
    }

    async fn album(&self, id: &str) -> Result<Detail, ApiError> {
        let wire: WireAlbum = self.get_json(&format!("/albums/{}", id), &[]).await?;
        Ok(wire.into())
    }

    async fn show(&self, id: &str) -> Result<Detail, ApiError> {
        let wire: WireShow = self.get_json(&format!("/shows/{}", id), &[]).await?;
        Ok(wire.into())
    }

    async fn currently_playing(&self) -> Result<Option<NowPlaying>, ApiError> {
        let resp = self
            .request(Method::GET, "/me/player/currently-playing")
            .await?
            .query(&[("additional_types", "track,episode")])
            .send()
            .await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        let wire: WireCurrentlyPlaying = serde_json::from_slice(&body)?;
        Ok(Some(wire.into()))
    }

    async fn play(&self, request: PlayRequest) -> Result<(), ApiError> {
        let resp = self
            .request(Method::PUT, "/me/player/play")
            .await?
            .json(&request)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn pause(&self) -> Result<(), ApiError> {
        self.player_command(Method::PUT, "/me/player/pause").await
    }

    async fn next(&self) -> Result<(), ApiError> {
        self.player_command(Method::POST, "/me/player/next").await
    }

    async fn previous(&self) -> Result<(), ApiError> {
        self.player_command(Method::POST, "/me/player/previous").await
    }
}
