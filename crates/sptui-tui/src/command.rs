//! Outgoing commands and the dispatcher that runs them.
//!
//! Every command except `Quit` runs in its own tokio task and reports back
//! with exactly one [`Message`] (login also reports the authorize URL first).
//! A closed message queue ends the task silently.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sptui_proto::api::{CatalogApi, SpotifyClient};
use sptui_proto::auth::Authenticator;
use sptui_proto::catalog::{CatalogKind, PlayRequest};
use sptui_proto::config::Config;
use sptui_proto::error::ApiError;
use sptui_proto::session::CredentialStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::message::{CatalogPage, Message};
use crate::ticker::Generation;

/// Shared handle to the authenticated API client.
#[derive(Clone)]
pub struct Client(Arc<dyn CatalogApi>);

impl Client {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self(api)
    }
}

impl std::ops::Deref for Client {
    type Target = dyn CatalogApi;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Client")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run every command; their messages arrive in completion order.
    Batch(Vec<Command>),
    Quit,
    Login,
    FetchPage { kind: CatalogKind, offset: u32 },
    FetchDetail { kind: CatalogKind, id: String },
    FetchNowPlaying { delay: Duration },
    Play(PlayRequest),
    Pause,
    Next,
    Previous,
    ProgressTick { generation: Generation, after: Duration },
    MarqueeTick { generation: Generation, after: Duration },
}

impl Command {
    /// A batch, or the command itself when there is only one.
    pub fn batch(mut commands: Vec<Command>) -> Command {
        if commands.len() == 1 {
            commands.remove(0)
        } else {
            Command::Batch(commands)
        }
    }
}

/// What the login command needs to build a client.
#[derive(Debug, Clone)]
pub struct LoginContext {
    pub config: Config,
    pub token_file: PathBuf,
}

impl LoginContext {
    pub fn new(config: Config) -> Self {
        let token_file = config.paths.token_file.clone();
        Self { config, token_file }
    }
}

pub struct Dispatcher {
    tx: mpsc::Sender<Message>,
    login: LoginContext,
}

impl Dispatcher {
    pub fn new(tx: mpsc::Sender<Message>, login: LoginContext) -> Self {
        Self { tx, login }
    }

    /// Start `command`. Returns true when the app should quit.
    pub fn run(&self, command: Command, client: Option<&Client>) -> bool {
        match command {
            Command::Quit => return true,
            Command::Batch(commands) => {
                let mut quit = false;
                for c in commands {
                    quit |= self.run(c, client);
                }
                return quit;
            }
            Command::Login => self.spawn_login(),
            Command::ProgressTick { generation, after } => {
                self.spawn_timer(after, Message::ProgressTick(generation))
            }
            Command::MarqueeTick { generation, after } => {
                self.spawn_timer(after, Message::MarqueeTick(generation))
            }
            api_command => match client {
                Some(client) => self.spawn_api(api_command, client.clone()),
                None => warn!("dropping {:?}: not authenticated", api_command),
            },
        }
        false
    }

    fn spawn_timer(&self, after: Duration, message: Message) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(message).await;
        });
    }

    fn spawn_login(&self) {
        let tx = self.tx.clone();
        let login = self.login.clone();
        tokio::spawn(async move {
            let message = match login_task(&tx, login).await {
                Ok(client) => {
                    info!("authenticated");
                    Message::Authenticated(client)
                }
                Err(e) => {
                    warn!("login failed: {}", e);
                    Message::AuthFailed(e.to_string())
                }
            };
            let _ = tx.send(message).await;
        });
    }

    fn spawn_api(&self, command: Command, client: Client) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            debug!("running {:?}", command);
            if let Some(message) = api_task(command, client).await {
                let _ = tx.send(message).await;
            }
        });
    }
}

async fn login_task(tx: &mpsc::Sender<Message>, login: LoginContext) -> anyhow::Result<Client> {
    let auth = Authenticator::from_env(login.config.auth.clone())?;
    let store = CredentialStore::new(&login.token_file);
    let url_tx = tx.clone();
    let session = auth
        .login(&store, move |url| {
            let _ = url_tx.try_send(Message::LoginUrl(url.to_string()));
        })
        .await?;
    let api = SpotifyClient::new(&login.config.api, session, auth, store);
    Ok(Client::new(Arc::new(api)))
}

async fn api_task(command: Command, client: Client) -> Option<Message> {
    let message = match command {
        Command::FetchPage { kind, offset } => match fetch_page(&client, kind, offset).await {
            Ok(page) => Message::Page(page),
            Err(e) => Message::PageFailed {
                kind,
                error: e.to_string(),
            },
        },
        Command::FetchDetail { kind, id } => match client.detail(kind, &id).await {
            Ok(detail) => Message::DetailLoaded(detail),
            Err(e) => Message::Failed(e.to_string()),
        },
        Command::FetchNowPlaying { delay } => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match client.currently_playing().await {
                Ok(snapshot) => Message::NowPlaying(snapshot),
                Err(e) => Message::Failed(e.to_string()),
            }
        }
        Command::Play(request) => playback_result(client.play(request).await),
        Command::Pause => playback_result(client.pause().await),
        Command::Next => playback_result(client.next().await),
        Command::Previous => playback_result(client.previous().await),
        other => {
            warn!("not an API command: {:?}", other);
            return None;
        }
    };
    Some(message)
}

async fn fetch_page(client: &Client, kind: CatalogKind, offset: u32) -> Result<CatalogPage, ApiError> {
    Ok(match kind {
        CatalogKind::Playlist => CatalogPage::Playlists(client.saved_playlists(offset).await?),
        CatalogKind::Album => CatalogPage::Albums(client.saved_albums(offset).await?),
        CatalogKind::Podcast => CatalogPage::Shows(client.saved_shows(offset).await?),
    })
}

fn playback_result(result: Result<(), ApiError>) -> Message {
    match result {
        Ok(()) => Message::PlaybackDone,
        Err(e) => Message::Failed(e.to_string()),
    }
}
