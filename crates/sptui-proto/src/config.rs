use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;
use super::session::ensure_private_dir;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// OAuth endpoints and the local redirect listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_redirect_host")]
    pub redirect_host: String,
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
    #[serde(default = "default_redirect_path")]
    pub redirect_path: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// How long to wait for the browser redirect before giving up.
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    /// Launch the system browser on the authorize URL. The URL is shown in
    /// the terminal either way.
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the OAuth session is persisted.
    /// Defaults to `~/.config/sptui/spotify_token.json`.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            redirect_host: default_redirect_host(),
            redirect_port: default_redirect_port(),
            redirect_path: default_redirect_path(),
            scopes: default_scopes(),
            login_timeout_secs: default_login_timeout_secs(),
            open_browser: default_true(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            page_limit: default_page_limit(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

impl AuthConfig {
    /// The redirect URI registered with the provider, e.g.
    /// `http://localhost:21112/callback`.
    pub fn redirect_uri(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.redirect_host, self.redirect_port, self.redirect_path
        )
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

fn default_authorize_url() -> String {
    "https://accounts.spotify.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_redirect_host() -> String {
    "localhost".to_string()
}

fn default_redirect_port() -> u16 {
    21112
}

fn default_redirect_path() -> String {
    "/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    [
        "user-read-private",
        "user-modify-playback-state",
        "user-library-read",
        "playlist-read-collaborative",
        "playlist-read-private",
        "user-read-currently-playing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_login_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_page_limit() -> u32 {
    20
}

fn default_token_file() -> PathBuf {
    platform::token_file()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Write the config to `path`. The directory is shared with the token
    /// file, so it is created owner-only.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_private_dir(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
