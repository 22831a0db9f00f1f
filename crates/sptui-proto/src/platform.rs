use std::path::PathBuf;

/// Environment variable holding the OAuth client id.
pub const CLIENT_ID_ENV: &str = "SPOTIFY_ID";

const APP_DIR: &str = "sptui";

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/sptui/
    // (avoid macOS Application Support folder for consistency)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn data_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn token_file() -> PathBuf {
    config_dir().join("spotify_token.json")
}

pub fn log_file() -> PathBuf {
    data_dir().join("sptui.log")
}

/// Read the OAuth client id from the environment. Empty values count as unset.
pub fn client_id_from_env() -> Option<String> {
    std::env::var(CLIENT_ID_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
