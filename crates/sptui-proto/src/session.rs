//! OAuth session record and its on-disk credential store.
//!
//! The token file is written with write-temp-then-rename so that a crash
//! mid-write leaves the previously valid file untouched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;

/// Access/refresh token pair. Replaced wholesale on refresh, never edited.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expiry: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expiry,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now()
    }

    /// True if the session expires within `margin` from now (or already has).
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expiry <= Utc::now() + margin
    }
}

// Tokens never end up in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// Outcome of reading the token file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSession {
    Valid(Session),
    /// The file exists but its expiry is in the past; refresh it.
    Expired(Session),
    NotFound,
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StoredSession, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no token file at {}", self.path.display());
                return Ok(StoredSession::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let session: Session = serde_json::from_str(&content)?;
        if session.is_expired() {
            info!("stored session expired at {}", session.expiry);
            Ok(StoredSession::Expired(session))
        } else {
            Ok(StoredSession::Valid(session))
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_private_dir(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.temp_path();
        {
            let mut file = open_private_file(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!("session saved to {}", self.path.display());
        Ok(())
    }

    /// Remove the token file. Missing files are not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "token".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

/// Create `dir` (and missing ancestors) owner-only. An existing `dir`
/// loses its group and other permission bits.
#[cfg(unix)]
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    let mode = fs::metadata(dir)?.permissions().mode();
    if mode & 0o077 != 0 {
        debug!("tightening {} from {:o} to 700", dir.display(), mode & 0o777);
        fs::set_permissions(dir, fs::Permissions::from_mode(mode & 0o700))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private_file(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_tokens() {
        let s = Session::new("secret-access", "secret-refresh", Utc::now());
        let printed = format!("{:?}", s);
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
    }

    #[test]
    fn expires_within_margin() {
        let s = Session::new("a", "r", Utc::now() + Duration::seconds(10));
        assert!(!s.is_expired());
        assert!(s.expires_within(Duration::seconds(30)));
        assert!(!s.expires_within(Duration::seconds(1)));
    }
}
