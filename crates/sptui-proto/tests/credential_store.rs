//! Token file round-trips and expiry classification.

use chrono::{Duration, Utc};
use sptui_proto::session::{CredentialStore, Session, StoredSession};
use tempfile::TempDir;

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("spotify_token.json"));
    assert_eq!(store.load().unwrap(), StoredSession::NotFound);
}

#[test]
fn saved_session_loads_back_as_valid() {
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("nested/sptui/spotify_token.json"));
    let session = Session::new("access", "refresh", Utc::now() + Duration::hours(1));

    store.save(&session).unwrap();

    match store.load().unwrap() {
        StoredSession::Valid(loaded) => {
            assert_eq!(loaded.access_token, "access");
            assert_eq!(loaded.refresh_token, "refresh");
            assert_eq!(loaded.expiry.timestamp(), session.expiry.timestamp());
        }
        other => panic!("expected valid session, got {:?}", other),
    }
}

#[test]
fn past_expiry_loads_as_expired() {
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("spotify_token.json"));
    store
        .save(&Session::new("old", "refresh", Utc::now() - Duration::minutes(5)))
        .unwrap();

    match store.load().unwrap() {
        StoredSession::Expired(s) => assert_eq!(s.refresh_token, "refresh"),
        other => panic!("expected expired session, got {:?}", other),
    }
}

#[test]
fn save_replaces_previous_session_and_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spotify_token.json");
    let store = CredentialStore::new(&path);
    store
        .save(&Session::new("first", "r1", Utc::now() + Duration::hours(1)))
        .unwrap();
    store
        .save(&Session::new("second", "r2", Utc::now() + Duration::hours(1)))
        .unwrap();

    let StoredSession::Valid(s) = store.load().unwrap() else {
        panic!("expected valid session");
    };
    assert_eq!(s.access_token, "second");

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["spotify_token.json".to_string()]);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spotify_token.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(CredentialStore::new(&path).load().is_err());
}

#[test]
fn clear_removes_file_and_tolerates_absence() {
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("spotify_token.json"));
    store
        .save(&Session::new("a", "r", Utc::now() + Duration::hours(1)))
        .unwrap();
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), StoredSession::NotFound);
    store.clear().unwrap();
}

#[cfg(unix)]
#[test]
fn token_file_and_directory_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("sptui");
    let path = parent.join("spotify_token.json");
    CredentialStore::new(&path)
        .save(&Session::new("a", "r", Utc::now() + Duration::hours(1)))
        .unwrap();

    let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    let dir_mode = std::fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, 0o600);
    assert_eq!(dir_mode, 0o700);
}

#[cfg(unix)]
#[test]
fn token_directory_shared_with_config_ends_up_private() {
    use sptui_proto::config::Config;
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("sptui");
    std::fs::create_dir(&parent).unwrap();
    std::fs::set_permissions(&parent, std::fs::Permissions::from_mode(0o755)).unwrap();

    Config::default().save_to(&parent.join("config.toml")).unwrap();
    let mode = std::fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o700, "config save tightens the directory");

    std::fs::set_permissions(&parent, std::fs::Permissions::from_mode(0o755)).unwrap();
    CredentialStore::new(parent.join("spotify_token.json"))
        .save(&Session::new("a", "r", Utc::now() + Duration::hours(1)))
        .unwrap();
    let mode = std::fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o700, "token save tightens an existing directory");
}
