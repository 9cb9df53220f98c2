use std::fs;

use plinto::auth::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use plinto::auth::{FileTokenStore, StorageKind, TokenResponse, TokenStore};
use plinto::client::AuthState;
use plinto::config::ClientConfig;
use plinto::PlintoClient;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn local_config(dir: &TempDir) -> ClientConfig {
    ClientConfig::builder()
        .base_url("http://127.0.0.1:9")
        .storage(StorageKind::Local)
        .storage_dir(dir.path().to_path_buf())
        .build()
}

fn tokens(access: &str, refresh: &str) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        refresh_token: Some(refresh.to_string()),
        expires_in: 3600,
        token_type: "bearer".to_string(),
    }
}

#[test]
fn local_session_survives_a_new_client() {
    let dir = TempDir::new().unwrap();

    let first = PlintoClient::new(local_config(&dir)).unwrap();
    first.set_tokens(&tokens("access-1", "refresh-1"));
    drop(first);

    let second = PlintoClient::new(local_config(&dir)).unwrap();
    assert_eq!(second.access_token().as_deref(), Some("access-1"));
    assert_eq!(second.refresh_token().as_deref(), Some("refresh-1"));
    assert_eq!(second.auth_state(), AuthState::Authenticated);
}

#[test]
fn token_file_is_toml_with_both_keys() {
    let dir = TempDir::new().unwrap();
    let client = PlintoClient::new(local_config(&dir)).unwrap();
    client.set_tokens(&tokens("access-1", "refresh-1"));

    let store = FileTokenStore::new(dir.path().to_path_buf());
    let raw = fs::read_to_string(store.path()).unwrap();
    let parsed: toml::Value = toml::from_str(&raw).unwrap();
    assert_eq!(parsed["version"].as_integer(), Some(1));
    assert_eq!(parsed["entries"][ACCESS_TOKEN_KEY].as_str(), Some("access-1"));
    assert_eq!(parsed["entries"][REFRESH_TOKEN_KEY].as_str(), Some("refresh-1"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn clearing_twice_removes_the_token_file() {
    let dir = TempDir::new().unwrap();
    let client = PlintoClient::new(local_config(&dir)).unwrap();
    client.set_tokens(&tokens("access-1", "refresh-1"));
    let store = FileTokenStore::new(dir.path().to_path_buf());
    assert!(store.path().exists());

    client.clear_tokens();
    client.clear_tokens();

    assert!(!store.path().exists());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert!(client.access_token().is_none());
}

#[test]
fn memory_storage_writes_nothing_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut config = local_config(&dir);
    config.storage = StorageKind::Memory;

    let client = PlintoClient::new(config).unwrap();
    client.set_tokens(&tokens("access-1", "refresh-1"));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(client.is_authenticated());
}

#[test]
fn storage_kind_parses_case_insensitively() {
    assert_eq!("LOCAL".parse::<StorageKind>().unwrap(), StorageKind::Local);
    assert_eq!("Session".parse::<StorageKind>().unwrap(), StorageKind::Session);
    assert!("cookie".parse::<StorageKind>().is_err());
}
