//! Token cache behaviour through the public API.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use relaycheck_oauth::scopes::GMAIL_INSERT;
use relaycheck_oauth::{AuthorizedUser, ClientSecrets, FileTokenStore, Token};

const SECRETS: &str = r#"{"installed":{"client_id":"42.apps.googleusercontent.com","client_secret":"shh","redirect_uris":["http://localhost"]}}"#;

#[test]
fn fresh_grant_survives_a_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens").join("account1.json");

    let secrets = ClientSecrets::from_json(SECRETS).unwrap();
    let scopes = vec![GMAIL_INSERT.to_string()];
    let token = Token::new("ya29.fresh", "Bearer")
        .with_refresh_token("1//keep")
        .with_expires_at(Utc::now() + Duration::hours(1));

    let user = AuthorizedUser::from_token(&token, &secrets, &scopes);
    FileTokenStore.save(&path, &user).unwrap();

    let loaded = FileTokenStore.load(&path).unwrap().unwrap();
    assert!(loaded.is_valid());
    assert_eq!(loaded.client_id, "42.apps.googleusercontent.com");
    assert_eq!(loaded.scopes, scopes);
    assert_eq!(loaded.to_token().refresh_token().unwrap(), "1//keep");
}

#[test]
fn expired_grant_is_refreshable_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("account2.json");

    let secrets = ClientSecrets::from_json(SECRETS).unwrap();
    let token = Token::new("ya29.old", "Bearer")
        .with_refresh_token("1//keep")
        .with_expires_at(Utc::now() - Duration::minutes(5));
    let user = AuthorizedUser::from_token(&token, &secrets, &[GMAIL_INSERT.to_string()]);
    FileTokenStore.save(&path, &user).unwrap();

    let loaded = FileTokenStore.load(&path).unwrap().unwrap();
    assert!(loaded.is_expired());
    assert!(!loaded.is_valid());
    assert!(loaded.has_refresh_token());
    assert!(loaded.is_well_formed());
}

#[test]
fn file_written_by_google_libraries_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    std::fs::write(
        &path,
        r#"{"token": "ya29.py", "refresh_token": "1//py", "token_uri": "https://oauth2.googleapis.com/token", "client_id": "42", "client_secret": "shh", "scopes": ["https://www.googleapis.com/auth/gmail.insert"], "expiry": "2099-01-01T00:00:00.000000Z"}"#,
    )
    .unwrap();

    let loaded = FileTokenStore.load(&path).unwrap().unwrap();
    assert!(loaded.is_valid());
    assert_eq!(loaded.access_token(), Some("ya29.py"));
}
