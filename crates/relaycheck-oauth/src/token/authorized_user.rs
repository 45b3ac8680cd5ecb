//! The "authorized user" cache layout shared with Google's client libraries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{EXPIRY_BUFFER_SECS, Token};
use crate::error::Result;
use crate::flow::OAuthClient;
use crate::provider::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, Provider};
use crate::secrets::ClientSecrets;

/// A cached delegated-access grant, as stored in a token file.
///
/// ```json
/// {"token": "ya29...", "refresh_token": "1//...",
///  "token_uri": "https://oauth2.googleapis.com/token",
///  "client_id": "...", "client_secret": "...",
///  "scopes": ["https://www.googleapis.com/auth/gmail.insert"],
///  "expiry": "2026-01-01T00:00:00Z"}
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Current access token.
    #[serde(default)]
    pub token: Option<String>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refresh.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Client ID the grant was issued to.
    #[serde(default)]
    pub client_id: String,
    /// Client secret, if the client has one.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .field("has_token", &self.token.is_some())
            .field("has_refresh_token", &self.has_refresh_token())
            .finish_non_exhaustive()
    }
}

impl AuthorizedUser {
    /// Builds a cache entry from a freshly issued token.
    #[must_use]
    pub fn from_token(token: &Token, secrets: &ClientSecrets, scopes: &[String]) -> Self {
        Self {
            token: Some(token.access_token.clone()),
            refresh_token: token.refresh_token.clone(),
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: token.expires_at,
        }
    }

    /// Parses a token file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to the token file layout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the access token, if one is present and non-empty.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Returns true if a non-empty refresh token is present.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Returns true if the access token is past (or within a minute of) its expiry.
    ///
    /// A grant without a recorded expiry never expires locally.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|exp| Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS) >= exp)
    }

    /// Returns true if the entry names a client and a token endpoint, and
    /// holds at least one usable token.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.client_id.trim().is_empty()
            && !self.token_uri.trim().is_empty()
            && (self.access_token().is_some() || self.has_refresh_token())
    }

    /// Returns true if the access token can be used as-is.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_well_formed() && self.access_token().is_some() && !self.is_expired()
    }

    /// Converts to a [`Token`] suitable for refreshing.
    #[must_use]
    pub fn to_token(&self) -> Token {
        Token {
            access_token: self.token.clone().unwrap_or_default(),
            token_type: "Bearer".to_string(),
            expires_at: self.expiry,
            refresh_token: self.refresh_token.clone(),
            scope: (!self.scopes.is_empty()).then(|| self.scopes.join(" ")),
        }
    }

    /// Returns a copy carrying a newly issued token.
    ///
    /// The existing refresh token is kept when the new token has none.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token.access_token);
        self.expiry = token.expires_at;
        if token.refresh_token.is_some() {
            self.refresh_token = token.refresh_token;
        }
        self
    }

    /// Builds an `OAuth2` client able to refresh this grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is not a valid https URL.
    pub fn client(&self) -> Result<OAuthClient> {
        let provider = Provider::new("Google", GOOGLE_AUTH_URL, &self.token_uri)?
            .with_default_scopes(self.scopes.clone());
        provider.validate()?;

        let mut client = OAuthClient::new(&self.client_id, provider);
        if let Some(secret) = &self.client_secret {
            client = client.with_client_secret(secret);
        }
        Ok(client)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn cached(expiry: Option<DateTime<Utc>>) -> AuthorizedUser {
        AuthorizedUser {
            token: Some("ya29.access".into()),
            refresh_token: Some("1//refresh".into()),
            token_uri: GOOGLE_TOKEN_URL.into(),
            client_id: "123.apps.googleusercontent.com".into(),
            client_secret: Some("shh".into()),
            scopes: vec![crate::scopes::GMAIL_INSERT.into()],
            expiry,
        }
    }

    #[test]
    fn test_parse_google_layout() {
        let json = r#"{"token": "ya29.a0", "refresh_token": "1//0g", "token_uri": "https://oauth2.googleapis.com/token", "client_id": "id", "client_secret": "secret", "scopes": ["https://www.googleapis.com/auth/gmail.insert"], "universe_domain": "googleapis.com", "account": "", "expiry": "2030-05-01T12:00:00.123456Z"}"#;
        let user = AuthorizedUser::from_json(json).unwrap();
        assert_eq!(user.access_token(), Some("ya29.a0"));
        assert!(user.has_refresh_token());
        assert!(user.is_well_formed());
        assert!(user.is_valid());
    }

    #[test]
    fn test_expired_entry_is_not_valid() {
        let user = cached(Some(Utc::now() - Duration::hours(1)));
        assert!(user.is_expired());
        assert!(!user.is_valid());
        assert!(user.is_well_formed());
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let user = cached(None);
        assert!(!user.is_expired());
        assert!(user.is_valid());
    }

    #[test]
    fn test_missing_client_id_is_malformed() {
        let mut user = cached(None);
        user.client_id = String::new();
        assert!(!user.is_well_formed());
        assert!(!user.is_valid());
    }

    #[test]
    fn test_refresh_only_entry() {
        let mut user = cached(None);
        user.token = None;
        assert!(user.is_well_formed());
        assert!(!user.is_valid());
    }

    #[test]
    fn test_with_token_keeps_refresh_token() {
        let user = cached(Some(Utc::now() - Duration::hours(1)));
        let fresh = Token::new("ya29.new", "Bearer").with_expires_at(Utc::now() + Duration::hours(1));

        let updated = user.with_token(fresh);
        assert_eq!(updated.access_token(), Some("ya29.new"));
        assert_eq!(updated.refresh_token.as_deref(), Some("1//refresh"));
        assert!(updated.is_valid());
    }

    #[test]
    fn test_json_round_trip_keeps_expiry() {
        let user = cached(Some(Utc::now() + Duration::hours(1)));
        let back = AuthorizedUser::from_json(&user.to_json().unwrap()).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_client_uses_cached_endpoint() {
        let client = cached(None).client().unwrap();
        assert_eq!(client.client_id, "123.apps.googleusercontent.com");
        assert_eq!(client.client_secret.as_deref(), Some("shh"));
        assert_eq!(client.provider.token_url.as_str(), GOOGLE_TOKEN_URL);
    }

    #[test]
    fn test_client_rejects_plain_http_endpoint() {
        let mut user = cached(None);
        user.token_uri = "http://example.com/token".into();
        assert!(user.client().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", cached(None));
        assert!(!debug.contains("ya29.access"));
        assert!(!debug.contains("shh"));
    }
}
