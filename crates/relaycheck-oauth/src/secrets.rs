//! Client secrets downloaded from the Google Cloud console.
//!
//! The console hands out a JSON document with a single top-level key,
//! `installed` for desktop clients or `web` for web clients:
//!
//! ```json
//! {"installed": {"client_id": "...", "client_secret": "...",
//!   "auth_uri": "https://accounts.google.com/o/oauth2/auth",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "redirect_uris": ["http://localhost"]}}
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::flow::OAuthClient;
use crate::provider::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, Provider};

/// Long-lived application credentials used to start authorization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    /// Client ID.
    pub client_id: String,
    /// Client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorization endpoint.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parses a client secrets document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds neither an
    /// `installed` nor a `web` section.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)?;
        let secrets = file.installed.or(file.web).ok_or_else(|| {
            Error::InvalidClientSecrets("expected an \"installed\" or \"web\" section".into())
        })?;

        if secrets.client_id.trim().is_empty() {
            return Err(Error::InvalidClientSecrets("client_id is empty".into()));
        }
        Ok(secrets)
    }

    /// Reads and parses a client secrets file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Returns the provider described by these secrets.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs are invalid.
    pub fn provider(&self) -> Result<Provider> {
        let provider = Provider::new("Google", &self.auth_uri, &self.token_uri)?;
        provider.validate()?;
        Ok(provider)
    }

    /// Builds an `OAuth2` client for these secrets.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs are invalid.
    pub fn client(&self) -> Result<OAuthClient> {
        let mut client = OAuthClient::new(&self.client_id, self.provider()?);
        if let Some(secret) = &self.client_secret {
            client = client.with_client_secret(secret);
        }
        Ok(client)
    }
}
