//! Authorization Code Flow.

use super::{OAuthClient, PkceChallenge};
use crate::error::Result;
use crate::token::Token;
use url::Url;

/// Authorization Code Flow for `OAuth2`.
///
/// The user visits [`authorization_url`](Self::authorization_url) in a
/// browser, the provider redirects back with a code, and the code is
/// traded for tokens with [`exchange_code`](Self::exchange_code).
#[derive(Debug)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
    pkce: Option<PkceChallenge>,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client, pkce: None }
    }

    /// Enables PKCE.
    #[must_use]
    pub fn with_pkce(mut self) -> Self {
        self.pkce = Some(PkceChallenge::generate());
        self
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Builds the consent URL.
    ///
    /// `scopes` falls back to the provider defaults when `None`. Google
    /// endpoints additionally get `access_type=offline` and
    /// `prompt=consent` so that a refresh token is always issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self, scopes: Option<&[String]>, state: Option<&str>) -> Result<Url> {
        let mut url = self.client.provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client.client_id);

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope = scopes.map_or_else(
                || self.client.provider.default_scopes.join(" "),
                |s| s.join(" "),
            );
            if !scope.is_empty() {
                pairs.append_pair("scope", &scope);
            }

            if let Some(state) = state {
                pairs.append_pair("state", state);
            }

            if let Some(pkce) = &self.pkce {
                pairs
                    .append_pair("code_challenge", pkce.challenge())
                    .append_pair("code_challenge_method", pkce.method());
            }

            if self.client.provider.is_google() {
                pairs
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
        }

        Ok(url)
    }

    /// Exchanges the authorization code for tokens, sending the PKCE
    /// verifier when enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<Token> {
        self.client
            .exchange_code(code, redirect_uri, self.pkce_verifier())
            .await
    }

    /// Returns the PKCE verifier if PKCE is enabled.
    #[must_use]
    pub fn pkce_verifier(&self) -> Option<&str> {
        self.pkce.as_ref().map(PkceChallenge::verifier)
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
    use crate::provider::Provider;
    use std::collections::HashMap;

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_authorization_url_defaults() {
        let client = OAuthClient::new("test_client", Provider::google().unwrap())
            .with_redirect_uri("http://127.0.0.1:8080/");
        let flow = AuthorizationCodeFlow::new(client);
        let url = flow.authorization_url(None, Some("xyz")).unwrap();
        let q = query(&url);

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(q["client_id"], "test_client");
        assert_eq!(q["response_type"], "code");
        assert_eq!(q["redirect_uri"], "http://127.0.0.1:8080/");
        assert_eq!(q["scope"], crate::scopes::GMAIL_INSERT);
        assert_eq!(q["state"], "xyz");
        assert_eq!(q["access_type"], "offline");
        assert_eq!(q["prompt"], "consent");
        assert!(!q.contains_key("code_challenge"));
    }

    #[test]
    fn test_authorization_url_with_pkce() {
        let client = OAuthClient::new("test_client", Provider::google().unwrap());
        let flow = AuthorizationCodeFlow::new(client).with_pkce();
        let q = query(&flow.authorization_url(None, None).unwrap());

        let verifier = flow.pkce_verifier().unwrap();
        assert_eq!(
            q["code_challenge"],
            PkceChallenge::from_verifier(verifier).challenge()
        );
        assert_eq!(q["code_challenge_method"], "S256");
        assert!(!q.contains_key("state"));
    }

    #[test]
    fn test_explicit_scopes_joined_with_space() {
        let client = OAuthClient::new("test_client", Provider::google().unwrap());
        let flow = AuthorizationCodeFlow::new(client);
        let scopes = vec!["a".to_string(), "b".to_string()];
        let url = flow.authorization_url(Some(&scopes), None).unwrap();

        assert!(url.as_str().contains("scope=a+b"));
    }

    #[test]
    fn test_non_google_provider_has_no_offline_params() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap();
        let flow = AuthorizationCodeFlow::new(OAuthClient::new("c", provider));
        let q = query(&flow.authorization_url(None, None).unwrap());

        assert!(!q.contains_key("access_type"));
        assert!(!q.contains_key("scope"));
    }
}
