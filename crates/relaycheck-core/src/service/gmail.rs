//! Gmail API service handle.
//!
//! Holds an authenticated HTTP client and the import endpoint of one
//! mailbox. Building it sends no request: with only the `gmail.insert`
//! scope there is no read-only call that could verify the grant.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use crate::error::ProbeError;

/// Gmail API root.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// An authenticated handle on one mailbox's Gmail API.
#[derive(Debug, Clone)]
pub struct GmailService {
    http: reqwest::Client,
    import_url: Url,
    target: String,
}

impl GmailService {
    /// Builds the handle for `target` using `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ServiceConstruction`] if the token is empty or
    /// not a valid header value, or the HTTP client cannot be built.
    pub fn new(access_token: &str, target: &str) -> Result<Self, ProbeError> {
        Self::with_base(GMAIL_API_BASE, access_token, target)
    }

    /// Like [`new`](Self::new) with a different API root.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus an unusable `base`.
    pub fn with_base(base: &str, access_token: &str, target: &str) -> Result<Self, ProbeError> {
        if access_token.trim().is_empty() {
            return Err(ProbeError::ServiceConstruction("credential has no access token".into()));
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| ProbeError::ServiceConstruction(format!("malformed access token: {e}")))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("relaycheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::ServiceConstruction(format!("HTTP client: {e}")))?;

        let mut import_url =
            Url::parse(base).map_err(|e| ProbeError::ServiceConstruction(format!("invalid API URL: {e}")))?;
        import_url
            .path_segments_mut()
            .map_err(|()| ProbeError::ServiceConstruction(format!("invalid API URL: {base}")))?
            .pop_if_empty()
            .extend(["users", target, "messages", "import"]);

        Ok(Self {
            http,
            import_url,
            target: target.to_string(),
        })
    }

    /// Mailbox this handle writes into.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `users.messages.import` endpoint for the target mailbox.
    #[must_use]
    pub const fn import_url(&self) -> &Url {
        &self.import_url
    }

    /// The authenticated HTTP client.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
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

    #[test]
    fn test_import_url() {
        let service = GmailService::new("ya29.token", "alice@gmail.com").unwrap();
        assert_eq!(
            service.import_url().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/alice@gmail.com/messages/import"
        );
        assert_eq!(service.target(), "alice@gmail.com");
    }

    #[test]
    fn test_target_is_a_single_segment() {
        let service = GmailService::new("ya29.token", "a/b").unwrap();
        assert!(service.import_url().path().contains("/users/a%2Fb/"));
    }

    #[test]
    fn test_empty_token() {
        let err = GmailService::new("  ", "alice@gmail.com").unwrap_err();
        assert!(matches!(err, ProbeError::ServiceConstruction(_)));
    }

    #[test]
    fn test_token_with_newline() {
        let err = GmailService::new("ya29\nInjected: 1", "alice@gmail.com").unwrap_err();
        assert!(matches!(err, ProbeError::ServiceConstruction(_)));
    }

    #[test]
    fn test_bad_base() {
        let err = GmailService::with_base("not a url", "t", "alice@gmail.com").unwrap_err();
        assert!(matches!(err, ProbeError::ServiceConstruction(_)));
    }
}
