//! Installed-application flow: consent in the user's browser, redirect to a
//! loopback listener.

use tracing::info;
use url::Url;

use super::{AuthorizationCodeFlow, LoopbackReceiver, generate_state};
use crate::error::Result;
use crate::secrets::ClientSecrets;
use crate::token::Token;

/// Runs the complete consent round-trip for a desktop client.
#[derive(Debug, Clone)]
pub struct InstalledAppFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
}

impl InstalledAppFlow {
    /// Creates a flow requesting `scopes` for the client in `secrets`.
    #[must_use]
    pub const fn new(secrets: ClientSecrets, scopes: Vec<String>) -> Self {
        Self { secrets, scopes }
    }

    /// Returns the client secrets.
    #[must_use]
    pub const fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    /// Returns the requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Starts a loopback listener, hands the consent URL to `on_url` (which
    /// typically opens a browser), waits for the redirect and exchanges the
    /// code.
    ///
    /// Blocks until the user completes or declines consent; there is no
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound, the user declines,
    /// the redirect is forged, or the code exchange fails.
    pub async fn run_local_server<F>(&self, on_url: F) -> Result<Token>
    where
        F: FnOnce(&Url),
    {
        let receiver = LoopbackReceiver::bind().await?;
        let redirect_uri = receiver.redirect_uri();

        let client = self.secrets.client()?.with_redirect_uri(&redirect_uri);
        let flow = AuthorizationCodeFlow::new(client).with_pkce();
        let state = generate_state();
        let url = flow.authorization_url(Some(&self.scopes), Some(&state))?;

        on_url(&url);
        let code = receiver.wait_for_code(&state).await?;
        info!("authorization code received, exchanging for tokens");

        flow.exchange_code(&code, Some(&redirect_uri)).await
    }
}
