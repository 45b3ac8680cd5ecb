//! Delegated-access token lifecycle.
//!
//! ```text
//!             load
//!               │
//!   ┌───────────┼──────────────┬─────────────────┐
//!   ▼           ▼              ▼                 ▼
//! NoCredential CachedInvalid CachedExpired-    CachedValid
//!   │           │            Refreshable           │
//!   │           │              │ refresh           │
//!   │◄──────────┼───── failed ─┤                   │
//!   ▼           ▼              │ ok                │
//! interactive authorization    │                   │
//!   │ ok          │ failed     │                   │
//!   ▼             ▼            ▼                   ▼
//! persist ──►  Failed      persist ─────────► Authorized
//!   │ failed                   │ failed
//!   └──────────► PersistFailed ◄┘
//! ```

mod google;
mod lifecycle;

pub use google::GmailApi;
pub use lifecycle::{TokenLifecycle, TokenState};

use std::path::Path;

use crate::error::ProbeError;
use crate::output::OutputSink;

/// A cached or freshly issued grant, in token-file layout.
pub type Credential = relaycheck_oauth::AuthorizedUser;

/// Persists credentials.
pub trait TokenStore {
    /// Loads the credential at `path`; `Ok(None)` if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<Option<Credential>, ProbeError>;

    /// Writes `credential` to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, path: &Path, credential: &Credential) -> Result<(), ProbeError>;
}

/// Talks to the authorization server and builds API handles.
#[allow(async_fn_in_trait)]
pub trait MailApi {
    /// Service handle type.
    type Service;

    /// Trades the refresh token for a new access token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, ProbeError>;

    /// Runs browser consent using the client secrets in `credentials_file`.
    ///
    /// Blocks until the user responds.
    async fn interactive_authorize(
        &self,
        credentials_file: &Path,
        scopes: &[String],
        sink: &dyn OutputSink,
    ) -> Result<Credential, ProbeError>;

    /// Builds a service handle for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ServiceConstruction`] on failure.
    fn build_service(&self, credential: &Credential, target: &str)
    -> Result<Self::Service, ProbeError>;
}

impl TokenStore for relaycheck_oauth::FileTokenStore {
    fn load(&self, path: &Path) -> Result<Option<Credential>, ProbeError> {
        Self::load(*self, path).map_err(|e| ProbeError::Credential(e.to_string()))
    }

    fn save(&self, path: &Path, credential: &Credential) -> Result<(), ProbeError> {
        Self::save(*self, path, credential).map_err(|e| ProbeError::Credential(e.to_string()))
    }
}
