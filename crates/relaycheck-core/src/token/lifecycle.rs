//! The token state machine.

use std::fmt;
use std::path::Path;

use relaycheck_oauth::scopes::GMAIL_INSERT;
use tracing::debug;

use super::{Credential, MailApi, TokenStore};
use crate::account::AccountConfig;
use crate::check::{Check, CheckResult, ProbeReport};
use crate::error::ProbeError;
use crate::output::{OutputSink, Tone};

/// Where a credential stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing usable on disk.
    NoCredential,
    /// Cached, well-formed and unexpired.
    CachedValid(Credential),
    /// Cached and expired (or missing its access token), with a refresh token.
    CachedExpiredRefreshable(Credential),
    /// Cached but neither usable nor refreshable.
    CachedInvalid(Credential),
    /// Usable. `needs_persist` is set for credentials not yet written back.
    Authorized {
        /// The credential.
        credential: Credential,
        /// Whether the token file must still be written.
        needs_persist: bool,
    },
    /// Usable, but writing the token file failed.
    PersistFailed(Credential),
    /// No credential could be obtained.
    Failed(ProbeError),
}

impl TokenState {
    /// Classifies what was loaded from the token file.
    #[must_use]
    pub fn classify(loaded: Option<Credential>) -> Self {
        match loaded {
            None => Self::NoCredential,
            Some(c) if c.is_valid() => Self::CachedValid(c),
            Some(c) if c.is_well_formed() && c.has_refresh_token() => {
                Self::CachedExpiredRefreshable(c)
            }
            Some(c) => Self::CachedInvalid(c),
        }
    }

    /// Returns true once no further transition applies.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Authorized {
                needs_persist: false,
                ..
            } | Self::PersistFailed(_)
                | Self::Failed(_)
        )
    }

    /// Extracts the outcome of a terminal state.
    ///
    /// # Errors
    ///
    /// Returns the failure of a `Failed` state, or a credential error if the
    /// state is not terminal.
    pub fn into_credential(self) -> Result<Credential, ProbeError> {
        match self {
            Self::Authorized {
                credential,
                needs_persist: false,
            }
            | Self::PersistFailed(credential) => Ok(credential),
            Self::Failed(e) => Err(e),
            other => Err(ProbeError::Credential(format!(
                "token state {other} is not final"
            ))),
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoCredential => "no-credential",
            Self::CachedValid(_) => "cached-valid",
            Self::CachedExpiredRefreshable(_) => "cached-expired-refreshable",
            Self::CachedInvalid(_) => "cached-invalid",
            Self::Authorized { .. } => "authorized",
            Self::PersistFailed(_) => "persist-failed",
            Self::Failed(_) => "failed",
        })
    }
}

/// Drives one account's credential from the token file to a usable grant.
pub struct TokenLifecycle<'a, S, A> {
    store: &'a S,
    api: &'a A,
    sink: &'a dyn OutputSink,
    credentials_file: &'a Path,
    token_file: &'a Path,
    target: &'a str,
    scopes: Vec<String>,
}

impl<S, A> fmt::Debug for TokenLifecycle<'_, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenLifecycle")
            .field("credentials_file", &self.credentials_file)
            .field("token_file", &self.token_file)
            .field("target", &self.target)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl<'a, S: TokenStore, A: MailApi> TokenLifecycle<'a, S, A> {
    /// Creates a lifecycle for `account`, requesting the `gmail.insert` scope.
    #[must_use]
    pub fn new(store: &'a S, api: &'a A, sink: &'a dyn OutputSink, account: &'a AccountConfig) -> Self {
        Self {
            store,
            api,
            sink,
            credentials_file: &account.credentials_file,
            token_file: &account.token_file,
            target: &account.target_email,
            scopes: vec![GMAIL_INSERT.to_string()],
        }
    }

    /// Runs every transition until a terminal state and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the failure that ended interactive authorization.
    pub async fn run(&self, report: &mut ProbeReport) -> Result<Credential, ProbeError> {
        let mut state = self.load(report);
        while !state.is_terminal() {
            let next = self.transition(state, report).await;
            debug!(state = %next, "token state");
            state = next;
        }
        state.into_credential()
    }

    /// Reads the token file and classifies it.
    pub fn load(&self, report: &mut ProbeReport) -> TokenState {
        match self.store.load(self.token_file) {
            Ok(None) => TokenState::NoCredential,
            Ok(Some(credential)) => {
                report.record(
                    self.sink,
                    CheckResult::pass(
                        Check::TokenLoaded,
                        format!("Gmail API Token: Loaded from {}", self.token_file.display()),
                    ),
                );
                TokenState::classify(Some(credential))
            }
            Err(e) => {
                self.sink.warning(&format!("Failed to load token: {e}"));
                report.keep(CheckResult::fail(Check::TokenLoaded, e.to_string()));
                TokenState::NoCredential
            }
        }
    }

    /// Performs one transition. Terminal states are returned unchanged.
    pub async fn transition(&self, state: TokenState, report: &mut ProbeReport) -> TokenState {
        match state {
            TokenState::CachedValid(credential) => TokenState::Authorized {
                credential,
                needs_persist: false,
            },
            TokenState::CachedExpiredRefreshable(credential) => {
                self.refresh(&credential, report).await
            }
            TokenState::NoCredential | TokenState::CachedInvalid(_) => {
                self.authorize(report).await
            }
            TokenState::Authorized {
                credential,
                needs_persist: true,
            } => self.persist(credential, report),
            terminal => terminal,
        }
    }

    async fn refresh(&self, credential: &Credential, report: &mut ProbeReport) -> TokenState {
        match self.api.refresh(credential).await {
            Ok(credential) => {
                report.record(
                    self.sink,
                    CheckResult::pass(Check::TokenRefreshed, "Gmail API Token: Refreshed"),
                );
                TokenState::Authorized {
                    credential,
                    needs_persist: true,
                }
            }
            Err(e) => {
                report.record(
                    self.sink,
                    CheckResult::fail(
                        Check::TokenRefreshed,
                        format!("Gmail API Token Refresh: FAILED - {e}"),
                    ),
                );
                TokenState::NoCredential
            }
        }
    }

    async fn authorize(&self, report: &mut ProbeReport) -> TokenState {
        self.sink.emphasis(
            Tone::Warning,
            "\n  Browser will open for OAuth authentication.",
        );
        self.sink.emphasis(
            Tone::Warning,
            &format!("  Please approve the access for: {}\n", self.target),
        );

        match self
            .api
            .interactive_authorize(self.credentials_file, &self.scopes, self.sink)
            .await
        {
            Ok(credential) => {
                report.record(
                    self.sink,
                    CheckResult::pass(
                        Check::TokenObtained,
                        format!("Gmail API OAuth: Authenticated ({})", self.target),
                    ),
                );
                TokenState::Authorized {
                    credential,
                    needs_persist: true,
                }
            }
            Err(e) => {
                report.record(
                    self.sink,
                    CheckResult::fail(Check::TokenObtained, format!("Gmail API OAuth: FAILED - {e}")),
                );
                TokenState::Failed(e)
            }
        }
    }

    fn persist(&self, credential: Credential, report: &mut ProbeReport) -> TokenState {
        match self.store.save(self.token_file, &credential) {
            Ok(()) => {
                report.record(
                    self.sink,
                    CheckResult::pass(
                        Check::TokenSaved,
                        format!("Gmail API Token: Saved to {}", self.token_file.display()),
                    ),
                );
                TokenState::Authorized {
                    credential,
                    needs_persist: false,
                }
            }
            Err(e) => {
                self.sink.warning(&format!("Failed to save token: {e}"));
                report.keep(CheckResult::fail(Check::TokenSaved, e.to_string()));
                TokenState::PersistFailed(credential)
            }
        }
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
    use chrono::{Duration, Utc};

    fn credential(token: Option<&str>, refresh: Option<&str>, expired: bool) -> Credential {
        let offset = if expired {
            Duration::hours(-1)
        } else {
            Duration::hours(1)
        };
        Credential {
            token: token.map(str::to_string),
            refresh_token: refresh.map(str::to_string),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            client_id: "id".into(),
            client_secret: Some("secret".into()),
            scopes: vec![GMAIL_INSERT.into()],
            expiry: Some(Utc::now() + offset),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(TokenState::classify(None), TokenState::NoCredential);

        let valid = credential(Some("a"), None, false);
        assert!(matches!(
            TokenState::classify(Some(valid)),
            TokenState::CachedValid(_)
        ));

        let expired = credential(Some("a"), Some("r"), true);
        assert!(matches!(
            TokenState::classify(Some(expired)),
            TokenState::CachedExpiredRefreshable(_)
        ));

        let no_access = credential(None, Some("r"), false);
        assert!(matches!(
            TokenState::classify(Some(no_access)),
            TokenState::CachedExpiredRefreshable(_)
        ));

        let dead = credential(Some("a"), None, true);
        assert!(matches!(
            TokenState::classify(Some(dead)),
            TokenState::CachedInvalid(_)
        ));

        let mut anonymous = credential(Some("a"), Some("r"), false);
        anonymous.client_id = String::new();
        assert!(matches!(
            TokenState::classify(Some(anonymous)),
            TokenState::CachedInvalid(_)
        ));
    }

    #[test]
    fn test_terminal_states() {
        let c = credential(Some("a"), None, false);
        assert!(!TokenState::NoCredential.is_terminal());
        assert!(!TokenState::CachedValid(c.clone()).is_terminal());
        assert!(
            !TokenState::Authorized {
                credential: c.clone(),
                needs_persist: true
            }
            .is_terminal()
        );
        assert!(
            TokenState::Authorized {
                credential: c.clone(),
                needs_persist: false
            }
            .is_terminal()
        );
        assert!(TokenState::PersistFailed(c.clone()).is_terminal());
        assert!(TokenState::Failed(ProbeError::Credential("x".into())).is_terminal());
    }

    #[test]
    fn test_into_credential() {
        let c = credential(Some("a"), None, false);
        assert_eq!(TokenState::PersistFailed(c.clone()).into_credential().unwrap(), c);
        assert!(TokenState::NoCredential.into_credential().is_err());
        assert_eq!(
            TokenState::Failed(ProbeError::Credential("denied".into()))
                .into_credential()
                .unwrap_err(),
            ProbeError::Credential("denied".into())
        );
    }
}
