//! Per-account verification.

use std::fmt;

use tracing::info;

use crate::account::{AccountConfig, AccountResolution, resolve_account};
use crate::output::{OutputSink, Tone};
use crate::probe::{MailboxConnector, probe_api, probe_mailbox};
use crate::settings::SettingsSource;
use crate::token::{MailApi, TokenStore};

/// Result for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Not enabled; excluded from the tally.
    Disabled,
    /// Enabled, and at least one probe failed.
    Failed,
    /// Enabled, and both probes passed.
    Passed,
}

impl AccountOutcome {
    /// Returns true for enabled accounts.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "DISABLED",
            Self::Failed => "FAILED",
            Self::Passed => "PASSED",
        })
    }
}

/// Runs both probes for an account.
pub struct AccountVerifier<'a, C, S, A> {
    connector: &'a C,
    store: &'a S,
    api: &'a A,
    sink: &'a dyn OutputSink,
}

impl<C, S, A> fmt::Debug for AccountVerifier<'_, C, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountVerifier").finish_non_exhaustive()
    }
}

impl<'a, C, S, A> AccountVerifier<'a, C, S, A>
where
    C: MailboxConnector,
    S: TokenStore,
    A: MailApi,
{
    /// Creates a verifier over the given collaborators.
    #[must_use]
    pub const fn new(connector: &'a C, store: &'a S, api: &'a A, sink: &'a dyn OutputSink) -> Self {
        Self {
            connector,
            store,
            api,
            sink,
        }
    }

    /// Resolves account `ordinal` from `settings` and verifies it.
    pub async fn verify<T: SettingsSource + ?Sized>(&self, ordinal: u32, settings: &T) -> AccountOutcome {
        let account = match resolve_account(ordinal, settings) {
            AccountResolution::Disabled => {
                self.sink
                    .emphasis(Tone::Warning, &format!("\nAccount {ordinal}: DISABLED"));
                return AccountOutcome::Disabled;
            }
            AccountResolution::Invalid(missing) => {
                self.sink.heading(&format!("Testing Account {ordinal}..."));
                let names: Vec<&str> = missing.iter().map(|f| f.field()).collect();
                self.sink.error(&format!(
                    "Missing required settings: {}",
                    names.join(", ")
                ));
                return AccountOutcome::Failed;
            }
            AccountResolution::Ready(account) => account,
        };

        self.sink.heading(&format!("Testing Account {ordinal}..."));
        self.verify_config(&account).await
    }

    /// Verifies an already resolved account. Both probes always run.
    pub async fn verify_config(&self, account: &AccountConfig) -> AccountOutcome {
        let mailbox = probe_mailbox(self.connector, account, self.sink).await;
        let api = probe_api(self.store, self.api, account, self.sink).await;

        let ordinal = account.ordinal;
        let outcome = if mailbox.passed() && api.passed() {
            self.sink.emphasis(
                Tone::Success,
                &format!("\n  Account {ordinal}: ALL TESTS PASSED ✓"),
            );
            AccountOutcome::Passed
        } else {
            self.sink.emphasis(
                Tone::Error,
                &format!("\n  Account {ordinal}: SOME TESTS FAILED ✗"),
            );
            AccountOutcome::Failed
        };
        info!(
            account = ordinal,
            pop3 = mailbox.passed(),
            gmail = api.passed(),
            %outcome,
            "account checked"
        );
        outcome
    }
}
