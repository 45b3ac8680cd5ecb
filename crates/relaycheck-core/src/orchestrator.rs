//! The whole run: every account, then the summary and exit code.

use std::fmt;

use tracing::info;

use crate::account::account_count;
use crate::error::Result;
use crate::output::{OutputSink, Tone};
use crate::probe::MailboxConnector;
use crate::settings::SettingsSource;
use crate::token::{MailApi, TokenStore};
use crate::verifier::{AccountOutcome, AccountVerifier};

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    outcomes: Vec<(u32, AccountOutcome)>,
    aborted: bool,
}

impl RunSummary {
    /// A run that never started because settings were unavailable.
    #[must_use]
    pub const fn aborted() -> Self {
        Self {
            outcomes: Vec::new(),
            aborted: true,
        }
    }

    /// Every account's outcome, disabled ones included.
    #[must_use]
    pub fn outcomes(&self) -> &[(u32, AccountOutcome)] {
        &self.outcomes
    }

    /// Number of enabled accounts.
    #[must_use]
    pub fn enabled(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_enabled()).count()
    }

    /// Number of enabled accounts that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == AccountOutcome::Passed)
            .count()
    }

    /// Returns true if settings were unavailable.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// 0 when every enabled account passed (or none is enabled), 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.aborted || self.passed() != self.enabled())
    }
}

/// Runs the verifier over every configured account.
pub struct Orchestrator<'a, C, S, A> {
    verifier: AccountVerifier<'a, C, S, A>,
    sink: &'a dyn OutputSink,
}

impl<C, S, A> fmt::Debug for Orchestrator<'_, C, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl<'a, C, S, A> Orchestrator<'a, C, S, A>
where
    C: MailboxConnector,
    S: TokenStore,
    A: MailApi,
{
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub const fn new(connector: &'a C, store: &'a S, api: &'a A, sink: &'a dyn OutputSink) -> Self {
        Self {
            verifier: AccountVerifier::new(connector, store, api, sink),
            sink,
        }
    }

    /// Checks accounts `1..=ACCOUNT_COUNT` in order and prints the summary.
    ///
    /// An unavailable settings source is reported once and nothing else runs.
    pub async fn run<T: SettingsSource>(&self, settings: Result<T>) -> RunSummary {
        self.sink.heading(&format!(
            "relaycheck v{} - Connection Test",
            env!("CARGO_PKG_VERSION")
        ));

        let settings = match settings {
            Ok(settings) => settings,
            Err(e) => {
                self.sink.error(&e.to_string());
                return RunSummary::aborted();
            }
        };
        match settings.origin() {
            Some(origin) => self.sink.success(&format!("{} file found", origin.display())),
            None => self.sink.success("Settings loaded"),
        }

        let count = account_count(&settings);
        self.sink.plain(&format!("\nTesting {count} account(s)...\n"));

        let mut summary = RunSummary::default();
        for ordinal in 1..=count {
            let outcome = self.verifier.verify(ordinal, &settings).await;
            summary.outcomes.push((ordinal, outcome));
        }

        self.print_summary(&summary);
        info!(
            enabled = summary.enabled(),
            passed = summary.passed(),
            "run complete"
        );
        summary
    }

    fn print_summary(&self, summary: &RunSummary) {
        self.sink.heading("Test Summary");

        if summary.enabled() == 0 {
            self.sink.warning("No enabled accounts to test");
            return;
        }

        for (ordinal, outcome) in summary.outcomes() {
            match outcome {
                AccountOutcome::Passed => self
                    .sink
                    .emphasis(Tone::Success, &format!("  Account {ordinal}: PASSED ✓")),
                AccountOutcome::Failed => self
                    .sink
                    .emphasis(Tone::Error, &format!("  Account {ordinal}: FAILED ✗")),
                AccountOutcome::Disabled => {}
            }
        }

        self.sink.plain(&format!(
            "\n  Total: {}/{} accounts passed",
            summary.passed(),
            summary.enabled()
        ));

        if summary.exit_code() == 0 {
            self.sink.emphasis(
                Tone::Success,
                "\n  All tests passed! Ready to run the importer\n",
            );
        } else {
            self.sink.emphasis(
                Tone::Error,
                "\n  Some tests failed. Please fix the issues above.\n",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunSummary::aborted().exit_code(), 1);
        assert_eq!(RunSummary::default().exit_code(), 0);

        let summary = RunSummary {
            outcomes: vec![(1, AccountOutcome::Passed), (2, AccountOutcome::Disabled)],
            aborted: false,
        };
        assert_eq!(summary.enabled(), 1);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.exit_code(), 0);

        let summary = RunSummary {
            outcomes: vec![(1, AccountOutcome::Passed), (2, AccountOutcome::Failed)],
            aborted: false,
        };
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_only_disabled_accounts_exit_zero() {
        let summary = RunSummary {
            outcomes: vec![(1, AccountOutcome::Disabled)],
            aborted: false,
        };
        assert_eq!(summary.enabled(), 0);
        assert_eq!(summary.exit_code(), 0);
    }
}
