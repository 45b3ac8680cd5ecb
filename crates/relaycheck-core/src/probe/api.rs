//! Gmail API probe.

use crate::account::AccountConfig;
use crate::check::{Check, CheckResult, ProbeReport};
use crate::output::OutputSink;
use crate::token::{MailApi, TokenLifecycle, TokenStore};

/// Checks the client secrets file, obtains a usable credential and builds
/// the service handle for the account's target mailbox.
///
/// A missing client secrets file fails the probe before the token file is
/// touched. Building the handle is the whole proof of connectivity.
pub async fn probe_api<S: TokenStore, A: MailApi>(
    store: &S,
    api: &A,
    account: &AccountConfig,
    sink: &dyn OutputSink,
) -> ProbeReport {
    let mut report = ProbeReport::new();
    sink.plain("\n  Testing Gmail API connection...");

    let credentials_file = account.credentials_file.display();
    if !account.credentials_file.exists() {
        report.record(
            sink,
            CheckResult::fail(
                Check::CredentialFound,
                format!("Gmail API Credentials: NOT FOUND - {credentials_file}"),
            ),
        );
        return report;
    }
    report.record(
        sink,
        CheckResult::pass(
            Check::CredentialFound,
            format!("Gmail API Credentials: Found ({credentials_file})"),
        ),
    );

    let lifecycle = TokenLifecycle::new(store, api, sink, account);
    let Ok(credential) = lifecycle.run(&mut report).await else {
        return report;
    };

    let built = match api.build_service(&credential, &account.target_email) {
        Ok(_) => CheckResult::pass(
            Check::ServiceBuilt,
            format!("Gmail API Connection: OK (target: {})", account.target_email),
        ),
        Err(e) => CheckResult::fail(
            Check::ServiceBuilt,
            format!("Gmail API Connection: FAILED - {e}"),
        ),
    };
    report.set_passed(built.passed);
    report.record(sink, built);
    report
}
