//! Account verification and run orchestration against scripted collaborators.

#![allow(clippy::unwrap_used)]

mod common;

use std::path::PathBuf;

use common::{FakeApi, FakeMailbox, FakeStore, Workspace, expired_credential, valid_credential};
use relaycheck_core::{
    AccountOutcome, AccountResolution, AccountVerifier, Check, Error, LineKind, MapSettings,
    MemorySink, Orchestrator, RunSummary, probe_mailbox, resolve_account,
};

async fn verify_one(
    settings: &MapSettings,
    mailbox: &FakeMailbox,
    store: &FakeStore,
    api: &FakeApi,
    sink: &MemorySink,
) -> AccountOutcome {
    AccountVerifier::new(mailbox, store, api, sink)
        .verify(1, settings)
        .await
}

async fn run(
    settings: relaycheck_core::Result<MapSettings>,
    mailbox: &FakeMailbox,
    store: &FakeStore,
    api: &FakeApi,
    sink: &MemorySink,
) -> RunSummary {
    Orchestrator::new(mailbox, store, api, sink)
        .run(settings)
        .await
}

#[tokio::test]
async fn disabled_account_touches_nothing() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);
    settings.set("ACCOUNT1_ENABLED", "nope");

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Disabled);
    assert_eq!(mailbox.calls.total(), 0);
    assert_eq!(store.calls.load.get(), 0);
    assert_eq!(api.calls.refresh.get() + api.calls.authorize.get(), 0);
    assert!(sink.contains("Account 1: DISABLED"));
}

#[tokio::test]
async fn missing_fields_are_all_listed() {
    let settings = MapSettings::from_pairs([
        ("ACCOUNT1_ENABLED", "yes"),
        ("ACCOUNT1_POP3_HOST", "pop.example.com"),
        ("ACCOUNT1_GMAIL_TOKEN_FILE", "tokens/account1.json"),
    ]);
    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::default(),
        FakeApi::default(),
        MemorySink::new(),
    );

    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Failed);
    assert_eq!(
        sink.messages(LineKind::Error),
        vec![
            "Missing required settings: pop3_username, pop3_password, gmail_credentials_file, gmail_target_email"
                .to_string()
        ]
    );
    assert_eq!(mailbox.calls.total(), 0);
    assert_eq!(store.calls.load.get(), 0);
}

#[tokio::test]
async fn connect_failure_skips_the_session() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let mailbox = FakeMailbox {
        connect_fails: true,
        ..FakeMailbox::default()
    };
    let (store, api, sink) = (
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Failed);
    assert_eq!(mailbox.calls.connect.get(), 1);
    assert_eq!(mailbox.calls.authenticate.get(), 0);
    assert_eq!(mailbox.calls.list.get(), 0);
    assert_eq!(mailbox.calls.status.get(), 0);
    assert!(sink.contains("POP3 Connection: FAILED - connection refused"));
    // The API probe still runs.
    assert_eq!(api.calls.build.get(), 1);
}

#[tokio::test]
async fn missing_uidl_does_not_fail_the_account() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let mailbox = FakeMailbox {
        uidl_unsupported: true,
        ..FakeMailbox::default()
    };
    let (store, api, sink) = (
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert!(sink.contains("POP3 UIDL Support: NOT SUPPORTED"));
    assert_eq!(mailbox.calls.status.get(), 1);
    assert_eq!(mailbox.calls.close.get(), 1);
    assert!(sink.contains("POP3 Messages: 2 messages (4096 bytes)"));
}

#[tokio::test]
async fn status_failure_keeps_the_mailbox_verdict() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);
    let AccountResolution::Ready(account) = resolve_account(1, &settings) else {
        panic!("account should resolve");
    };

    let mailbox = FakeMailbox {
        status_fails: true,
        ..FakeMailbox::default()
    };
    let sink = MemorySink::new();
    let report = probe_mailbox(&mailbox, &account, &sink).await;

    assert!(report.passed());
    assert!(report.get(Check::MessageCount).is_some());
    assert!(!report.check_passed(Check::MessageCount));
    assert!(sink.contains("POP3 Messages: FAILED - server rejected STAT: mailbox locked"));
    assert_eq!(mailbox.calls.close.get(), 1);

    let (store, api, sink) = (
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;
    assert_eq!(outcome, AccountOutcome::Passed);
}

#[tokio::test]
async fn quit_failure_is_swallowed() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);
    let AccountResolution::Ready(account) = resolve_account(1, &settings) else {
        panic!("account should resolve");
    };

    let mailbox = FakeMailbox {
        close_fails: true,
        ..FakeMailbox::default()
    };
    let sink = MemorySink::new();
    let report = probe_mailbox(&mailbox, &account, &sink).await;

    assert!(report.passed());
    assert_eq!(mailbox.calls.close.get(), 1);
    assert!(!sink.contains("connection reset by peer"));
    assert!(sink.messages(LineKind::Error).is_empty());

    let (store, api, sink) = (
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;
    assert_eq!(outcome, AccountOutcome::Passed);
}

#[tokio::test]
async fn valid_cached_credential_needs_no_token_traffic() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(api.calls.refresh.get(), 0);
    assert_eq!(api.calls.authorize.get(), 0);
    assert_eq!(store.calls.save.get(), 0);
    assert!(sink.contains("Gmail API Token: Loaded from"));
    assert!(sink.contains("Gmail API Connection: OK (target: alice@gmail.com)"));
    assert!(sink.contains("Account 1: ALL TESTS PASSED"));
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_saved() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(expired_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(api.calls.refresh.get(), 1);
    assert_eq!(api.calls.authorize.get(), 0);
    assert_eq!(store.calls.save.get(), 1);
    let saved = store.stored.borrow().clone().unwrap();
    assert_eq!(saved.access_token(), Some("ya29.refreshed"));
    assert!(sink.contains("Gmail API Token: Refreshed"));
}

#[tokio::test]
async fn rejected_refresh_falls_through_to_consent() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let api = FakeApi {
        refresh_fails: true,
        ..FakeApi::default()
    };
    let (mailbox, store, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(expired_credential()),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(api.calls.refresh.get(), 1);
    assert_eq!(api.calls.authorize.get(), 1);
    assert!(sink.contains("Gmail API Token Refresh: FAILED"));
    assert!(sink.contains("Browser will open for OAuth authentication."));
    assert!(sink.contains("Please approve the access for: alice@gmail.com"));
    let saved = store.stored.borrow().clone().unwrap();
    assert_eq!(saved.access_token(), Some("ya29.consented"));
}

#[tokio::test]
async fn expired_without_refresh_token_goes_straight_to_consent() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let mut stale = expired_credential();
    stale.refresh_token = None;
    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(stale),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(api.calls.refresh.get(), 0);
    assert_eq!(api.calls.authorize.get(), 1);
}

#[tokio::test]
async fn unreadable_token_file_is_a_warning() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let store = FakeStore {
        load_fails: true,
        ..FakeStore::default()
    };
    let (mailbox, api, sink) = (FakeMailbox::healthy(), FakeApi::default(), MemorySink::new());
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(sink.messages(LineKind::Warning).len(), 1);
    assert!(sink.contains("Failed to load token"));
    assert_eq!(api.calls.authorize.get(), 1);
}

#[tokio::test]
async fn persist_failure_still_builds_the_service() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let store = FakeStore {
        save_fails: true,
        ..FakeStore::default()
    };
    let (mailbox, api, sink) = (FakeMailbox::healthy(), FakeApi::default(), MemorySink::new());
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert_eq!(store.calls.save.get(), 1);
    assert_eq!(api.calls.build.get(), 1);
    assert!(sink.contains("Failed to save token: permission denied"));
}

#[tokio::test]
async fn declined_consent_fails_the_api_probe() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let api = FakeApi {
        authorize_fails: true,
        ..FakeApi::default()
    };
    let (mailbox, store, sink) = (FakeMailbox::healthy(), FakeStore::default(), MemorySink::new());
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Failed);
    assert_eq!(store.calls.save.get(), 0);
    assert_eq!(api.calls.build.get(), 0);
    assert!(sink.contains("Gmail API OAuth: FAILED - User denied authorization"));
    assert!(sink.contains("Account 1: SOME TESTS FAILED"));
}

#[tokio::test]
async fn service_construction_failure_fails_the_api_probe() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let api = FakeApi {
        build_fails: true,
        ..FakeApi::default()
    };
    let (mailbox, store, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Failed);
    assert!(sink.contains("Gmail API Connection: FAILED"));
}

#[tokio::test]
async fn missing_client_secrets_skips_the_token_file() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);
    let absent = workspace.dir.path().join("absent.json");
    settings.set("ACCOUNT1_GMAIL_CREDENTIALS_FILE", absent.display().to_string());

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Failed);
    assert_eq!(store.calls.load.get(), 0);
    assert!(sink.contains(&format!(
        "Gmail API Credentials: NOT FOUND - {}",
        absent.display()
    )));
}

#[tokio::test]
async fn pop3_login_failure_fails_account_but_api_runs() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let mailbox = FakeMailbox {
        auth_fails: true,
        ..FakeMailbox::default()
    };
    let (store, api, sink) = (
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let summary = run(Ok(settings), &mailbox, &store, &api, &sink).await;

    assert_eq!(summary.outcomes(), &[(1, AccountOutcome::Failed)]);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(mailbox.calls.list.get(), 0);
    assert_eq!(mailbox.calls.close.get(), 1);
    assert_eq!(api.calls.build.get(), 1);
    assert!(sink.contains("Gmail API Connection: OK"));
    assert!(sink.contains("Some tests failed. Please fix the issues above."));
}

#[tokio::test]
async fn absent_settings_abort_the_run() {
    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::default(),
        FakeApi::default(),
        MemorySink::new(),
    );
    let summary = run(
        Err(Error::SettingsNotFound(PathBuf::from(".env"))),
        &mailbox,
        &store,
        &api,
        &sink,
    )
    .await;

    assert!(summary.is_aborted());
    assert_eq!(summary.exit_code(), 1);
    assert!(summary.outcomes().is_empty());
    assert_eq!(
        sink.messages(LineKind::Error),
        vec![".env file not found. Please create .env from .env.example".to_string()]
    );
    assert_eq!(mailbox.calls.total(), 0);
    assert_eq!(store.calls.load.get(), 0);
}

#[tokio::test]
async fn disabled_accounts_are_left_out_of_the_tally() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    settings.set("ACCOUNT_COUNT", "2");
    workspace.enable(&mut settings, 1);

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let summary = run(Ok(settings), &mailbox, &store, &api, &sink).await;

    assert_eq!(
        summary.outcomes(),
        &[(1, AccountOutcome::Passed), (2, AccountOutcome::Disabled)]
    );
    assert_eq!(summary.enabled(), 1);
    assert_eq!(summary.passed(), 1);
    assert_eq!(summary.exit_code(), 0);
    assert!(sink.contains("Total: 1/1 accounts passed"));
    assert!(sink.contains("All tests passed! Ready to run the importer"));
    assert_eq!(mailbox.calls.connect.get(), 1);
}

#[tokio::test]
async fn no_enabled_accounts_is_a_warning_and_success() {
    let settings = MapSettings::from_pairs([("ACCOUNT_COUNT", "2")]);
    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::default(),
        FakeApi::default(),
        MemorySink::new(),
    );
    let summary = run(Ok(settings), &mailbox, &store, &api, &sink).await;

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(
        sink.messages(LineKind::Warning),
        vec!["No enabled accounts to test".to_string()]
    );
}

#[tokio::test]
async fn second_run_reuses_the_saved_credential() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);

    let (mailbox, store, api) = (FakeMailbox::healthy(), FakeStore::default(), FakeApi::default());

    let first_sink = MemorySink::new();
    let first = run(Ok(settings.clone()), &mailbox, &store, &api, &first_sink).await;
    assert_eq!(api.calls.authorize.get(), 1);

    let second_sink = MemorySink::new();
    let second = run(Ok(settings), &mailbox, &store, &api, &second_sink).await;

    assert_eq!(first, second);
    assert_eq!(second.exit_code(), 0);
    assert_eq!(api.calls.authorize.get(), 1);
    assert!(!second_sink.contains("Browser will open"));
    assert!(second_sink.contains("Gmail API Token: Loaded from"));
}

#[tokio::test]
async fn accounts_run_in_ordinal_order() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    settings.set("ACCOUNT_COUNT", "3");
    for ordinal in 1..=3 {
        workspace.enable(&mut settings, ordinal);
        settings.set(format!("ACCOUNT{ordinal}_POP3_HOST"), format!("pop{ordinal}.example.com"));
    }

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let summary = run(Ok(settings), &mailbox, &store, &api, &sink).await;

    let hosts: Vec<String> = mailbox.targets.borrow().iter().map(|t| t.host.clone()).collect();
    assert_eq!(
        hosts,
        vec!["pop1.example.com", "pop2.example.com", "pop3.example.com"]
    );
    assert_eq!(summary.passed(), 3);
}

#[tokio::test]
async fn disabled_verification_warns_about_certificates() {
    let workspace = Workspace::new();
    let mut settings = MapSettings::new();
    workspace.enable(&mut settings, 1);
    settings.set("ACCOUNT1_POP3_VERIFY_CERT", "false");

    let (mailbox, store, api, sink) = (
        FakeMailbox::healthy(),
        FakeStore::holding(valid_credential()),
        FakeApi::default(),
        MemorySink::new(),
    );
    let outcome = verify_one(&settings, &mailbox, &store, &api, &sink).await;

    assert_eq!(outcome, AccountOutcome::Passed);
    assert!(sink.contains("TLS certificate verification disabled"));
    assert!(!mailbox.targets.borrow()[0].verify_certificates);
}

#[test]
fn check_names_are_stable() {
    assert_eq!(Check::TokenSaved.to_string(), "token-saved");
}
