//! # relaycheck-core
//!
//! Pre-flight checks for a POP3 to Gmail API import job.
//!
//! This crate provides:
//! - Settings lookup over a flat `ACCOUNTn_` key space
//! - Account resolution and validation
//! - A POP3 probe (connect, login, UIDL, STAT)
//! - The OAuth token lifecycle (load, refresh, browser consent, persist)
//! - A Gmail API probe
//! - Per-account verification and the run summary with its exit code
//!
//! Network and credential collaborators sit behind traits
//! ([`MailboxConnector`], [`TokenStore`], [`MailApi`], [`OutputSink`]) so
//! the orchestration can run against fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod check;
mod error;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod service;
pub mod settings;
pub mod token;
pub mod verifier;

pub use account::{AccountConfig, AccountResolution, RequiredField, resolve_account};
pub use check::{Check, CheckResult, ProbeReport};
pub use error::{Error, ProbeError, Result};
pub use orchestrator::{Orchestrator, RunSummary};
pub use output::{ConsoleSink, LineKind, MemorySink, OutputSink, Tone};
pub use probe::{
    MailboxConnector, MailboxSession, MailboxTarget, Pop3Connector, probe_api, probe_mailbox,
};
pub use service::GmailService;
pub use settings::{DEFAULT_ENV_FILE, MapSettings, SettingsSource, parse_bool};
pub use token::{Credential, GmailApi, MailApi, TokenLifecycle, TokenState, TokenStore};
pub use verifier::{AccountOutcome, AccountVerifier};
