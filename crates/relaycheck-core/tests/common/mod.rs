//! Scripted collaborators that count their calls.

#![allow(dead_code, clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{Duration, Utc};
use relaycheck_core::{
    Credential, MailApi, MailboxConnector, MailboxSession, MailboxTarget, MapSettings,
    OutputSink, ProbeError, TokenStore,
};
use relaycheck_oauth::scopes::GMAIL_INSERT;

#[derive(Debug, Default)]
pub struct MailboxCalls {
    pub connect: Cell<u32>,
    pub authenticate: Cell<u32>,
    pub list: Cell<u32>,
    pub status: Cell<u32>,
    pub close: Cell<u32>,
}

impl MailboxCalls {
    pub fn total(&self) -> u32 {
        self.connect.get()
            + self.authenticate.get()
            + self.list.get()
            + self.status.get()
            + self.close.get()
    }
}

fn bump(counter: &Cell<u32>) {
    counter.set(counter.get() + 1);
}

#[derive(Debug, Clone, Default)]
pub struct FakeMailbox {
    pub calls: Rc<MailboxCalls>,
    pub connect_fails: bool,
    pub auth_fails: bool,
    pub uidl_unsupported: bool,
    pub status_fails: bool,
    pub close_fails: bool,
    pub targets: Rc<RefCell<Vec<MailboxTarget>>>,
}

impl FakeMailbox {
    pub fn healthy() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct FakeSession {
    calls: Rc<MailboxCalls>,
    auth_fails: bool,
    uidl_unsupported: bool,
    status_fails: bool,
    close_fails: bool,
}

impl MailboxConnector for FakeMailbox {
    type Session = FakeSession;

    async fn connect(&self, target: &MailboxTarget) -> Result<FakeSession, ProbeError> {
        bump(&self.calls.connect);
        self.targets.borrow_mut().push(target.clone());
        if self.connect_fails {
            return Err(ProbeError::Transport("connection refused".into()));
        }
        Ok(FakeSession {
            calls: Rc::clone(&self.calls),
            auth_fails: self.auth_fails,
            uidl_unsupported: self.uidl_unsupported,
            status_fails: self.status_fails,
            close_fails: self.close_fails,
        })
    }
}

impl MailboxSession for FakeSession {
    async fn authenticate(&mut self, _username: &str, _password: &str) -> Result<(), ProbeError> {
        bump(&self.calls.authenticate);
        if self.auth_fails {
            return Err(ProbeError::Credential(
                "server rejected PASS: invalid password".into(),
            ));
        }
        Ok(())
    }

    async fn list_unique_ids(&mut self) -> Result<usize, ProbeError> {
        bump(&self.calls.list);
        if self.uidl_unsupported {
            return Err(ProbeError::CapabilityUnsupported(
                "server rejected UIDL: unknown command".into(),
            ));
        }
        Ok(2)
    }

    async fn status(&mut self) -> Result<(u32, u64), ProbeError> {
        bump(&self.calls.status);
        if self.status_fails {
            return Err(ProbeError::Transport("server rejected STAT: mailbox locked".into()));
        }
        Ok((2, 4096))
    }

    async fn close(self) -> Result<(), ProbeError> {
        bump(&self.calls.close);
        if self.close_fails {
            return Err(ProbeError::Transport("connection reset by peer".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct StoreCalls {
    pub load: Cell<u32>,
    pub save: Cell<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    pub calls: Rc<StoreCalls>,
    pub stored: Rc<RefCell<Option<Credential>>>,
    pub load_fails: bool,
    pub save_fails: bool,
}

impl FakeStore {
    pub fn holding(credential: Credential) -> Self {
        let store = Self::default();
        *store.stored.borrow_mut() = Some(credential);
        store
    }
}

impl TokenStore for FakeStore {
    fn load(&self, _path: &Path) -> Result<Option<Credential>, ProbeError> {
        bump(&self.calls.load);
        if self.load_fails {
            return Err(ProbeError::Credential("expected value at line 1 column 1".into()));
        }
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, _path: &Path, credential: &Credential) -> Result<(), ProbeError> {
        bump(&self.calls.save);
        if self.save_fails {
            return Err(ProbeError::Credential("permission denied".into()));
        }
        *self.stored.borrow_mut() = Some(credential.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ApiCalls {
    pub refresh: Cell<u32>,
    pub authorize: Cell<u32>,
    pub build: Cell<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeApi {
    pub calls: Rc<ApiCalls>,
    pub refresh_fails: bool,
    pub authorize_fails: bool,
    pub build_fails: bool,
}

impl MailApi for FakeApi {
    type Service = String;

    async fn refresh(&self, credential: &Credential) -> Result<Credential, ProbeError> {
        bump(&self.calls.refresh);
        if self.refresh_fails {
            return Err(ProbeError::Credential(
                "OAuth2 error: invalid_grant - Token has been expired or revoked.".into(),
            ));
        }
        let mut fresh = credential.clone();
        fresh.token = Some("ya29.refreshed".into());
        fresh.expiry = Some(Utc::now() + Duration::hours(1));
        Ok(fresh)
    }

    async fn interactive_authorize(
        &self,
        _credentials_file: &Path,
        scopes: &[String],
        _sink: &dyn OutputSink,
    ) -> Result<Credential, ProbeError> {
        bump(&self.calls.authorize);
        if self.authorize_fails {
            return Err(ProbeError::Credential("User denied authorization".into()));
        }
        let mut credential = valid_credential();
        credential.token = Some("ya29.consented".into());
        credential.scopes = scopes.to_vec();
        Ok(credential)
    }

    fn build_service(&self, credential: &Credential, target: &str) -> Result<String, ProbeError> {
        bump(&self.calls.build);
        if self.build_fails {
            return Err(ProbeError::ServiceConstruction("HTTP client: no TLS backend".into()));
        }
        Ok(format!("{target}:{}", credential.access_token().unwrap_or_default()))
    }
}

pub fn valid_credential() -> Credential {
    Credential {
        token: Some("ya29.cached".into()),
        refresh_token: Some("1//refresh".into()),
        token_uri: "https://oauth2.googleapis.com/token".into(),
        client_id: "42.apps.googleusercontent.com".into(),
        client_secret: Some("shh".into()),
        scopes: vec![GMAIL_INSERT.into()],
        expiry: Some(Utc::now() + Duration::hours(1)),
    }
}

pub fn expired_credential() -> Credential {
    let mut credential = valid_credential();
    credential.expiry = Some(Utc::now() - Duration::hours(1));
    credential
}

/// A scratch directory holding a client secrets file.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("credentials.json"),
            r#"{"installed":{"client_id":"42.apps.googleusercontent.com","client_secret":"shh"}}"#,
        )
        .unwrap();
        Self { dir }
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.dir.path().join("credentials.json")
    }

    pub fn token_file(&self, ordinal: u32) -> PathBuf {
        self.dir.path().join("tokens").join(format!("account{ordinal}.json"))
    }

    /// Adds a complete, enabled account to `settings`.
    pub fn enable(&self, settings: &mut MapSettings, ordinal: u32) {
        let p = format!("ACCOUNT{ordinal}_");
        settings.set(format!("{p}ENABLED"), "true");
        settings.set(format!("{p}POP3_HOST"), "pop.example.com");
        settings.set(format!("{p}POP3_USERNAME"), "alice");
        settings.set(format!("{p}POP3_PASSWORD"), "wonderland");
        settings.set(
            format!("{p}GMAIL_CREDENTIALS_FILE"),
            self.credentials_file().display().to_string(),
        );
        settings.set(
            format!("{p}GMAIL_TOKEN_FILE"),
            self.token_file(ordinal).display().to_string(),
        );
        settings.set(format!("{p}GMAIL_TARGET_EMAIL"), "alice@gmail.com");
    }
}
