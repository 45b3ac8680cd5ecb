//! POP3 mailbox probe.

use relaycheck_pop3::{
    Authorization, Client, Config, Pop3Stream, Security, Transaction, connect,
};
use tracing::debug;

use crate::account::AccountConfig;
use crate::check::{Check, CheckResult, ProbeReport};
use crate::error::ProbeError;
use crate::output::OutputSink;

/// Where and how to reach a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxTarget {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Use implicit TLS.
    pub use_tls: bool,
    /// Verify the server certificate.
    pub verify_certificates: bool,
}

impl From<&AccountConfig> for MailboxTarget {
    fn from(account: &AccountConfig) -> Self {
        Self {
            host: account.pop3_host.clone(),
            port: account.pop3_port,
            use_tls: account.pop3_use_tls,
            verify_certificates: account.pop3_verify_cert,
        }
    }
}

/// Opens mailbox sessions.
#[allow(async_fn_in_trait)]
pub trait MailboxConnector {
    /// Session type.
    type Session: MailboxSession;

    /// Connects and reads the server greeting.
    async fn connect(&self, target: &MailboxTarget) -> Result<Self::Session, ProbeError>;
}

/// An open mailbox session.
#[allow(async_fn_in_trait)]
pub trait MailboxSession {
    /// Logs in.
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), ProbeError>;

    /// Lists unique message ids; returns how many there are.
    async fn list_unique_ids(&mut self) -> Result<usize, ProbeError>;

    /// Returns the message count and total size in bytes.
    async fn status(&mut self) -> Result<(u32, u64), ProbeError>;

    /// Ends the session.
    async fn close(self) -> Result<(), ProbeError>;
}

/// Connects to real POP3 servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pop3Connector;

impl MailboxConnector for Pop3Connector {
    type Session = Pop3Session;

    async fn connect(&self, target: &MailboxTarget) -> Result<Pop3Session, ProbeError> {
        let security = if target.use_tls {
            Security::Tls
        } else {
            Security::Plain
        };
        let config = Config::builder(&target.host)
            .port(target.port)
            .security(security)
            .verify_certificates(target.verify_certificates)
            .build();

        let stream = connect(&config).await?;
        debug!(address = %config.address(), tls = stream.is_tls(), "POP3 connected");
        let client = Client::from_stream_with_timeout(stream, config.timeout).await?;
        debug!(greeting = client.greeting(), "POP3 greeting");
        Ok(Pop3Session {
            state: SessionState::Authorization(client),
        })
    }
}

enum SessionState {
    Authorization(Client<Pop3Stream, Authorization>),
    Transaction(Client<Pop3Stream, Transaction>),
    Closed,
}

/// A live POP3 session.
pub struct Pop3Session {
    state: SessionState,
}

impl std::fmt::Debug for Pop3Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            SessionState::Authorization(_) => "authorization",
            SessionState::Transaction(_) => "transaction",
            SessionState::Closed => "closed",
        };
        f.debug_struct("Pop3Session").field("state", &state).finish()
    }
}

impl Pop3Session {
    fn transaction(&mut self) -> Result<&mut Client<Pop3Stream, Transaction>, ProbeError> {
        match &mut self.state {
            SessionState::Transaction(client) => Ok(client),
            _ => Err(ProbeError::Credential("not logged in".into())),
        }
    }
}

impl MailboxSession for Pop3Session {
    /// Uses AUTH PLAIN when CAPA advertises `SASL PLAIN`, USER/PASS otherwise.
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), ProbeError> {
        let SessionState::Authorization(mut client) =
            std::mem::replace(&mut self.state, SessionState::Closed)
        else {
            return Err(ProbeError::Credential("session is not awaiting login".into()));
        };

        let capabilities = match client.capabilities().await {
            Ok(caps) => caps,
            Err(e) => {
                self.state = SessionState::Authorization(client);
                return Err(e.into());
            }
        };

        let result = if capabilities.supports_sasl("PLAIN") {
            debug!("authenticating with AUTH PLAIN");
            client.auth_plain(username, password).await
        } else {
            debug!("authenticating with USER/PASS");
            client.login(username, password).await
        };

        match result {
            Ok(client) => {
                self.state = SessionState::Transaction(client);
                Ok(())
            }
            Err(failure) => {
                self.state = SessionState::Authorization(failure.client);
                Err(failure.error.into())
            }
        }
    }

    async fn list_unique_ids(&mut self) -> Result<usize, ProbeError> {
        match self.transaction()?.uidl().await {
            Ok(entries) => Ok(entries.len()),
            Err(e) if e.is_rejection() => Err(ProbeError::CapabilityUnsupported(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn status(&mut self) -> Result<(u32, u64), ProbeError> {
        let stat = self.transaction()?.stat().await?;
        Ok((stat.count, stat.size))
    }

    async fn close(self) -> Result<(), ProbeError> {
        match self.state {
            SessionState::Authorization(client) => client.quit().await?,
            SessionState::Transaction(client) => client.quit().await?,
            SessionState::Closed => {}
        }
        Ok(())
    }
}

/// Connects, authenticates, lists unique ids and reads the mailbox status.
///
/// Stops after a failed connection or login. A missing UIDL fails only that
/// sub-check. The verdict is connected and authenticated.
pub async fn probe_mailbox<C: MailboxConnector>(
    connector: &C,
    account: &AccountConfig,
    sink: &dyn OutputSink,
) -> ProbeReport {
    let mut report = ProbeReport::new();
    sink.plain("\n  Testing POP3 connection...");

    let target = MailboxTarget::from(account);
    if target.use_tls && !target.verify_certificates {
        sink.warning("TLS certificate verification disabled");
    }

    let mut session = match connector.connect(&target).await {
        Ok(session) => session,
        Err(e) => {
            report.record(
                sink,
                CheckResult::fail(Check::Connection, format!("POP3 Connection: FAILED - {e}")),
            );
            return report;
        }
    };
    report.record(
        sink,
        CheckResult::pass(
            Check::Connection,
            format!("POP3 Connection: Connected to {}:{}", target.host, target.port),
        ),
    );

    if let Err(e) = session
        .authenticate(&account.pop3_username, &account.pop3_password)
        .await
    {
        report.record(
            sink,
            CheckResult::fail(
                Check::Authentication,
                format!("POP3 Authentication: FAILED - {e}"),
            ),
        );
        close_quietly(session).await;
        return report;
    }
    report.record(
        sink,
        CheckResult::pass(
            Check::Authentication,
            format!("POP3 Authentication: OK (user: {})", account.pop3_username),
        ),
    );

    let uidl = match session.list_unique_ids().await {
        Ok(_) => CheckResult::pass(Check::CapabilitySupport, "POP3 UIDL Support: SUPPORTED"),
        Err(e) => CheckResult::fail(
            Check::CapabilitySupport,
            format!("POP3 UIDL Support: NOT SUPPORTED ({e})"),
        ),
    };
    report.record(sink, uidl);

    let status = match session.status().await {
        Ok((count, size)) => CheckResult::pass(
            Check::MessageCount,
            format!("POP3 Messages: {count} messages ({size} bytes)"),
        ),
        Err(e) => CheckResult::fail(Check::MessageCount, format!("POP3 Messages: FAILED - {e}")),
    };
    report.record(sink, status);

    close_quietly(session).await;
    report.set_passed(true);
    report
}

async fn close_quietly<S: MailboxSession>(session: S) {
    if let Err(e) = session.close().await {
        debug!("POP3 QUIT failed: {e}");
    }
}
