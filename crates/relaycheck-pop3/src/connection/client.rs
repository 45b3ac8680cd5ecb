//! Type-state POP3 client.

use std::marker::PhantomData;
use std::time::Duration;

use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use super::config::DEFAULT_TIMEOUT;
use super::with_timeout;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_terminator, parse_stat, parse_status_line, parse_uidl_line, unstuff};
use crate::types::{Capabilities, MailboxStat, Status, StatusLine, UidlEntry};

/// Type-state marker for the AUTHORIZATION state.
#[derive(Debug)]
pub struct Authorization;

/// Type-state marker for the TRANSACTION state.
#[derive(Debug)]
pub struct Transaction;

/// POP3 client with type-state pattern.
pub struct Client<S, State> {
    stream: BufReader<S>,
    greeting: String,
    timeout: Duration,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("greeting", &self.greeting)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A rejected authentication attempt.
///
/// Hands the client back so the session can still be closed with QUIT.
#[derive(Debug)]
pub struct AuthFailure<S> {
    /// Client, still in the AUTHORIZATION state.
    pub client: Client<S, Authorization>,
    /// Why authentication failed.
    pub error: Error,
}

impl<S> AuthFailure<S> {
    /// Discards the client and keeps the error.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<S> Client<S, Authorization>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server sends `-ERR`.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::from_stream_with_timeout(stream, DEFAULT_TIMEOUT).await
    }

    /// Like [`Client::from_stream`] with an explicit per-operation timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server sends `-ERR`.
    pub async fn from_stream_with_timeout(stream: S, timeout: Duration) -> Result<Self> {
        let mut client = Self {
            stream: BufReader::new(stream),
            greeting: String::new(),
            timeout,
            _state: PhantomData,
        };

        let greeting = client.read_status().await?;
        if !greeting.is_ok() {
            return Err(Error::rejected("greeting", greeting.text));
        }
        client.greeting = greeting.text;

        Ok(client)
    }

    /// Queries the server's extension list with CAPA.
    ///
    /// A server without CAPA support answers `-ERR`; that yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails on the transport.
    pub async fn capabilities(&mut self) -> Result<Capabilities> {
        match self.multiline(Command::Capa).await {
            Ok(lines) => Ok(Capabilities::from_lines(lines)),
            Err(Error::Rejected { .. }) => Ok(Capabilities::default()),
            Err(e) => Err(e),
        }
    }

    /// Authenticates with USER and PASS.
    ///
    /// # Errors
    ///
    /// Returns the client together with the error if either command fails.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Transaction>, AuthFailure<S>> {
        let user = Command::User {
            username: username.to_string(),
        };
        if let Err(error) = self.simple(user).await {
            return Err(AuthFailure {
                client: self,
                error,
            });
        }

        let pass = Command::Pass {
            password: password.to_string(),
        };
        if let Err(error) = self.simple(pass).await {
            return Err(AuthFailure {
                client: self,
                error,
            });
        }

        Ok(self.into_state())
    }

    /// Authenticates with SASL PLAIN, sending the credentials as the initial response.
    ///
    /// # Errors
    ///
    /// Returns the client together with the error if the server rejects the exchange.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Transaction>, AuthFailure<S>> {
        // \0username\0password
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        let cmd = Command::Auth {
            mechanism: "PLAIN".to_string(),
            initial_response: Some(encoded),
        };

        let result = self.simple(cmd).await;
        match result {
            Ok(_) => Ok(self.into_state()),
            Err(error) => Err(AuthFailure {
                client: self,
                error,
            }),
        }
    }
}

impl<S> Client<S, Transaction>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the message count and maildrop size.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the reply is malformed.
    pub async fn stat(&mut self) -> Result<MailboxStat> {
        let line = self.simple(Command::Stat).await?;
        parse_stat(&line.text)
    }

    /// Lists the unique id of every message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if the server does not implement UIDL.
    pub async fn uidl(&mut self) -> Result<Vec<UidlEntry>> {
        let lines = self.multiline(Command::Uidl).await?;
        lines.iter().map(|l| parse_uidl_line(l)).collect()
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the text of the server greeting.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Sends QUIT and ends the session (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.simple(Command::Quit).await?;
        Ok(())
    }

    fn into_state<T>(self) -> Client<S, T> {
        Client {
            stream: self.stream,
            greeting: self.greeting,
            timeout: self.timeout,
            _state: PhantomData,
        }
    }

    /// Sends a command and expects a single `+OK` line.
    async fn simple(&mut self, cmd: Command) -> Result<StatusLine> {
        self.send(&cmd).await?;
        let line = self.read_status().await?;
        match line.status {
            Status::Ok => Ok(line),
            Status::Err => Err(Error::rejected(cmd.keyword(), line.text)),
        }
    }

    /// Sends a command and collects the body of a multi-line `+OK` response.
    async fn multiline(&mut self, cmd: Command) -> Result<Vec<String>> {
        let status = self.simple(cmd).await?;
        debug!(text = %status.text, "multi-line response");

        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if is_terminator(&line) {
                break;
            }
            lines.push(unstuff(&line).to_string());
        }
        Ok(lines)
    }

    async fn send(&mut self, cmd: &Command) -> Result<()> {
        debug!(command = ?cmd, "C:");
        let data = cmd.serialize();
        let stream = self.stream.get_mut();
        with_timeout(self.timeout, async {
            stream.write_all(&data).await?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    async fn read_status(&mut self) -> Result<StatusLine> {
        let line = self.read_line().await?;
        debug!(response = %line, "S:");
        parse_status_line(&line)
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let stream = &mut self.stream;
        let read = with_timeout(self.timeout, async {
            Ok(stream.read_until(b'\n', &mut buf).await?)
        })
        .await?;

        if read == 0 {
            return Err(Error::ConnectionClosed);
        }

        let line = String::from_utf8_lossy(&buf);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
