//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (includes TLS handshake failures surfaced by tokio-rustls).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server answered `-ERR`.
    #[error("server rejected {command}: {message}")]
    Rejected {
        /// Command keyword that was rejected (e.g. `PASS`).
        command: &'static str,
        /// Text following `-ERR`.
        message: String,
    },

    /// Protocol error (unexpected or malformed response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation did not finish within the configured timeout.
    #[error("timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Hostname cannot be used as a TLS server name.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates a rejection error for a command.
    #[must_use]
    pub fn rejected(command: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            command,
            message: message.into(),
        }
    }

    /// Returns true if the server explicitly refused the command.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns true if the failure happened on the transport rather than in the protocol.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::Timeout(_)
                | Self::ConnectionClosed
                | Self::InvalidHostname(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        let err = Error::rejected("PASS", "invalid password");
        assert_eq!(err.to_string(), "server rejected PASS: invalid password");
        assert!(err.is_rejection());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "timed out after 10 seconds");
        assert!(err.is_transport());
    }
}
