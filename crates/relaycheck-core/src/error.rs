//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file does not exist.
    #[error("{} file not found. Please create {} from .env.example", .0.display(), .0.display())]
    SettingsNotFound(PathBuf),

    /// The settings file exists but could not be parsed.
    #[error("Failed to read settings from {path}: {source}", path = .path.display())]
    Settings {
        /// File that was being read.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: dotenvy::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single check failed.
///
/// Every probe turns these into a failed [`CheckResult`](crate::CheckResult);
/// none of them ever stops another account from being checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Required settings are absent or unusable.
    #[error("{0}")]
    Configuration(String),

    /// Network, TLS or timeout failure.
    #[error("{0}")]
    Transport(String),

    /// The server does not support an optional command.
    #[error("{0}")]
    CapabilityUnsupported(String),

    /// A password or token was refused, or could not be obtained.
    #[error("{0}")]
    Credential(String),

    /// The API service handle could not be built.
    #[error("{0}")]
    ServiceConstruction(String),
}

impl From<relaycheck_pop3::Error> for ProbeError {
    fn from(err: relaycheck_pop3::Error) -> Self {
        if err.is_rejection() {
            Self::Credential(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<relaycheck_oauth::Error> for ProbeError {
    fn from(err: relaycheck_oauth::Error) -> Self {
        use relaycheck_oauth::Error as OAuth;
        match err {
            OAuth::Http(_) | OAuth::Io(_) => Self::Transport(err.to_string()),
            OAuth::InvalidClientSecrets(_) | OAuth::InvalidConfig(_) | OAuth::UrlError(_) => {
                Self::Configuration(err.to_string())
            }
            _ => Self::Credential(err.to_string()),
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
    use std::time::Duration;

    #[test]
    fn test_settings_not_found_message() {
        let err = Error::SettingsNotFound(PathBuf::from(".env"));
        assert_eq!(
            err.to_string(),
            ".env file not found. Please create .env from .env.example"
        );
    }

    #[test]
    fn test_pop3_error_mapping() {
        let rejected: ProbeError = relaycheck_pop3::Error::rejected("PASS", "bad password").into();
        assert!(matches!(rejected, ProbeError::Credential(_)));

        let timeout: ProbeError = relaycheck_pop3::Error::Timeout(Duration::from_secs(10)).into();
        assert!(matches!(timeout, ProbeError::Transport(_)));
    }

    #[test]
    fn test_oauth_error_mapping() {
        let grant: ProbeError =
            relaycheck_oauth::Error::oauth_error("invalid_grant", "Token has been revoked").into();
        assert!(matches!(grant, ProbeError::Credential(_)));

        let secrets: ProbeError =
            relaycheck_oauth::Error::InvalidClientSecrets("empty".into()).into();
        assert!(matches!(secrets, ProbeError::Configuration(_)));
    }
}
