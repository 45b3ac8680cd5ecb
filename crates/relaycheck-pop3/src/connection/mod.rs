//! POP3 connection management.
//!
//! - Configuration (host, port, security, certificate checks, timeout)
//! - TLS/plaintext stream abstraction
//! - Type-state client

mod client;
mod config;
mod stream;
mod tls;

pub use client::{AuthFailure, Authorization, Client, Transaction};
pub use config::{Config, ConfigBuilder, DEFAULT_TIMEOUT, Security};
pub use stream::{Pop3Stream, connect};
pub use tls::create_tls_connector;

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Runs `fut` with a deadline, mapping expiry to [`Error::Timeout`].
pub(crate) async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(limit))?
}
