//! # relaycheck-pop3
//!
//! An async POP3 client (RFC 1939) covering what a connectivity check needs.
//!
//! ## Features
//!
//! - **Type-state sessions**: `Authorization` and `Transaction` states are
//!   enforced at compile time
//! - **TLS**: implicit TLS (port 995) via rustls, with an opt-out for
//!   certificate verification on self-signed servers
//! - **Authentication**: USER/PASS and SASL PLAIN (RFC 5034)
//! - **Extensions**: CAPA (RFC 2449), UIDL
//! - **Timeouts**: every connect, handshake, read and write is bounded
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaycheck_pop3::{Client, Config};
//! use relaycheck_pop3::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> relaycheck_pop3::Result<()> {
//!     let config = Config::builder("pop.example.com").build();
//!     let stream = connect(&config).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let mut client = client
//!         .login("user@example.com", "password")
//!         .await
//!         .map_err(relaycheck_pop3::AuthFailure::into_error)?;
//!
//!     let stat = client.stat().await?;
//!     println!("{} messages, {} bytes", stat.count, stat.size);
//!
//!     client.quit().await
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌────────────────┐
//! │ Authorization  │ ─── login() / auth_plain() ───→ Transaction
//! └────────────────┘
//!         │                                              │
//!         └──────────────── quit() ──────────────────────┘
//! ```
//!
//! The library never issues DELE, so `quit()` from `Transaction` leaves the
//! maildrop untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    AuthFailure, Authorization, Client, Config, ConfigBuilder, Pop3Stream, Security, Transaction,
    connect,
};
pub use error::{Error, Result};
pub use types::{Capabilities, Capability, MailboxStat, Status, StatusLine, UidlEntry};

/// Default port for POP3 over implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 995;

/// Default port for plaintext POP3.
pub const DEFAULT_PLAIN_PORT: u16 = 110;
