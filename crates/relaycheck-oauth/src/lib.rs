//! # relaycheck-oauth
//!
//! `OAuth2` support for tools that write into Gmail on behalf of a user.
//!
//! ## Features
//!
//! - **Installed-app flow**: Authorization Code Flow with PKCE and a loopback
//!   redirect receiver, the way Google recommends for desktop tools
//! - **Token management**: refresh, expiry checking with a safety buffer
//! - **Client secrets**: reads the JSON downloaded from the Google Cloud console
//! - **Token cache**: reads and writes the "authorized user" JSON layout with
//!   owner-only permissions, compatible with Google's own client libraries
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaycheck_oauth::{AuthorizedUser, ClientSecrets, FileTokenStore, InstalledAppFlow};
//! use relaycheck_oauth::scopes::GMAIL_INSERT;
//!
//! #[tokio::main]
//! async fn main() -> relaycheck_oauth::Result<()> {
//!     let secrets = ClientSecrets::from_file("credentials.json")?;
//!     let scopes = vec![GMAIL_INSERT.to_string()];
//!
//!     let flow = InstalledAppFlow::new(secrets.clone(), scopes.clone());
//!     let token = flow
//!         .run_local_server(|url| println!("Visit: {url}"))
//!         .await?;
//!
//!     let user = AuthorizedUser::from_token(&token, &secrets, &scopes);
//!     FileTokenStore.save("tokens/account1.json", &user)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Token Refresh
//!
//! ```ignore
//! if user.is_expired() {
//!     let token = user.client()?.refresh_token(&user.to_token()).await?;
//!     let user = user.with_token(token);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod secrets;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, InstalledAppFlow, LoopbackReceiver, OAuthClient, PkceChallenge};
pub use provider::Provider;
pub use secrets::ClientSecrets;
pub use token::{AuthorizedUser, FileTokenStore, Token};

/// Well-known Gmail scopes.
pub mod scopes {
    /// Insert messages into a mailbox (no read access).
    pub const GMAIL_INSERT: &str = "https://www.googleapis.com/auth/gmail.insert";
}
