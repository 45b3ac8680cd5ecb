//! Connectivity probes.

pub mod api;
pub mod mailbox;

pub use api::probe_api;
pub use mailbox::{
    MailboxConnector, MailboxSession, MailboxTarget, Pop3Connector, Pop3Session, probe_mailbox,
};
