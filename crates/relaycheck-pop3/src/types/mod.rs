//! Core POP3 types.

mod capability;
mod listing;
mod status;

pub use capability::{Capabilities, Capability};
pub use listing::{MailboxStat, UidlEntry};
pub use status::{Status, StatusLine};
