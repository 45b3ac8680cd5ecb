//! Maildrop listings (STAT, UIDL).

use std::fmt;

/// Maildrop summary returned by STAT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStat {
    /// Number of messages in the maildrop.
    pub count: u32,
    /// Size of the maildrop in octets.
    pub size: u64,
}

impl fmt::Display for MailboxStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} messages ({} bytes)", self.count, self.size)
    }
}

/// One line of a UIDL listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidlEntry {
    /// Message number within the session.
    pub number: u32,
    /// Server-assigned unique id (persistent across sessions).
    pub unique_id: String,
}
