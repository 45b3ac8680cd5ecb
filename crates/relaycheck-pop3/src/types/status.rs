//! Status indicators returned by a POP3 server.

/// Status indicator at the start of every POP3 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `+OK`
    Ok,
    /// `-ERR`
    Err,
}

impl Status {
    /// Returns the wire form of the indicator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "+OK",
            Self::Err => "-ERR",
        }
    }
}

/// First line of a POP3 response: status indicator plus optional text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Status indicator.
    pub status: Status,
    /// Text after the indicator (may be empty).
    pub text: String,
}

impl StatusLine {
    /// Creates a new status line.
    #[must_use]
    pub fn new(status: Status, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// Returns true for `+OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
