//! POP3 command builder.

/// POP3 command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPA - List capabilities (RFC 2449)
    Capa,
    /// USER - Name the maildrop
    User {
        /// Mailbox name
        username: String,
    },
    /// PASS - Password for the named maildrop
    Pass {
        /// Password
        password: String,
    },
    /// AUTH - SASL authentication (RFC 5034)
    Auth {
        /// Mechanism name
        mechanism: String,
        /// Initial response (base64)
        initial_response: Option<String>,
    },
    /// STAT - Maildrop size
    Stat,
    /// UIDL - Unique-id listing for all messages
    Uidl,
    /// QUIT - End the session
    Quit,
}

impl Command {
    /// Returns the command keyword.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Capa => "CAPA",
            Self::User { .. } => "USER",
            Self::Pass { .. } => "PASS",
            Self::Auth { .. } => "AUTH",
            Self::Stat => "STAT",
            Self::Uidl => "UIDL",
            Self::Quit => "QUIT",
        }
    }

    /// Returns true if the server answers with a multi-line body on success.
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        matches!(self, Self::Capa | Self::Uidl)
    }

    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.keyword().as_bytes());

        match self {
            Self::User { username } => {
                buf.push(b' ');
                buf.extend_from_slice(username.as_bytes());
            }
            Self::Pass { password } => {
                buf.push(b' ');
                buf.extend_from_slice(password.as_bytes());
            }
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.push(b' ');
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    // RFC 5034: a zero-length initial response is sent as "="
                    if resp.is_empty() {
                        buf.push(b'=');
                    } else {
                        buf.extend_from_slice(resp.as_bytes());
                    }
                }
            }
            Self::Capa | Self::Stat | Self::Uidl | Self::Quit => {}
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

// Keeps secrets out of logs.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User { username } => write!(f, "USER {username}"),
            Self::Pass { .. } => f.write_str("PASS <redacted>"),
            Self::Auth { mechanism, .. } => write!(f, "AUTH {mechanism} <redacted>"),
            other => f.write_str(other.keyword()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::Capa.serialize(), b"CAPA\r\n");
        assert_eq!(Command::Stat.serialize(), b"STAT\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_user_pass() {
        let user = Command::User {
            username: "alice".to_string(),
        };
        assert_eq!(user.serialize(), b"USER alice\r\n");

        let pass = Command::Pass {
            password: "s3cret".to_string(),
        };
        assert_eq!(pass.serialize(), b"PASS s3cret\r\n");
    }

    #[test]
    fn test_auth_with_initial_response() {
        let cmd = Command::Auth {
            mechanism: "PLAIN".to_string(),
            initial_response: Some("AGFsaWNlAHB3".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AGFsaWNlAHB3\r\n");
    }

    #[test]
    fn test_auth_empty_initial_response() {
        let cmd = Command::Auth {
            mechanism: "PLAIN".to_string(),
            initial_response: Some(String::new()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN =\r\n");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let pass = Command::Pass {
            password: "s3cret".to_string(),
        };
        assert_eq!(format!("{pass:?}"), "PASS <redacted>");
    }

    #[test]
    fn test_multiline_commands() {
        assert!(Command::Uidl.is_multiline());
        assert!(Command::Capa.is_multiline());
        assert!(!Command::Stat.is_multiline());
    }
}
