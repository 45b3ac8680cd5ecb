//! POP3 response parser.

use crate::error::{Error, Result};
use crate::types::{MailboxStat, Status, StatusLine, UidlEntry};

/// Parses the status line that starts every POP3 response.
///
/// - `+OK 2 320`
/// - `-ERR invalid password`
///
/// # Errors
///
/// Returns an error if the line carries neither indicator.
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let (status, rest) = if let Some(rest) = line.strip_prefix("+OK") {
        (Status::Ok, rest)
    } else if let Some(rest) = line.strip_prefix("-ERR") {
        (Status::Err, rest)
    } else {
        return Err(Error::Protocol(format!("Unexpected status line: {line}")));
    };

    // The indicator must be followed by a space or end the line.
    if !rest.is_empty() && !rest.starts_with(' ') {
        return Err(Error::Protocol(format!("Unexpected status line: {line}")));
    }

    Ok(StatusLine::new(status, rest.trim()))
}

/// Checks if a line terminates a multi-line response.
#[must_use]
pub fn is_terminator(line: &str) -> bool {
    line == "."
}

/// Removes byte-stuffing from a multi-line body line.
///
/// Lines starting with the termination octet are sent with an extra `.`.
#[must_use]
pub fn unstuff(line: &str) -> &str {
    if line.starts_with("..") {
        &line[1..]
    } else {
        line
    }
}

/// Parses the text of a positive STAT response (`<count> <size>`).
///
/// # Errors
///
/// Returns an error if either number is missing or malformed.
pub fn parse_stat(text: &str) -> Result<MailboxStat> {
    let mut parts = text.split_whitespace();
    let count = parts
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| Error::Protocol(format!("Malformed STAT response: {text}")))?;
    let size = parts
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| Error::Protocol(format!("Malformed STAT response: {text}")))?;

    Ok(MailboxStat { count, size })
}

/// Parses one line of a UIDL listing (`<number> <unique-id>`).
///
/// # Errors
///
/// Returns an error if the line is malformed.
pub fn parse_uidl_line(line: &str) -> Result<UidlEntry> {
    let mut parts = line.split_whitespace();
    let number = parts
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| Error::Protocol(format!("Malformed UIDL line: {line}")))?;
    let unique_id = parts
        .next()
        .ok_or_else(|| Error::Protocol(format!("Malformed UIDL line: {line}")))?;

    Ok(UidlEntry {
        number,
        unique_id: unique_id.to_string(),
    })
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

    #[test]
    fn test_parse_ok_line() {
        let line = parse_status_line("+OK POP3 server ready").unwrap();
        assert!(line.is_ok());
        assert_eq!(line.text, "POP3 server ready");
    }

    #[test]
    fn test_parse_bare_ok() {
        let line = parse_status_line("+OK").unwrap();
        assert!(line.is_ok());
        assert!(line.text.is_empty());
    }

    #[test]
    fn test_parse_err_line() {
        let line = parse_status_line("-ERR [AUTH] invalid password").unwrap();
        assert_eq!(line.status, Status::Err);
        assert_eq!(line.text, "[AUTH] invalid password");
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_status_line("* OK IMAP ready").is_err());
        assert!(parse_status_line("+OKAY").is_err());
        assert!(parse_status_line("").is_err());
    }

    #[test]
    fn test_unstuff() {
        assert_eq!(unstuff("..hidden"), ".hidden");
        assert_eq!(unstuff("plain"), "plain");
        assert!(is_terminator("."));
        assert!(!is_terminator(".."));
    }

    #[test]
    fn test_parse_stat() {
        let stat = parse_stat("2 320").unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.size, 320);
        assert_eq!(stat.to_string(), "2 messages (320 bytes)");
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(parse_stat("").is_err());
        assert!(parse_stat("two 320").is_err());
        assert!(parse_stat("2").is_err());
    }

    #[test]
    fn test_parse_uidl_line() {
        let entry = parse_uidl_line("1 whqtswO00WBw418f9t5JxYwZ").unwrap();
        assert_eq!(entry.number, 1);
        assert_eq!(entry.unique_id, "whqtswO00WBw418f9t5JxYwZ");
        assert!(parse_uidl_line("x abc").is_err());
        assert!(parse_uidl_line("3").is_err());
    }
}
