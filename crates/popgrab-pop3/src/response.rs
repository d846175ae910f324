//! Sans-I/O POP3 response parsing.
//!
//! Parsing is separated from network I/O: the framed layer produces complete
//! lines, and the functions here interpret them.

use crate::types::{ListingEntry, MailboxStat, MessageNumber, UniqueId};
use crate::{Error, Result};

/// Status indicator of a POP3 response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// `+OK`, with the human-readable text that followed it.
    Ok(String),
    /// `-ERR`, with the human-readable text that followed it.
    Err(String),
}

/// Parses a status line (`+OK ...` or `-ERR ...`).
///
/// # Errors
///
/// Returns `Error::Protocol` if the line carries neither indicator.
pub fn parse_status(line: &[u8]) -> Result<Status> {
    let text = String::from_utf8_lossy(line);
    if let Some(rest) = text.strip_prefix("+OK") {
        Ok(Status::Ok(rest.trim().to_string()))
    } else if let Some(rest) = text.strip_prefix("-ERR") {
        Ok(Status::Err(rest.trim().to_string()))
    } else {
        Err(Error::Protocol(format!("malformed status line: {text}")))
    }
}

/// Parses the payload of a `+OK` STAT response: `<count> <octets>`.
///
/// # Errors
///
/// Returns `Error::Protocol` if either field is missing or non-numeric.
pub fn parse_stat(text: &str) -> Result<MailboxStat> {
    let mut fields = text.split_whitespace();
    let count = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .ok_or_else(|| Error::Protocol(format!("malformed STAT response: {text}")))?;
    let octets = fields
        .next()
        .and_then(|f| f.parse::<u64>().ok())
        .ok_or_else(|| Error::Protocol(format!("malformed STAT response: {text}")))?;
    Ok(MailboxStat { count, octets })
}

/// Parses one line of a UIDL listing: `<number> <unique-id>`.
///
/// # Errors
///
/// Returns `Error::Protocol` if the message number is missing, zero, or the
/// unique id is absent.
pub fn parse_uidl_entry(line: &[u8]) -> Result<ListingEntry> {
    let text = String::from_utf8_lossy(line);
    let mut fields = text.split_whitespace();
    let number = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .and_then(MessageNumber::new)
        .ok_or_else(|| Error::Protocol(format!("malformed UIDL entry: {text}")))?;
    let uid = fields
        .next()
        .map(UniqueId::new)
        .ok_or_else(|| Error::Protocol(format!("malformed UIDL entry: {text}")))?;
    Ok(ListingEntry { number, uid })
}

/// Parses one line of a LIST listing: `<number> <octets>`.
///
/// # Errors
///
/// Returns `Error::Protocol` if either field is missing or malformed.
pub fn parse_list_entry(line: &[u8]) -> Result<(MessageNumber, u64)> {
    let text = String::from_utf8_lossy(line);
    let mut fields = text.split_whitespace();
    let number = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .and_then(MessageNumber::new)
        .ok_or_else(|| Error::Protocol(format!("malformed LIST entry: {text}")))?;
    let octets = fields
        .next()
        .and_then(|f| f.parse::<u64>().ok())
        .ok_or_else(|| Error::Protocol(format!("malformed LIST entry: {text}")))?;
    Ok((number, octets))
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
    fn test_parse_status_ok() {
        let status = parse_status(b"+OK 2 messages (320 octets)").unwrap();
        assert_eq!(status, Status::Ok("2 messages (320 octets)".to_string()));
    }

    #[test]
    fn test_parse_status_ok_no_text() {
        let status = parse_status(b"+OK").unwrap();
        assert_eq!(status, Status::Ok(String::new()));
    }

    #[test]
    fn test_parse_status_err() {
        let status = parse_status(b"-ERR invalid password").unwrap();
        assert_eq!(status, Status::Err("invalid password".to_string()));
    }

    #[test]
    fn test_parse_status_garbage() {
        assert!(parse_status(b"HELLO").is_err());
    }

    #[test]
    fn test_parse_stat() {
        let stat = parse_stat("2 320").unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.octets, 320);
    }

    #[test]
    fn test_parse_stat_with_trailing_text() {
        // Some servers append commentary; only the first two fields matter.
        let stat = parse_stat("5 10240 (from maildrop)").unwrap();
        assert_eq!(stat.count, 5);
        assert_eq!(stat.octets, 10240);
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(parse_stat("").is_err());
        assert!(parse_stat("x y").is_err());
        assert!(parse_stat("3").is_err());
    }

    #[test]
    fn test_parse_uidl_entry() {
        let entry = parse_uidl_entry(b"1 whqtswO00WBw418f9t5JxYwZ").unwrap();
        assert_eq!(entry.number.get(), 1);
        assert_eq!(entry.uid.as_str(), "whqtswO00WBw418f9t5JxYwZ");
    }

    #[test]
    fn test_parse_uidl_entry_rejects_zero_number() {
        assert!(parse_uidl_entry(b"0 abc").is_err());
    }

    #[test]
    fn test_parse_uidl_entry_missing_uid() {
        assert!(parse_uidl_entry(b"1").is_err());
    }

    #[test]
    fn test_parse_list_entry() {
        let (number, octets) = parse_list_entry(b"2 16024").unwrap();
        assert_eq!(number.get(), 2);
        assert_eq!(octets, 16024);
    }

    #[test]
    fn test_parse_list_entry_malformed() {
        assert!(parse_list_entry(b"2 big").is_err());
    }
}
