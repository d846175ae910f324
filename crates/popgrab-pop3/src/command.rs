//! POP3 command serialization.
//!
//! POP3 commands are single CRLF-terminated lines; unlike IMAP there are no
//! tags, so commands and responses correlate purely by order.

use crate::types::MessageNumber;

/// A POP3 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// USER: supply the mailbox name.
    User(String),
    /// PASS: supply the password.
    Pass(String),
    /// STAT: message count and total octets.
    Stat,
    /// LIST: per-message sizes (multi-line response).
    List,
    /// UIDL: per-message unique ids (multi-line response).
    Uidl,
    /// RETR: retrieve one message (multi-line response).
    Retr(MessageNumber),
    /// QUIT: end the session.
    Quit,
}

impl Command {
    /// Serializes the command to its wire form, including the CRLF terminator.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::User(name) => {
                buf.extend_from_slice(b"USER ");
                buf.extend_from_slice(name.as_bytes());
            }
            Self::Pass(password) => {
                buf.extend_from_slice(b"PASS ");
                buf.extend_from_slice(password.as_bytes());
            }
            Self::Stat => buf.extend_from_slice(b"STAT"),
            Self::List => buf.extend_from_slice(b"LIST"),
            Self::Uidl => buf.extend_from_slice(b"UIDL"),
            Self::Retr(number) => {
                buf.extend_from_slice(b"RETR ");
                buf.extend_from_slice(number.get().to_string().as_bytes());
            }
            Self::Quit => buf.extend_from_slice(b"QUIT"),
        }
        buf.extend_from_slice(b"\r\n");
        buf
    }
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
    fn test_user_serialization() {
        let cmd = Command::User("alice@example.com".to_string());
        assert_eq!(cmd.serialize(), b"USER alice@example.com\r\n");
    }

    #[test]
    fn test_pass_serialization() {
        let cmd = Command::Pass("s3cret".to_string());
        assert_eq!(cmd.serialize(), b"PASS s3cret\r\n");
    }

    #[test]
    fn test_argless_commands() {
        assert_eq!(Command::Stat.serialize(), b"STAT\r\n");
        assert_eq!(Command::List.serialize(), b"LIST\r\n");
        assert_eq!(Command::Uidl.serialize(), b"UIDL\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_retr_serialization() {
        let cmd = Command::Retr(MessageNumber::new(17).unwrap());
        assert_eq!(cmd.serialize(), b"RETR 17\r\n");
    }
}
