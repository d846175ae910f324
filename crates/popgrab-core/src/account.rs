//! Account model types.

use serde::{Deserialize, Serialize};

/// Wire protocol for a mailbox account.
///
/// Only POP3 is supported; any other value in a config file fails
/// deserialization, which aborts startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// POP3 over implicit TLS.
    #[default]
    Pop3,
}

impl Protocol {
    /// Get display name for the protocol.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Pop3 => "POP3",
        }
    }
}

/// One mailbox account, as configured.
///
/// The display name lives on the config map key, not here; it names the
/// account's state file and attachment subdirectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Mailbox address, also the login username.
    pub address: String,
    /// Password for authentication.
    pub password: String,
    /// Server hostname.
    pub host: String,
    /// Server port (default: 995 for implicit TLS).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wire protocol.
    #[serde(default)]
    pub protocol: Protocol,
}

const fn default_port() -> u16 {
    popgrab_pop3::DEFAULT_TLS_PORT
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
    fn deserialize_minimal_account() {
        let account: Account = serde_yaml::from_str(
            "address: a@example.com\npassword: pw\nhost: pop.example.com\n",
        )
        .unwrap();
        assert_eq!(account.port, 995);
        assert_eq!(account.protocol, Protocol::Pop3);
    }

    #[test]
    fn deserialize_explicit_protocol() {
        let account: Account = serde_yaml::from_str(
            "address: a@example.com\npassword: pw\nhost: pop.example.com\nprotocol: pop3\n",
        )
        .unwrap();
        assert_eq!(account.protocol, Protocol::Pop3);
    }

    #[test]
    fn unsupported_protocol_is_rejected() {
        let result: std::result::Result<Account, _> = serde_yaml::from_str(
            "address: a@example.com\npassword: pw\nhost: imap.example.com\nprotocol: imap4\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result: std::result::Result<Account, _> =
            serde_yaml::from_str("address: a@example.com\nhost: pop.example.com\n");
        assert!(result.is_err());
    }

    #[test]
    fn protocol_display_name() {
        assert_eq!(Protocol::Pop3.display_name(), "POP3");
    }
}
