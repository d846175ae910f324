//! Mail address parsing and formatting.
//!
//! Just enough RFC 5322 to split `"Display Name" <user@host>` into its two
//! halves and put them back together. Display names are returned raw; they
//! are frequently RFC-2047-encoded and the caller decides when to decode.

/// A parsed mailbox: optional display name plus the address proper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name as it appeared, quotes stripped, possibly still
    /// RFC-2047-encoded. Empty when the entry was a bare address.
    pub display_name: String,
    /// The address itself.
    pub address: String,
}

impl Mailbox {
    /// Parses one address-list entry.
    ///
    /// Handles `Name <addr>`, `"Name" <addr>`, `<addr>`, and bare `addr`.
    /// Never fails: an entry with no angle brackets is treated as a bare
    /// address.
    #[must_use]
    pub fn parse(entry: &str) -> Self {
        let entry = entry.trim();

        if let Some(open) = entry.find('<')
            && let Some(close) = entry.rfind('>')
            && open < close
        {
            let display_name = entry[..open].trim().trim_matches('"').trim().to_string();
            let address = entry[open + 1..close].trim().to_string();
            return Self {
                display_name,
                address,
            };
        }

        Self {
            display_name: String::new(),
            address: entry.to_string(),
        }
    }

    /// Formats as `name <address>` with an already-decoded display name.
    ///
    /// A missing display name yields `<address>` alone.
    #[must_use]
    pub fn format(display_name: &str, address: &str) -> String {
        if display_name.is_empty() {
            format!("<{address}>")
        } else {
            format!("{display_name} <{address}>")
        }
    }
}

/// Splits an address-list header value on commas.
///
/// The split is literal: a quoted display name containing a comma splits
/// too, matching how upstream senders that produce such headers already
/// mangle them in transit.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').filter(|entry| !entry.trim().is_empty())
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
    fn test_parse_name_and_address() {
        let mailbox = Mailbox::parse("Alice <a@x.com>");
        assert_eq!(mailbox.display_name, "Alice");
        assert_eq!(mailbox.address, "a@x.com");
    }

    #[test]
    fn test_parse_quoted_name() {
        let mailbox = Mailbox::parse("\"Alice Liddell\" <a@x.com>");
        assert_eq!(mailbox.display_name, "Alice Liddell");
        assert_eq!(mailbox.address, "a@x.com");
    }

    #[test]
    fn test_parse_bare_address() {
        let mailbox = Mailbox::parse("bob@example.com");
        assert!(mailbox.display_name.is_empty());
        assert_eq!(mailbox.address, "bob@example.com");
    }

    #[test]
    fn test_parse_angle_only() {
        let mailbox = Mailbox::parse("<carol@example.com>");
        assert!(mailbox.display_name.is_empty());
        assert_eq!(mailbox.address, "carol@example.com");
    }

    #[test]
    fn test_parse_encoded_display_name_kept_raw() {
        let mailbox = Mailbox::parse("=?utf-8?B?5byg5LiJ?= <z@x.cn>");
        assert_eq!(mailbox.display_name, "=?utf-8?B?5byg5LiJ?=");
        assert_eq!(mailbox.address, "z@x.cn");
    }

    #[test]
    fn test_format() {
        assert_eq!(Mailbox::format("Alice", "a@x.com"), "Alice <a@x.com>");
        assert_eq!(Mailbox::format("", "a@x.com"), "<a@x.com>");
    }

    #[test]
    fn test_split_list() {
        let entries: Vec<&str> = split_list("a@x.com, Bob <b@x.com>,c@x.com").collect();
        assert_eq!(entries, vec!["a@x.com", " Bob <b@x.com>", "c@x.com"]);
    }

    #[test]
    fn test_split_list_skips_empty_entries() {
        let entries: Vec<&str> = split_list("a@x.com,,").collect();
        assert_eq!(entries, vec!["a@x.com"]);
    }
}
