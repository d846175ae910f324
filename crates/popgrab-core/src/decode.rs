//! Message decoding pipeline.
//!
//! Turns the raw byte lines of one retrieved message into a parsed MIME
//! tree plus the handful of headers this tool cares about, decoded for
//! human consumption.

use popgrab_mime::address::{Mailbox, split_list};
use popgrab_mime::{Message, charset, encoding};

use crate::error::Result;

/// The decoded headers of one message.
///
/// A header absent from the message is `None`, never an error. Malformed
/// values fall back to their raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedHeaders {
    /// Sender, formatted `name <address>` with the display name decoded.
    pub from: Option<String>,
    /// Recipients, one formatted entry per comma-separated address.
    pub to: Option<String>,
    /// Carbon copies, same formatting as `to` applied to Cc's own list.
    pub cc: Option<String>,
    /// Decoded subject text.
    pub subject: Option<String>,
    /// Raw date header, passed through unparsed.
    pub date: Option<String>,
}

/// One fully decoded message: headers plus the parsed part tree.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// Decoded headers.
    pub headers: DecodedHeaders,
    /// The parsed MIME tree, for attachment extraction.
    pub message: Message,
}

/// Decodes one retrieved message from its raw byte lines.
///
/// Each line's charset is detected independently; one message can mix
/// encodings between its header block and body parts.
///
/// # Errors
///
/// Returns an error only for structurally hostile input (multipart nesting
/// past the supported depth). Charset and header damage degrade lossily
/// instead of failing.
pub fn decode_message(raw_lines: &[Vec<u8>]) -> Result<DecodedMessage> {
    let text = raw_lines
        .iter()
        .map(|line| charset::decode_line(line))
        .collect::<Vec<_>>()
        .join("\n");

    let message = Message::parse(&text)?;
    let headers = decode_headers(&message);
    Ok(DecodedMessage { headers, message })
}

fn decode_headers(message: &Message) -> DecodedHeaders {
    let headers = message.headers();
    let non_empty = |name: &str| headers.get(name).filter(|value| !value.trim().is_empty());

    DecodedHeaders {
        from: non_empty("from").map(format_mailbox),
        to: non_empty("to").map(format_address_list),
        cc: non_empty("cc").map(format_address_list),
        subject: non_empty("subject").map(encoding::decode_rfc2047),
        date: non_empty("date").map(ToString::to_string),
    }
}

/// Formats one address entry as `name <address>`, decoding the display name.
fn format_mailbox(entry: &str) -> String {
    let mailbox = Mailbox::parse(entry);
    let name = encoding::decode_rfc2047(&mailbox.display_name);
    Mailbox::format(&name, &mailbox.address)
}

/// Formats an address-list header: each comma-separated entry formatted
/// like a single mailbox, rejoined with commas.
fn format_address_list(value: &str) -> String {
    split_list(value)
        .map(format_mailbox)
        .collect::<Vec<_>>()
        .join(",")
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

    fn lines(text: &str) -> Vec<Vec<u8>> {
        text.lines().map(|l| l.as_bytes().to_vec()).collect()
    }

    #[test]
    fn plain_headers_decode() {
        let decoded = decode_message(&lines(concat!(
            "From: Alice <a@x.com>\n",
            "To: Bob <b@x.com>\n",
            "Subject: hello\n",
            "Date: Mon, 1 Jan 2024 09:00:00 +0000\n",
            "\n",
            "body\n"
        )))
        .unwrap();

        assert_eq!(decoded.headers.from.as_deref(), Some("Alice <a@x.com>"));
        assert_eq!(decoded.headers.to.as_deref(), Some("Bob <b@x.com>"));
        assert_eq!(decoded.headers.subject.as_deref(), Some("hello"));
        assert_eq!(
            decoded.headers.date.as_deref(),
            Some("Mon, 1 Jan 2024 09:00:00 +0000")
        );
        assert!(decoded.headers.cc.is_none());
    }

    #[test]
    fn encoded_from_display_name_is_decoded() {
        let decoded = decode_message(&lines(
            "From: =?utf-8?B?5byg5LiJ?= <zhang@x.cn>\n\nbody\n",
        ))
        .unwrap();
        assert_eq!(decoded.headers.from.as_deref(), Some("张三 <zhang@x.cn>"));
    }

    #[test]
    fn to_list_is_formatted_per_entry() {
        let decoded = decode_message(&lines(
            "To: Alice <a@x.com>, b@x.com, =?utf-8?B?5byg5LiJ?= <z@x.cn>\n\n.\n",
        ))
        .unwrap();
        assert_eq!(
            decoded.headers.to.as_deref(),
            Some("Alice <a@x.com>,<b@x.com>,张三 <z@x.cn>")
        );
    }

    #[test]
    fn cc_uses_its_own_entries() {
        let decoded = decode_message(&lines(concat!(
            "To: Alice <a@x.com>\n",
            "Cc: Carol <c@x.com>, Dave <d@x.com>\n",
            "\n",
            "body\n"
        )))
        .unwrap();
        assert_eq!(
            decoded.headers.cc.as_deref(),
            Some("Carol <c@x.com>,Dave <d@x.com>")
        );
    }

    #[test]
    fn gb2312_subject_decodes_via_superset() {
        let decoded =
            decode_message(&lines("Subject: =?gb2312?B?uL28/g==?=\n\nbody\n")).unwrap();
        assert_eq!(decoded.headers.subject.as_deref(), Some("附件"));
    }

    #[test]
    fn absent_headers_are_none() {
        let decoded = decode_message(&lines("X-Other: ignored\n\nbody\n")).unwrap();
        assert!(decoded.headers.from.is_none());
        assert!(decoded.headers.to.is_none());
        assert!(decoded.headers.cc.is_none());
        assert!(decoded.headers.subject.is_none());
        assert!(decoded.headers.date.is_none());
    }

    #[test]
    fn empty_header_values_are_treated_as_absent() {
        let decoded = decode_message(&lines("Subject:\nFrom:  \n\nbody\n")).unwrap();
        assert!(decoded.headers.subject.is_none());
        assert!(decoded.headers.from.is_none());
    }

    #[test]
    fn gbk_body_lines_decode_lossily_but_never_fail() {
        let mut raw = lines("From: a@x.com\n\n");
        // "附件" as GBK bytes on a body line of its own.
        raw.push(vec![0xB8, 0xBD, 0xBC, 0xFE]);
        let decoded = decode_message(&raw).unwrap();
        assert_eq!(decoded.headers.from.as_deref(), Some("<a@x.com>"));
    }

    #[test]
    fn part_tree_is_available_for_extraction() {
        let decoded = decode_message(&lines(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"f.txt\"\n",
            "\n",
            "data\n",
            "--b--\n"
        )))
        .unwrap();

        let filenames: Vec<String> = decoded
            .message
            .walk()
            .filter_map(popgrab_mime::Part::filename)
            .collect();
        assert_eq!(filenames, vec!["f.txt"]);
    }
}
