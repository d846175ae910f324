//! MIME decoding utilities.
//!
//! Base64 and Quoted-Printable transfer decoding, plus RFC 2047 encoded-word
//! decoding for header values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::charset;
use crate::error::{Error, Result};

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// Payloads are binary, so no character-set interpretation happens here.
///
/// # Errors
///
/// Returns an error if the input contains an invalid or incomplete escape
/// sequence.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut bytes = data.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        if byte != b'=' {
            result.push(byte);
            continue;
        }

        // Soft line break: "=\r\n" or "=\n"
        if bytes.peek() == Some(&b'\r') {
            bytes.next();
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            continue;
        }
        if bytes.peek() == Some(&b'\n') {
            bytes.next();
            continue;
        }

        // Hex encoded byte
        let hi = bytes
            .next()
            .ok_or_else(|| Error::InvalidEncoding("incomplete escape sequence".to_string()))?;
        let lo = bytes
            .next()
            .ok_or_else(|| Error::InvalidEncoding("incomplete escape sequence".to_string()))?;
        let hex = [hi, lo];
        let hex_str = std::str::from_utf8(&hex)
            .map_err(|_| Error::InvalidEncoding("invalid hex digits".to_string()))?;
        let value = u8::from_str_radix(hex_str, 16)
            .map_err(|e| Error::InvalidEncoding(format!("invalid hex: {e}")))?;
        result.push(value);
    }

    Ok(result)
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=` where encoding is `B`
/// (Base64) or `Q` (Quoted-Printable with underscore as space). The declared
/// charset goes through [`charset::remap_label`]. Whitespace between two
/// adjacent encoded words is folded away per RFC 2047 section 6.2.
///
/// Never fails: a word that does not decode is passed through verbatim,
/// since a mangled header must not block the rest of the message.
#[must_use]
pub fn decode_rfc2047(value: &str) -> String {
    let mut result = String::new();
    let mut rest = value;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let prefix = &rest[..start];

        match parse_encoded_word(&rest[start..]) {
            Some((decoded, consumed)) => {
                // Fold whitespace between consecutive encoded words.
                if !(last_was_encoded && prefix.chars().all(char::is_whitespace)) {
                    result.push_str(prefix);
                }
                result.push_str(&decoded);
                rest = &rest[start + consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str(prefix);
                result.push_str("=?");
                rest = &rest[start + 2..];
                last_was_encoded = false;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Parses one encoded word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed, or `None` if
/// the input is not a well-formed encoded word.
fn parse_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;

    let charset_end = inner.find('?')?;
    let label = &inner[..charset_end];

    let after_charset = &inner[charset_end + 1..];
    let encoding_end = after_charset.find('?')?;
    let encoding = &after_charset[..encoding_end];
    if encoding.len() != 1 {
        return None;
    }

    let payload_part = &after_charset[encoding_end + 1..];
    let payload_end = payload_part.find("?=")?;
    let payload = &payload_part[..payload_end];

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(payload).ok()?,
        "Q" => decode_quoted_printable(payload.replace('_', " ").as_bytes()).ok()?,
        _ => return None,
    };

    let decoded = charset::decode_with_label(&bytes, label);
    let consumed = 2 + charset_end + 1 + encoding_end + 1 + payload_end + 2;
    Some((decoded, consumed))
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_decode() {
        let decoded = decode_base64("SGVsbG8sIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64("not base64!!").is_err());
    }

    #[test]
    fn test_quoted_printable_plain() {
        let decoded = decode_quoted_printable(b"Hello, World!").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_escapes() {
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(decoded, "Héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"Hello=\r\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");

        let decoded = decode_quoted_printable(b"Hello=\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_binary_bytes() {
        // QP can carry bytes that are not valid UTF-8.
        let decoded = decode_quoted_printable(b"=FF=00=01").unwrap();
        assert_eq!(decoded, vec![0xFF, 0x00, 0x01]);
    }

    #[test]
    fn test_quoted_printable_incomplete_escape() {
        assert!(decode_quoted_printable(b"bad=4").is_err());
        assert!(decode_quoted_printable(b"bad=").is_err());
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        assert_eq!(decode_rfc2047("Hello"), "Hello");
    }

    #[test]
    fn test_rfc2047_base64_word() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_rfc2047_q_word() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?Q?two_words?="), "two words");
    }

    #[test]
    fn test_rfc2047_gb2312_label_remap() {
        // "附件" as GB 18030 bytes, declared with the legacy gb2312 label.
        assert_eq!(decode_rfc2047("=?gb2312?B?uL28/g==?="), "附件");
    }

    #[test]
    fn test_rfc2047_mixed_plain_and_encoded() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= thread"),
            "Re: Héllo thread"
        );
    }

    #[test]
    fn test_rfc2047_adjacent_words_fold_whitespace() {
        assert_eq!(
            decode_rfc2047("=?utf-8?B?SGVs?= =?utf-8?B?bG8=?="),
            "Hello"
        );
    }

    #[test]
    fn test_rfc2047_malformed_word_passes_through() {
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("=?utf-8?B?broken"), "=?utf-8?B?broken");
    }

    #[test]
    fn test_rfc2047_different_charsets_in_one_value() {
        let value = "=?utf-8?B?SMOpbGxv?= =?gb2312?B?uL28/g==?=";
        assert_eq!(decode_rfc2047(value), "Héllo附件");
    }

    proptest! {
        #[test]
        fn rfc2047_never_panics(value in "\\PC{0,128}") {
            let _ = decode_rfc2047(&value);
        }
    }
}
