//! MIME message structure and parsing.
//!
//! A parsed message is a tree of [`Part`]s: multipart bodies nest, and
//! attachments may sit at any depth (a forwarded message inside a
//! multipart/mixed is the common case), so traversal is always a full
//! depth-first walk.

use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Maximum multipart nesting depth, to stop pathological messages.
const MAX_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

/// One node of a MIME message tree.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Raw (still transfer-encoded) body bytes. Empty for multipart nodes.
    pub body: Vec<u8>,
    /// Nested parts. Empty for leaf nodes.
    pub children: Vec<Part>,
}

impl Part {
    /// Gets the content type, defaulting to text/plain when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is present but invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the raw (still RFC-2047-encoded) filename, if this part
    /// carries one.
    ///
    /// `Content-Disposition: ...; filename=` wins; the legacy
    /// `Content-Type: ...; name=` parameter is the fallback. Any part with a
    /// filename is treated as an attachment regardless of content type.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        if let Some(value) = self.headers.get("content-disposition") {
            let disposition = ContentDisposition::parse(value);
            if let Some(name) = disposition.filename() {
                return Some(name.to_string());
            }
        }

        if let Ok(ct) = self.content_type()
            && let Some(name) = ct.name()
        {
            return Some(name.to_string());
        }

        None
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                let body_str = String::from_utf8_lossy(&self.body);
                // Remove whitespace for lenient parsing
                let cleaned: String = body_str.chars().filter(|c| !c.is_whitespace()).collect();
                decode_base64(&cleaned)
            }
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }
}

/// A parsed MIME message: a tree of parts rooted at the message itself.
#[derive(Debug, Clone)]
pub struct Message {
    /// The root part; its headers are the message headers.
    pub root: Part,
}

impl Message {
    /// Parses a complete message.
    ///
    /// # Errors
    ///
    /// Returns an error if the multipart structure nests deeper than the
    /// supported limit. Header-level damage never fails the parse.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            root: parse_part(text, 0)?,
        })
    }

    /// Returns the message headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Iterates over every part of the tree, depth-first, root included.
    pub fn walk(&self) -> impl Iterator<Item = &Part> {
        let mut stack = vec![&self.root];
        std::iter::from_fn(move || {
            let part = stack.pop()?;
            for child in part.children.iter().rev() {
                stack.push(child);
            }
            Some(part)
        })
    }
}

/// Parses one part: header block, then either a multipart body split on its
/// boundary or raw leaf content.
fn parse_part(text: &str, depth: usize) -> Result<Part> {
    if depth > MAX_DEPTH {
        return Err(Error::Parse("multipart nesting too deep".to_string()));
    }

    let (header_text, body_text) = split_headers_body(text);
    let headers = Headers::parse(header_text);

    let boundary = headers
        .get("content-type")
        .and_then(|value| ContentType::parse(value).ok())
        .filter(ContentType::is_multipart)
        .and_then(|ct| ct.boundary().map(String::from));

    if let Some(boundary) = boundary {
        let children = split_multipart(body_text, &boundary)
            .iter()
            .map(|section| parse_part(section, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Part {
            headers,
            body: Vec::new(),
            children,
        });
    }

    Ok(Part {
        headers,
        body: body_text.as_bytes().to_vec(),
        children: Vec::new(),
    })
}

/// Splits a message or part into its header block and body at the first
/// blank line.
fn split_headers_body(text: &str) -> (&str, &str) {
    if let Some(idx) = text.find("\r\n\r\n") {
        (&text[..idx + 2], &text[idx + 4..])
    } else if let Some(idx) = text.find("\n\n") {
        (&text[..idx + 1], &text[idx + 2..])
    } else {
        (text, "")
    }
}

/// Splits a multipart body into sections delimited by `--boundary` lines.
///
/// Preamble (before the first delimiter) and epilogue (after the
/// `--boundary--` close) are discarded per RFC 2046. A missing close
/// delimiter is tolerated: whatever was accumulated becomes the last
/// section.
fn split_multipart(body: &str, boundary: &str) -> Vec<String> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut sections = Vec::new();
    let mut current: Option<String> = None;

    for line in body.lines() {
        let trimmed = line.trim_end();
        if trimmed == close {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            break;
        }
        if trimmed == open {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(String::new());
        } else if let Some(section) = current.as_mut() {
            section.push_str(line);
            section.push('\n');
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    sections
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
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("base64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_parse_single_part() {
        let raw = concat!(
            "From: sender@example.com\n",
            "Subject: Test\n",
            "\n",
            "Hello, World!\n"
        );

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.headers().get("From"), Some("sender@example.com"));
        assert!(message.root.children.is_empty());
        assert_eq!(message.root.body, b"Hello, World!\n");
    }

    #[test]
    fn test_parse_multipart() {
        let raw = concat!(
            "From: sender@example.com\n",
            "Content-Type: multipart/mixed; boundary=abc123\n",
            "\n",
            "preamble, discarded\n",
            "--abc123\n",
            "Content-Type: text/plain\n",
            "\n",
            "Body text\n",
            "--abc123\n",
            "Content-Type: application/pdf; name=\"doc.pdf\"\n",
            "Content-Transfer-Encoding: base64\n",
            "\n",
            "SGVsbG8=\n",
            "--abc123--\n",
            "epilogue, discarded\n"
        );

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root.children.len(), 2);

        let attachment = &message.root.children[1];
        assert_eq!(attachment.filename(), Some("doc.pdf".to_string()));
        assert_eq!(attachment.decode_body().unwrap(), b"Hello");
    }

    #[test]
    fn test_parse_nested_multipart() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=outer\n",
            "\n",
            "--outer\n",
            "Content-Type: multipart/alternative; boundary=inner\n",
            "\n",
            "--inner\n",
            "Content-Type: text/plain\n",
            "\n",
            "plain\n",
            "--inner\n",
            "Content-Type: text/html\n",
            "\n",
            "<p>html</p>\n",
            "--inner--\n",
            "--outer\n",
            "Content-Disposition: attachment; filename=\"deep.bin\"\n",
            "\n",
            "payload\n",
            "--outer--\n"
        );

        let message = Message::parse(raw).unwrap();
        let filenames: Vec<String> = message.walk().filter_map(Part::filename).collect();
        assert_eq!(filenames, vec!["deep.bin".to_string()]);

        // Depth-first walk visits every node: root, inner multipart, its two
        // leaves, and the attachment.
        assert_eq!(message.walk().count(), 5);
    }

    #[test]
    fn test_walk_order_is_tree_order() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"first.txt\"\n",
            "\n",
            "1\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"second.txt\"\n",
            "\n",
            "2\n",
            "--b--\n"
        );

        let message = Message::parse(raw).unwrap();
        let filenames: Vec<String> = message.walk().filter_map(Part::filename).collect();
        assert_eq!(filenames, vec!["first.txt", "second.txt"]);
    }

    #[test]
    fn test_missing_close_delimiter_tolerated() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Type: text/plain\n",
            "\n",
            "truncated message\n"
        );

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root.children.len(), 1);
    }

    #[test]
    fn test_filename_from_content_type_name() {
        let raw = concat!(
            "Content-Type: application/octet-stream; name=\"legacy.dat\"\n",
            "\n",
            "data\n"
        );

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root.filename(), Some("legacy.dat".to_string()));
    }

    #[test]
    fn test_quoted_printable_body() {
        let raw = concat!(
            "Content-Type: text/plain\n",
            "Content-Transfer-Encoding: quoted-printable\n",
            "\n",
            "H=C3=A9llo"
        );

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root.decode_body().unwrap(), "Héllo".as_bytes());
    }

    #[test]
    fn test_headers_without_body() {
        let message = Message::parse("Subject: only headers").unwrap();
        assert_eq!(message.headers().get("subject"), Some("only headers"));
        assert!(message.root.body.is_empty());
    }
}
