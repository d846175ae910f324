//! Attachment extraction.
//!
//! Walks a decoded message's part tree and writes every part that carries a
//! filename into a per-sender directory. Any part with a filename counts,
//! whatever its declared content type claims.

use std::fs;
use std::path::{Path, PathBuf};

use popgrab_mime::encoding;

use crate::decode::DecodedMessage;
use crate::error::Result;
use crate::paths::sanitize_component;

/// Directory used when a message has no usable From header.
const UNKNOWN_SENDER: &str = "unknown";

/// What one message's extraction produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// The sender-derived directory attachments were written into.
    pub directory: PathBuf,
    /// Filenames written, in tree-walk order. A write that failed is
    /// absent: extraction is a partial success, not all-or-nothing.
    pub filenames: Vec<String>,
}

/// Extracts every attachment of a decoded message under `base`.
///
/// The target directory is `base/<decoded From header>`, created if absent
/// (idempotent). Filenames are RFC-2047-decoded; payloads are decoded from
/// their transfer encoding and written as binary, overwriting any existing
/// file of the same name; last write wins.
///
/// # Errors
///
/// Returns an error only when the target directory cannot be created. A
/// single attachment that fails to decode or write is logged and skipped.
pub fn extract_attachments(decoded: &DecodedMessage, base: &Path) -> Result<ExtractionResult> {
    let sender = decoded.headers.from.as_deref().unwrap_or(UNKNOWN_SENDER);
    let directory = base.join(sanitize_component(sender));
    fs::create_dir_all(&directory)?;

    let mut filenames = Vec::new();
    for part in decoded.message.walk() {
        let Some(raw_name) = part.filename() else {
            continue;
        };
        let filename = sanitize_component(&encoding::decode_rfc2047(&raw_name));

        let payload = match part.decode_body() {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%filename, %error, "skipping attachment with undecodable payload");
                continue;
            }
        };

        let target = directory.join(&filename);
        match fs::write(&target, &payload) {
            Ok(()) => {
                tracing::debug!(path = %target.display(), bytes = payload.len(), "wrote attachment");
                filenames.push(filename);
            }
            Err(error) => {
                tracing::warn!(path = %target.display(), %error, "failed to write attachment");
            }
        }
    }

    Ok(ExtractionResult {
        directory,
        filenames,
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
    use crate::decode::decode_message;

    fn lines(text: &str) -> Vec<Vec<u8>> {
        text.lines().map(|l| l.as_bytes().to_vec()).collect()
    }

    fn decoded(text: &str) -> DecodedMessage {
        decode_message(&lines(text)).unwrap()
    }

    #[test]
    fn attachment_lands_under_decoded_from() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: Alice <a@x.com>\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"report.txt\"\n",
            "\n",
            "quarterly numbers\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.directory, dir.path().join("Alice <a@x.com>"));
        assert_eq!(result.filenames, vec!["report.txt"]);

        let written = fs::read_to_string(result.directory.join("report.txt")).unwrap();
        assert_eq!(written, "quarterly numbers\n");
    }

    #[test]
    fn base64_payload_is_written_as_binary() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Type: application/octet-stream; name=\"blob.bin\"\n",
            "Content-Transfer-Encoding: base64\n",
            "\n",
            "AAECAwQ=\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        let written = fs::read(result.directory.join("blob.bin")).unwrap();
        assert_eq!(written, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn two_encoded_filenames_in_different_charsets() {
        let dir = tempfile::tempdir().unwrap();
        // One UTF-8 encoded word, one gb2312 (remapped to gb18030).
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"=?utf-8?B?5oql5ZGKLnR4dA==?=\"\n",
            "\n",
            "one\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"=?gb2312?B?uL28/i50eHQ=?=\"\n",
            "\n",
            "two\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.filenames, vec!["报告.txt", "附件.txt"]);
        assert!(result.directory.join("报告.txt").exists());
        assert!(result.directory.join("附件.txt").exists());
    }

    #[test]
    fn nested_parts_are_walked() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=outer\n",
            "\n",
            "--outer\n",
            "Content-Type: multipart/mixed; boundary=inner\n",
            "\n",
            "--inner\n",
            "Content-Disposition: attachment; filename=\"deep.txt\"\n",
            "\n",
            "found me\n",
            "--inner--\n",
            "--outer--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.filenames, vec!["deep.txt"]);
    }

    #[test]
    fn same_name_overwrites_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"dup.txt\"\n",
            "\n",
            "first\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"dup.txt\"\n",
            "\n",
            "second\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.filenames.len(), 2);
        let written = fs::read_to_string(result.directory.join("dup.txt")).unwrap();
        assert_eq!(written, "second\n");
    }

    #[test]
    fn extraction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Disposition: attachment; filename=\"f.txt\"\n",
            "\n",
            "data\n"
        ));

        extract_attachments(&message, dir.path()).unwrap();
        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.filenames, vec!["f.txt"]);
    }

    #[test]
    fn hostile_from_header_stays_inside_base() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: ../../escape <evil@x.com>\n",
            "Content-Disposition: attachment; filename=\"../../../payload\"\n",
            "\n",
            "data\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert!(result.directory.starts_with(dir.path()));
        assert_eq!(result.filenames, vec![".._.._.._payload"]);
        assert!(result.directory.join(".._.._.._payload").exists());
    }

    #[test]
    fn missing_from_uses_unknown_directory() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "Content-Disposition: attachment; filename=\"orphan.txt\"\n",
            "\n",
            "data\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.directory, dir.path().join("unknown"));
    }

    #[test]
    fn undecodable_payload_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"bad.bin\"\n",
            "Content-Transfer-Encoding: base64\n",
            "\n",
            "!!!not base64!!!\n",
            "--b\n",
            "Content-Disposition: attachment; filename=\"good.txt\"\n",
            "\n",
            "fine\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert_eq!(result.filenames, vec!["good.txt"]);
    }

    #[test]
    fn parts_without_filenames_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let message = decoded(concat!(
            "From: a@x.com\n",
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Type: text/plain\n",
            "\n",
            "just the body\n",
            "--b--\n"
        ));

        let result = extract_attachments(&message, dir.path()).unwrap();
        assert!(result.filenames.is_empty());
    }
}
