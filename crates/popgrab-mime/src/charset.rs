//! Charset detection and decoding.
//!
//! Mail in the wild declares charsets it does not use, or none at all, so
//! raw protocol lines are decoded by statistical detection rather than
//! trust. Detection runs per line: one message can mix an ASCII header
//! block with a GBK body and a UTF-8 attachment name.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GBK, UTF_8};

/// Detects the character encoding of one raw line.
///
/// Empty input and Latin-family guesses the detector cannot tell apart from
/// double-byte content fall back to GBK, which decodes ASCII transparently
/// and keeps CJK maildrops readable.
#[must_use]
pub fn detect(bytes: &[u8]) -> &'static Encoding {
    if bytes.is_empty() {
        return GBK;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    remap_detected(detector.guess(None, true))
}

/// Remaps detector output that is known to be unreliable on mail content.
fn remap_detected(encoding: &'static Encoding) -> &'static Encoding {
    let name = encoding.name();
    if name == "windows-1255" || name.starts_with("ISO-8859-") {
        GBK
    } else {
        encoding
    }
}

/// Remaps unreliable declared charset labels before lookup.
///
/// `gb2312` is remapped to its modern superset so characters outside the
/// original GB 2312 table still decode.
#[must_use]
pub fn remap_label(label: &str) -> &str {
    if label.eq_ignore_ascii_case("gb2312") {
        "gb18030"
    } else {
        label
    }
}

/// Decodes one raw line by detected encoding.
///
/// Never fails: undecodable byte sequences become replacement characters,
/// because a malformed line must not block the rest of the message.
#[must_use]
pub fn decode_line(bytes: &[u8]) -> String {
    let encoding = detect(bytes);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::trace!(encoding = encoding.name(), "lossy line decode");
    }
    text.into_owned()
}

/// Decodes bytes by a declared charset label.
///
/// Unknown labels fall back to UTF-8. Never fails; undecodable sequences
/// become replacement characters.
#[must_use]
pub fn decode_with_label(bytes: &[u8], label: &str) -> String {
    let encoding = Encoding::for_label(remap_label(label.trim()).as_bytes()).unwrap_or(UTF_8);
    encoding.decode(bytes).0.into_owned()
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
    fn test_detect_empty_falls_back_to_gbk() {
        assert_eq!(detect(b""), GBK);
    }

    #[test]
    fn test_detect_ascii_decodes_transparently() {
        let text = decode_line(b"Subject: plain ascii");
        assert_eq!(text, "Subject: plain ascii");
    }

    #[test]
    fn test_decode_line_utf8() {
        let text = decode_line("收件人: 张三".as_bytes());
        assert_eq!(text, "收件人: 张三");
    }

    #[test]
    fn test_decode_line_gbk() {
        // "附件" encoded as GBK
        let gbk_bytes = [0xB8, 0xBD, 0xBC, 0xFE];
        let text = decode_line(&gbk_bytes);
        assert_eq!(text, "附件");
    }

    #[test]
    fn test_remap_label_gb2312() {
        assert_eq!(remap_label("gb2312"), "gb18030");
        assert_eq!(remap_label("GB2312"), "gb18030");
        assert_eq!(remap_label("utf-8"), "utf-8");
    }

    #[test]
    fn test_remap_detected_latin_aliases() {
        assert_eq!(
            remap_detected(encoding_rs::WINDOWS_1255),
            GBK
        );
        assert_eq!(remap_detected(encoding_rs::ISO_8859_7), GBK);
        assert_eq!(remap_detected(UTF_8), UTF_8);
    }

    #[test]
    fn test_decode_with_label_gb2312_superset() {
        // Bytes valid in GB 18030; the declared gb2312 label is remapped.
        let bytes = [0xB8, 0xBD, 0xBC, 0xFE];
        assert_eq!(decode_with_label(&bytes, "gb2312"), "附件");
    }

    #[test]
    fn test_decode_with_label_unknown_falls_back_to_utf8() {
        assert_eq!(decode_with_label(b"hello", "x-no-such-charset"), "hello");
    }

    #[test]
    fn test_decode_with_label_lossy() {
        // Invalid UTF-8 must not fail, only substitute.
        let text = decode_with_label(&[0xFF, 0xFE, b'a'], "utf-8");
        assert!(text.ends_with('a'));
        assert!(text.contains('\u{FFFD}'));
    }

    proptest! {
        #[test]
        fn decode_line_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode_line(&bytes);
        }
    }
}
