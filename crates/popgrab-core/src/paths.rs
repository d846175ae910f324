//! Filesystem path hygiene.

/// Makes an untrusted string safe to use as a single path component.
///
/// Header-derived names (the decoded From header, attachment filenames)
/// feed directly into paths; separators and traversal tokens are replaced
/// so a crafted message cannot write outside its directory.
#[must_use]
pub(crate) fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
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
    fn ordinary_names_pass_through() {
        assert_eq!(sanitize_component("Alice <a@x.com>"), "Alice <a@x.com>");
        assert_eq!(sanitize_component("report.pdf"), "report.pdf");
    }

    #[test]
    fn separators_are_replaced() {
        assert_eq!(sanitize_component("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_component("a\\b"), "a_b");
    }

    #[test]
    fn traversal_tokens_are_neutralized() {
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("."), "_");
        assert_eq!(sanitize_component(""), "_");
    }
}
