//! MIME header handling.

use std::collections::HashMap;

/// Collection of email headers.
///
/// Lookup is case-insensitive; a header that repeats keeps every value in
/// arrival order.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///  continuation line
    /// ```
    ///
    /// Lines that are neither a `name: value` pair nor a continuation are
    /// skipped; one mangled header must not lose the rest of the block.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            if line.is_empty() {
                // Empty line signals end of headers, but save current header first
                if let Some(name) = current_name.take() {
                    headers.add(name, current_value.trim().to_string());
                }
                break;
            }

            // Check for continuation line (starts with space or tab)
            if line.starts_with(' ') || line.starts_with('\t') {
                if current_name.is_some() {
                    current_value.push(' ');
                    current_value.push_str(line.trim());
                }
            } else {
                // Save previous header if exists
                if let Some(name) = current_name.take() {
                    headers.add(name, current_value.trim().to_string());
                    current_value.clear();
                }

                // Parse new header
                if let Some((name, value)) = line.split_once(':') {
                    current_name = Some(name.trim().to_string());
                    current_value = value.trim().to_string();
                }
            }
        }

        // Save last header if we didn't hit an empty line
        if let Some(name) = current_name {
            headers.add(name, current_value.trim().to_string());
        }

        headers
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
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_headers_parse_lf_only() {
        let headers = Headers::parse("Subject: hi\nDate: Mon, 1 Jan 2024 00:00:00 +0000\n");
        assert_eq!(headers.get("subject"), Some("hi"));
        assert!(headers.get("date").is_some());
    }

    #[test]
    fn test_headers_parse_skips_mangled_lines() {
        let headers = Headers::parse("garbage without a colon\nSubject: still here\n");
        assert_eq!(headers.get("Subject"), Some("still here"));
    }

    #[test]
    fn test_headers_parse_stops_at_blank_line() {
        let headers = Headers::parse("Subject: hi\n\nNot-A-Header: body text\n");
        assert_eq!(headers.get("Subject"), Some("hi"));
        assert!(headers.get("Not-A-Header").is_none());
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        let mut count = 0;
        for (name, value) in headers.iter() {
            assert!(!name.is_empty());
            assert!(!value.is_empty());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
