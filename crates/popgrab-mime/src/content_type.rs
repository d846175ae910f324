//! MIME content type and disposition handling.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Creates a text/plain content type, the RFC 2045 default.
    #[must_use]
    pub fn text_plain() -> Self {
        let mut ct = Self::new("text", "plain");
        ct.parameters
            .insert("charset".to_string(), "us-ascii".to_string());
        ct
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the name parameter if present (legacy attachment naming).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        // Parse type/subtype
        let type_str = parts
            .next()
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?
            .trim();

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype: {type_str}")))?;

        let mut content_type = Self::new(
            main_type.trim().to_lowercase(),
            sub_type.trim().to_lowercase(),
        );
        parse_parameters(parts, &mut content_type.parameters);

        Ok(content_type)
    }
}

/// MIME content disposition with parameters.
///
/// Format: `disposition; param1=value1`, like a content type without the
/// slash. The `filename` parameter is what marks a part as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition token (e.g., "attachment", "inline").
    pub disposition: String,
    /// Parameters (e.g., filename=report.pdf).
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }

    /// Parses a content disposition string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(';');
        let disposition = parts
            .next()
            .map(|d| d.trim().to_lowercase())
            .unwrap_or_default();

        let mut parsed = Self {
            disposition,
            parameters: HashMap::new(),
        };
        parse_parameters(parts, &mut parsed.parameters);
        parsed
    }
}

/// Parses `key=value` parameters, lowercasing keys and unquoting values.
fn parse_parameters<'a>(
    parts: impl Iterator<Item = &'a str>,
    parameters: &mut HashMap<String, String>,
) {
    for param in parts {
        let param = param.trim();
        if let Some((key, value)) = param.split_once('=') {
            let key = key.trim().to_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            parameters.insert(key, value);
        }
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
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_quoted_boundary() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.main_type, "multipart");
        assert_eq!(ct.sub_type, "mixed");
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse_name_parameter() {
        let ct = ContentType::parse("application/pdf; name=\"report.pdf\"").unwrap();
        assert_eq!(ct.name(), Some("report.pdf"));
    }

    #[test]
    fn test_content_type_parse_missing_subtype() {
        assert!(ContentType::parse("noslash").is_err());
    }

    #[test]
    fn test_content_type_case_folding() {
        let ct = ContentType::parse("Multipart/Mixed; Boundary=abc").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("abc"));
    }

    #[test]
    fn test_text_plain_default() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("us-ascii"));
    }

    #[test]
    fn test_content_disposition_filename() {
        let cd = ContentDisposition::parse("attachment; filename=\"quarterly report.xlsx\"");
        assert_eq!(cd.disposition, "attachment");
        assert_eq!(cd.filename(), Some("quarterly report.xlsx"));
    }

    #[test]
    fn test_content_disposition_inline_without_filename() {
        let cd = ContentDisposition::parse("inline");
        assert_eq!(cd.disposition, "inline");
        assert!(cd.filename().is_none());
    }
}
