//! URL validation and normalization.

use std::fmt;

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::VerdictError;

/// A normalized URL: trimmed, scheme-defaulted, syntactically valid.
///
/// The stored string is the user's text with an `http://` prefix added when no
/// scheme was given. It is never re-serialized through `url::Url`, so
/// internationalized hostnames keep their original characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlRecord(String);

impl UrlRecord {
    /// Validates and normalizes raw input.
    ///
    /// # Errors
    ///
    /// Returns `VerdictError::InvalidInput` when the input is empty, longer than
    /// `MAX_URL_LENGTH`, not parseable, or uses a scheme other than http/https.
    pub fn parse(raw: &str) -> Result<Self, VerdictError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VerdictError::InvalidInput("Empty URL provided".to_string()));
        }

        let lower = trimmed.to_ascii_lowercase();
        let normalized = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else if let Some((scheme, _)) = lower.split_once("://").filter(|(s, _)| is_scheme(s)) {
            return Err(VerdictError::InvalidInput(format!(
                "Unsupported URL scheme '{scheme}'"
            )));
        } else {
            format!("http://{trimmed}")
        };

        if normalized.len() > MAX_URL_LENGTH {
            return Err(VerdictError::InvalidInput(format!(
                "URL exceeds maximum length ({} > {})",
                normalized.len(),
                MAX_URL_LENGTH
            )));
        }

        let parsed = url::Url::parse(&normalized)
            .map_err(|e| VerdictError::InvalidInput(format!("Invalid URL '{trimmed}': {e}")))?;
        if parsed.host_str().is_none() {
            return Err(VerdictError::InvalidInput(format!(
                "URL '{trimmed}' has no host"
            )));
        }

        Ok(UrlRecord(normalized))
    }

    /// The normalized URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the record, returning the normalized string.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_scheme(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UrlRecord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_http_scheme() {
        let record = UrlRecord::parse("example.com").unwrap();
        assert_eq!(record.as_str(), "http://example.com");
    }

    #[test]
    fn test_preserves_https() {
        let record = UrlRecord::parse("https://example.com/a?b=c").unwrap();
        assert_eq!(record.as_str(), "https://example.com/a?b=c");
    }

    #[test]
    fn test_trims_whitespace() {
        let record = UrlRecord::parse("  https://example.com  ").unwrap();
        assert_eq!(record.as_str(), "https://example.com");
    }

    #[test]
    fn test_empty_is_invalid_input() {
        assert!(matches!(
            UrlRecord::parse("   "),
            Err(VerdictError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_too_long_is_invalid_input() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            UrlRecord::parse(&long),
            Err(VerdictError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_other_scheme_is_invalid_input() {
        assert!(matches!(
            UrlRecord::parse("ftp://example.com/file"),
            Err(VerdictError::InvalidInput(_))
        ));
        assert!(matches!(
            UrlRecord::parse("javascript://alert(1)"),
            Err(VerdictError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_keeps_unicode_host_text() {
        let record = UrlRecord::parse("\u{0430}pple.com").unwrap();
        assert_eq!(record.as_str(), "http://\u{0430}pple.com");
    }

    #[test]
    fn test_uppercase_scheme_is_kept() {
        let record = UrlRecord::parse("HTTPS://example.com").unwrap();
        assert_eq!(record.as_str(), "HTTPS://example.com");
    }
}
