//! Accepted file type expressions (`image/*`, `.png`, `application/pdf`)

use sf_preview::RawFile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Any,
    TopLevel(String),
    Exact(String),
    Extension(String),
}

/// Parsed accept expression
///
/// Comma-separated, case-insensitive. An empty expression accepts
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AcceptFilter {
    source: String,
    patterns: Vec<Pattern>,
}

impl AcceptFilter {
    /// Parse an accept expression
    #[must_use]
    pub fn parse(expr: &str) -> Self {
        let patterns = expr
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .map(|p| {
                if p == "*" || p == "*/*" {
                    Pattern::Any
                } else if let Some(ext) = p.strip_prefix('.') {
                    Pattern::Extension(ext.to_string())
                } else if let Some(top) = p.strip_suffix("/*") {
                    Pattern::TopLevel(top.to_string())
                } else {
                    Pattern::Exact(p)
                }
            })
            .collect();

        Self {
            source: expr.trim().to_string(),
            patterns,
        }
    }

    /// Filter accepting every file
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::parse("")
    }

    /// Original expression
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `file` matches any pattern
    #[must_use]
    pub fn matches(&self, file: &RawFile) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let mime = file.content_type().trim().to_ascii_lowercase();
        let name = file.name().to_ascii_lowercase();

        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Any => true,
            Pattern::TopLevel(top) => mime
                .split_once('/')
                .is_some_and(|(file_top, _)| file_top == top),
            Pattern::Exact(exact) => mime == *exact,
            Pattern::Extension(ext) => name
                .rsplit_once('.')
                .is_some_and(|(_, file_ext)| file_ext == ext),
        })
    }
}

impl Default for AcceptFilter {
    fn default() -> Self {
        Self::parse("image/*")
    }
}

impl From<String> for AcceptFilter {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AcceptFilter> for String {
    fn from(value: AcceptFilter) -> Self {
        value.source
    }
}

impl std::fmt::Display for AcceptFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str) -> RawFile {
        RawFile::new(name, mime, vec![0u8])
    }

    #[test]
    fn image_wildcard() {
        let filter = AcceptFilter::default();
        assert!(filter.matches(&file("a.png", "image/png")));
        assert!(filter.matches(&file("a.webp", "IMAGE/WEBP")));
        assert!(!filter.matches(&file("a.pdf", "application/pdf")));
    }

    #[test]
    fn extension_and_exact() {
        let filter = AcceptFilter::parse(".PDF, text/plain");
        assert!(filter.matches(&file("spec.pdf", "")));
        assert!(filter.matches(&file("notes", "text/plain")));
        assert!(!filter.matches(&file("a.png", "image/png")));
    }

    #[test]
    fn empty_accepts_all() {
        assert!(AcceptFilter::any().matches(&file("x.bin", "application/octet-stream")));
    }

    #[test]
    fn keeps_source_text() {
        let filter = AcceptFilter::parse(" image/* ");
        assert_eq!(filter.as_str(), "image/*");
        assert_eq!(String::from(filter), "image/*");
    }
}
