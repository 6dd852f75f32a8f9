//! Anchor element extraction and the interceptable-href check.

use std::sync::LazyLock;

use regex::Regex;

/// Regex pattern for anchor tags carrying an `href` attribute.
/// Captures double-quoted, single-quoted, and unquoted attribute values.
#[allow(clippy::expect_used)]
static ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("anchor regex is valid")
});

/// An anchor element read from a document snapshot.
///
/// The href is carried exactly as written in the document; derivation and
/// sanitization happen later, at activation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The raw `href` attribute value.
    pub href: String,
}

impl Anchor {
    /// Creates an anchor from an href value.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Extracts every anchor with an `href` attribute from an HTML snapshot,
/// in document order. Anchors without an `href` are not anchors for our
/// purposes and are not reported at all.
#[must_use]
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_PATTERN
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))?
                .as_str()
                .trim();
            Some(Anchor::new(href))
        })
        .collect()
}

/// Returns `true` when an href names a fetchable resource the interceptor
/// can take over.
///
/// This is the delegated capability check: it applies to any href at
/// activation time, not only to anchors bound during the scan. Fragment
/// jumps and non-HTTP action schemes stay with the host environment.
#[must_use]
pub fn is_interceptable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    let lower = href.to_ascii_lowercase();
    const EXCLUDED_SCHEMES: [&str; 4] = ["mailto:", "javascript:", "tel:", "data:"];
    !EXCLUDED_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_anchors_multiple_in_order() {
        let anchors = extract_anchors(r#"<a href="/1">1</a><a href="/2">2</a>"#);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href, "/1");
        assert_eq!(anchors[1].href, "/2");
    }

    #[test]
    fn test_extract_anchors_ignores_other_tags_with_href() {
        // <link href=...> is not an anchor
        let anchors = extract_anchors(r#"<link href="/style.css"><a href="/doc.pdf">D</a>"#);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href, "/doc.pdf");
    }

    #[test]
    fn test_extract_anchors_multiline_tag() {
        let html = "<a\n  class=\"download\"\n  href=\"/multi.pdf\"\n>M</a>";
        let anchors = extract_anchors(html);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href, "/multi.pdf");
    }

    #[test]
    fn test_extract_anchors_empty_href_captured() {
        let anchors = extract_anchors(r#"<a href="">E</a>"#);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href, "");
    }

    #[test]
    fn test_is_interceptable_plain_paths() {
        assert!(is_interceptable("/uploads/file.pdf"));
        assert!(is_interceptable("report.csv"));
        assert!(is_interceptable("https://example.com/a.zip"));
    }

    #[test]
    fn test_is_interceptable_rejects_fragment_and_empty() {
        assert!(!is_interceptable(""));
        assert!(!is_interceptable("#top"));
    }

    #[test]
    fn test_is_interceptable_rejects_action_schemes() {
        assert!(!is_interceptable("mailto:someone@example.com"));
        assert!(!is_interceptable("javascript:void(0)"));
        assert!(!is_interceptable("JavaScript:alert(1)"));
        assert!(!is_interceptable("tel:+15551234"));
        assert!(!is_interceptable("data:text/plain,hi"));
    }
}
