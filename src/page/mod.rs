//! Anchor discovery from an HTML document snapshot.
//!
//! The scan is a static, one-time binding: it sees exactly the anchors
//! present in the snapshot it is given. Anchors added to the live document
//! afterwards are not part of the bound set; delegated matching in the
//! interceptor covers those at activation time instead.
//!
//! # Example
//!
//! ```
//! use linksave_core::page::scan_document;
//!
//! let scan = scan_document(r#"<a href="/files/q1.pdf">Q1</a>"#);
//! assert_eq!(scan.len(), 1);
//! assert_eq!(scan.anchors[0].href, "/files/q1.pdf");
//! ```

mod anchor;

pub use anchor::{Anchor, extract_anchors, is_interceptable};

use std::fmt;

use tracing::{debug, info};

/// Result of scanning a document snapshot for anchors.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Anchors bound for interception, in document order.
    pub anchors: Vec<Anchor>,
    /// Hrefs found but not interceptable (fragments, mailto:, etc.).
    pub skipped: Vec<String>,
}

impl ScanResult {
    /// Creates an empty scan result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bound anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if no anchors were bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Returns the number of skipped hrefs.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Iterates over the bound hrefs in document order.
    pub fn hrefs(&self) -> impl Iterator<Item = &str> {
        self.anchors.iter().map(|a| a.href.as_str())
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} anchors ({} skipped)",
            self.anchors.len(),
            self.skipped.len()
        )
    }
}

/// Scans an HTML snapshot and binds every interceptable anchor present.
///
/// Each `<a>` element's `href` attribute is read verbatim. Anchors without
/// an href, or whose href cannot be intercepted (fragment-only, `mailto:`,
/// `javascript:`, `tel:`, `data:`), are recorded as skipped rather than
/// failing the scan. Duplicate hrefs are bound once each, like repeated
/// anchors in a document.
///
/// # Example
///
/// ```
/// use linksave_core::page::scan_document;
///
/// let scan = scan_document(
///     r##"<a href="/uploads/a.pdf">A</a> <a href="#top">Top</a>"##,
/// );
/// assert_eq!(scan.len(), 1);
/// assert_eq!(scan.skipped_count(), 1);
/// ```
#[tracing::instrument(skip(html), fields(html_len = html.len()))]
#[must_use]
pub fn scan_document(html: &str) -> ScanResult {
    let mut result = ScanResult::new();

    if html.trim().is_empty() {
        debug!("empty document provided");
        return result;
    }

    for candidate in extract_anchors(html) {
        if is_interceptable(&candidate.href) {
            debug!(href = %candidate.href, "bound anchor");
            result.anchors.push(candidate);
        } else {
            debug!(href = %candidate.href, "skipped non-interceptable href");
            result.skipped.push(candidate.href);
        }
    }

    info!(
        bound = result.len(),
        skipped = result.skipped_count(),
        "document scan complete"
    );

    result
}
