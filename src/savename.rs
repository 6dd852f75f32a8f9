//! Filename derivation from link targets, and the saved-name policy.
//!
//! The filename a link suggests is its last `/`-separated segment, taken
//! verbatim. That raw segment is what gets appended to the fetch endpoint
//! prefix, so the request shape is exactly what the link implies. The
//! *saved* name goes through an explicit policy instead of being trusted:
//! percent-decoded, stripped of filesystem-invalid characters, and rejected
//! outright when nothing usable remains.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from filename derivation.
#[derive(Debug, Error)]
pub enum NameError {
    /// The href has no final path segment (e.g. it ends with `/`).
    #[error("no filename segment in href: {href}")]
    EmptySegment {
        /// The href that produced no segment.
        href: String,
    },

    /// The derived segment sanitizes down to nothing usable.
    #[error("derived filename is unusable: {segment}")]
    Unusable {
        /// The raw segment that was rejected.
        segment: String,
    },
}

/// Returns the last `/`-separated segment of a link target.
///
/// This is the exact derivation the fetch endpoint expects: split on the
/// path separator and take the final piece. A target with no `/` at all is
/// its own segment.
///
/// # Errors
///
/// Returns [`NameError::EmptySegment`] when the final segment is empty
/// (href ends with `/` or is empty).
///
/// # Example
///
/// ```
/// use linksave_core::savename::last_segment;
///
/// assert_eq!(last_segment("/files/reports/q1.pdf").unwrap(), "q1.pdf");
/// assert_eq!(last_segment("report.csv").unwrap(), "report.csv");
/// ```
pub fn last_segment(href: &str) -> Result<&str, NameError> {
    let segment = href.rsplit('/').next().unwrap_or(href);
    if segment.is_empty() {
        return Err(NameError::EmptySegment {
            href: href.to_string(),
        });
    }
    Ok(segment)
}

/// Applies the saved-name policy to a raw href segment.
///
/// Policy:
/// 1. Percent-decode the segment (links routinely encode spaces etc.);
///    segments that do not decode to valid UTF-8 are kept raw.
/// 2. Replace filesystem-invalid and control characters with `_`.
/// 3. Reject segments that reduce to nothing but separators or dots;
///    `.` and `..` would otherwise resolve outside the save directory.
///
/// # Errors
///
/// Returns [`NameError::Unusable`] when the sanitized result carries no
/// usable characters.
pub fn sanitize_save_name(segment: &str) -> Result<String, NameError> {
    let decoded = urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string());

    let sanitized: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized
        .trim_matches(|c| c == '_' || c == '.' || c == ' ')
        .is_empty()
    {
        return Err(NameError::Unusable {
            segment: segment.to_string(),
        });
    }

    Ok(sanitized)
}

/// Resolves a unique file path under `dir`, adding a numeric suffix if the
/// name is already taken: `file.pdf`, `file_1.pdf`, `file_2.pdf`, ...
///
/// Callers pass names that already went through [`sanitize_save_name`], so
/// the name cannot contain path separators.
#[must_use]
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let base_path = dir.join(filename);

    if !base_path.exists() {
        return base_path;
    }

    // Split filename into stem and extension
    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };

    for i in 1..1000 {
        let new_name = format!("{stem}_{i}{ext}");
        let new_path = dir.join(new_name);
        if !new_path.exists() {
            return new_path;
        }
    }

    // Fallback (extremely unlikely)
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // --- last_segment ---

    #[test]
    fn test_last_segment_multi_segment_path() {
        assert_eq!(last_segment("/files/reports/q1.pdf").unwrap(), "q1.pdf");
    }

    #[test]
    fn test_last_segment_no_slash_uses_whole_href() {
        assert_eq!(last_segment("report.csv").unwrap(), "report.csv");
    }

    #[test]
    fn test_last_segment_absolute_url() {
        assert_eq!(
            last_segment("https://example.com/uploads/paper.pdf").unwrap(),
            "paper.pdf"
        );
    }

    #[test]
    fn test_last_segment_trailing_slash_is_error() {
        let result = last_segment("/uploads/");
        assert!(matches!(result, Err(NameError::EmptySegment { .. })));
    }

    #[test]
    fn test_last_segment_empty_href_is_error() {
        let result = last_segment("");
        assert!(matches!(result, Err(NameError::EmptySegment { .. })));
    }

    #[test]
    fn test_last_segment_error_display_includes_href() {
        let err = last_segment("/uploads/").unwrap_err();
        assert!(err.to_string().contains("/uploads/"));
    }

    // --- sanitize_save_name ---

    #[test]
    fn test_sanitize_save_name_plain_name_unchanged() {
        assert_eq!(sanitize_save_name("q1.pdf").unwrap(), "q1.pdf");
        assert_eq!(sanitize_save_name("report.csv").unwrap(), "report.csv");
    }

    #[test]
    fn test_sanitize_save_name_percent_decodes() {
        assert_eq!(
            sanitize_save_name("annual%20report.pdf").unwrap(),
            "annual report.pdf"
        );
    }

    #[test]
    fn test_sanitize_save_name_replaces_invalid_chars() {
        assert_eq!(sanitize_save_name("a:b*c.pdf").unwrap(), "a_b_c.pdf");
        assert_eq!(sanitize_save_name("file<1>.txt").unwrap(), "file_1_.txt");
    }

    #[test]
    fn test_sanitize_save_name_decoded_separator_neutralized() {
        // %2F decodes to '/', which must not survive into the saved name
        let name = sanitize_save_name("..%2F..%2Fetc%2Fpasswd").unwrap();
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_sanitize_save_name_dot_segments_rejected() {
        assert!(matches!(
            sanitize_save_name("."),
            Err(NameError::Unusable { .. })
        ));
        assert!(matches!(
            sanitize_save_name(".."),
            Err(NameError::Unusable { .. })
        ));
    }

    #[test]
    fn test_sanitize_save_name_only_invalid_chars_rejected() {
        assert!(matches!(
            sanitize_save_name("???"),
            Err(NameError::Unusable { .. })
        ));
    }

    #[test]
    fn test_sanitize_save_name_preserves_unicode() {
        assert_eq!(sanitize_save_name("日本語.pdf").unwrap(), "日本語.pdf");
    }

    // --- resolve_unique_path ---

    #[test]
    fn test_resolve_unique_path_no_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let path = resolve_unique_path(temp_dir.path(), "test.pdf");
        assert_eq!(path, temp_dir.path().join("test.pdf"));
    }

    #[test]
    fn test_resolve_unique_path_with_conflict() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("test.pdf"), b"existing").unwrap();

        let path = resolve_unique_path(temp_dir.path(), "test.pdf");
        assert_eq!(path, temp_dir.path().join("test_1.pdf"));
    }

    #[test]
    fn test_resolve_unique_path_multiple_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("test.pdf"), b"1").unwrap();
        std::fs::write(temp_dir.path().join("test_1.pdf"), b"2").unwrap();
        std::fs::write(temp_dir.path().join("test_2.pdf"), b"3").unwrap();

        let path = resolve_unique_path(temp_dir.path(), "test.pdf");
        assert_eq!(path, temp_dir.path().join("test_3.pdf"));
    }

    #[test]
    fn test_resolve_unique_path_no_extension() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("README"), b"1").unwrap();

        let path = resolve_unique_path(temp_dir.path(), "README");
        assert_eq!(path, temp_dir.path().join("README_1"));
    }

    #[test]
    fn test_resolve_unique_path_hidden_file_suffix_after_name() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".env"), b"1").unwrap();

        // A leading dot is a hidden-file marker, not an extension separator
        let path = resolve_unique_path(temp_dir.path(), ".env");
        assert_eq!(path, temp_dir.path().join(".env_1"));
    }
}
