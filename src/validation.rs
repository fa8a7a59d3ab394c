//! Generated Content Validation
//!
//! Shape check applied to provider output before it is accepted: the content
//! must be long enough to plausibly be a complete page and must carry an HTML
//! root marker. No schema validation beyond this.

/// Minimum accepted content length. Tunable compatibility constant, not a
/// semantic guarantee.
pub const MIN_CONTENT_LENGTH: usize = 100;

/// Case-sensitive markers identifying an HTML document root.
const HTML_MARKERS: &[&str] = &["<!DOCTYPE", "<html"];

/// Judge whether generated content looks like a complete HTML document.
pub fn is_valid_html(content: &str) -> bool {
    content.len() > MIN_CONTENT_LENGTH && HTML_MARKERS.iter().any(|m| content.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(prefix: &str, total_len: usize) -> String {
        let mut s = prefix.to_string();
        while s.len() < total_len {
            s.push('x');
        }
        s
    }

    #[test]
    fn test_accepts_length_101_with_root_marker() {
        let content = padded("<html>", 101);
        assert_eq!(content.len(), 101);
        assert!(is_valid_html(&content));
    }

    #[test]
    fn test_rejects_length_99_regardless_of_markers() {
        let content = padded("<!DOCTYPE html><html>", 99);
        assert_eq!(content.len(), 99);
        assert!(!is_valid_html(&content));
    }

    #[test]
    fn test_rejects_length_150_without_markers() {
        let content = padded("plain text response ", 150);
        assert_eq!(content.len(), 150);
        assert!(!is_valid_html(&content));
    }

    #[test]
    fn test_rejects_exactly_minimum_length() {
        let content = padded("<html>", MIN_CONTENT_LENGTH);
        assert!(!is_valid_html(&content));
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let content = padded("<HTML><!doctype html>", 150);
        assert!(!is_valid_html(&content));
    }

    #[test]
    fn test_accepts_doctype_marker() {
        let content = padded("<!DOCTYPE html>", 150);
        assert!(is_valid_html(&content));
    }
}
