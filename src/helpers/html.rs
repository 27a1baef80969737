//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Return `href` if it is safe to place in an anchor, `None` otherwise
///
/// Accepts http, https and mailto links plus relative paths and fragments.
///
/// # Examples
/// ```ignore
/// safe_href("https://example.com") // -> Some("https://example.com")
/// safe_href("javascript:alert(1)") // -> None
/// ```
pub fn safe_href(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        return Some(href);
    }

    // Relative references carry no scheme before the first path separator
    match href.find(':') {
        Some(colon) => {
            let before = &href[..colon];
            if before.contains('/') || before.contains('?') || before.contains('#') {
                Some(href)
            } else {
                None
            }
        }
        None => Some(href),
    }
}
