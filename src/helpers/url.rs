//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encode a single URL path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Path of a post's detail page
///
/// # Examples
/// ```ignore
/// post_path("my-first-post") // -> "/post/my-first-post"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/post/{}", encode_segment(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("hello-world"), "/post/hello-world");
        assert_eq!(post_path("a b/c"), "/post/a%20b%2Fc");
    }
}
