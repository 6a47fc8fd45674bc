//! Request path normalization.

use percent_encoding::percent_decode_str;

/// Lexically clean a request path.
///
/// The result is always rooted, has no empty, `.` or `..` segments and no
/// trailing slash (except for `/` itself). `..` at the root is dropped, so a
/// cleaned path can never climb above the site root.
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut cleaned = String::with_capacity(path.len());
    for segment in segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    cleaned
}

/// Percent-decode the path component of a request URI.
///
/// Invalid UTF-8 after decoding leaves the path as received.
pub fn decode(path: &str) -> String {
    percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_string())
}

/// Extension of the last path segment including its dot, or `""`.
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

/// Site path (`/a/b.html`) for a file relative to its scheme directory.
pub fn site_path(relative: &std::path::Path) -> String {
    let mut out = String::new();
    for component in relative.components() {
        if let std::path::Component::Normal(part) = component {
            out.push('/');
            out.push_str(&part.to_string_lossy());
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn clean_collapses_segments() {
        assert_eq!(clean(""), "/");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("/a/b/"), "/a/b");
        assert_eq!(clean("//a///b"), "/a/b");
        assert_eq!(clean("/a/./b"), "/a/b");
        assert_eq!(clean("/a/../b"), "/b");
        assert_eq!(clean("a/b"), "/a/b");
    }

    #[test]
    fn clean_cannot_escape_root() {
        assert_eq!(clean("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean("/a/../../.."), "/");
    }

    #[test]
    fn decode_percent_sequences() {
        assert_eq!(decode("/a%20b.html"), "/a b.html");
        assert_eq!(decode("/plain"), "/plain");
        assert_eq!(decode("/bad%ff"), "/bad%ff");
    }

    #[test]
    fn extension_of_last_segment() {
        assert_eq!(extension("/a/b.css"), ".css");
        assert_eq!(extension("/a.d/b"), "");
        assert_eq!(extension("/archive.tar.gz"), ".gz");
        assert_eq!(extension("/"), "");
    }

    #[test]
    fn site_path_from_relative() {
        assert_eq!(site_path(Path::new("")), "/");
        assert_eq!(site_path(Path::new("css/site.css")), "/css/site.css");
    }
}
