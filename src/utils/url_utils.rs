//! URL and path manipulation utilities.
//!
//! Maps page URLs onto the output directory layout used by sitemap crawls and
//! compiles the include/exclude glob patterns.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::error::{DeclutterError, DeclutterResult};

/// Get the output path for a URL, preserving the host and path structure
///
/// `https://example.com/docs/intro` maps to `output_dir/example.com/docs/intro/filename`.
/// The site root maps to `output_dir/example.com/filename`. Query strings are
/// folded into the last path segment so distinct pages never collide.
pub fn get_output_path(url: &Url, output_dir: &Path, filename: &str) -> DeclutterResult<PathBuf> {
    let host = url
        .host_str()
        .ok_or_else(|| DeclutterError::InvalidSource {
            input: url.to_string(),
            reason: "URL has no host".to_string(),
        })?;

    let mut path = output_dir.join(sanitize_segment(host));
    for segment in url.path().split('/').filter(|s| !s.is_empty()) {
        let segment = sanitize_segment(segment);
        // ".." and "." never leave the host directory
        if matches!(
            Path::new(&segment).components().next(),
            Some(Component::ParentDir | Component::CurDir)
        ) {
            continue;
        }
        path.push(segment);
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        path.push(format!("_{}", sanitize_segment(query)));
    }

    Ok(path.join(filename))
}

/// Replace characters that are unsafe in file names
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '&' | '=' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Check if a URL is a crawlable http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Host of `url` without a leading `www.`
#[must_use]
pub fn display_domain(url: &Url) -> Option<String> {
    url.host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Compile a glob pattern into an anchored regex
///
/// `*` matches any sequence; every other character is literal.
pub fn compile_glob_pattern(pattern: &str) -> DeclutterResult<Regex> {
    let regex_pattern = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{regex_pattern}$"))
        .map_err(|e| DeclutterError::Config(format!("Invalid glob pattern '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn output_path_mirrors_host_and_path() {
        let out = Path::new("/out");
        assert_eq!(
            get_output_path(&url("https://example.com/docs/intro"), out, "index.md").unwrap(),
            PathBuf::from("/out/example.com/docs/intro/index.md")
        );
        assert_eq!(
            get_output_path(&url("https://example.com/"), out, "index.md").unwrap(),
            PathBuf::from("/out/example.com/index.md")
        );
    }

    #[test]
    fn output_path_keeps_query_pages_apart() {
        let out = Path::new("/out");
        let a = get_output_path(&url("https://example.com/list?page=1"), out, "index.md").unwrap();
        let b = get_output_path(&url("https://example.com/list?page=2"), out, "index.md").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("/out/example.com/list"));
    }

    #[test]
    fn output_path_stays_inside_output_dir() {
        let out = Path::new("/out");
        let path = get_output_path(&url("https://example.com/a/%2E%2E/%2E%2E/etc"), out, "index.md")
            .unwrap();
        assert!(path.starts_with("/out/example.com"));
    }

    #[test]
    fn valid_urls() {
        assert!(is_valid_url("https://example.com/page"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn domain_drops_www() {
        assert_eq!(
            display_domain(&url("https://www.example.com/x")).as_deref(),
            Some("example.com")
        );
        assert_eq!(
            display_domain(&url("https://blog.example.com/x")).as_deref(),
            Some("blog.example.com")
        );
    }

    #[test]
    fn glob_patterns_are_literal_except_star() {
        let re = compile_glob_pattern("https://example.com/blog/*").unwrap();
        assert!(re.is_match("https://example.com/blog/post-1"));
        assert!(!re.is_match("https://example.com/docs/post-1"));

        let re = compile_glob_pattern("*.pdf").unwrap();
        assert!(re.is_match("https://example.com/file.pdf"));
        assert!(!re.is_match("https://example.com/filexpdf"));
    }
}
