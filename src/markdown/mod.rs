//! HTML to markdown conversion and markdown documents
//!
//! Pipeline:
//! 1. htmd conversion with the custom element handlers in [`handlers`]
//! 2. relative link and image targets resolved against the base URL
//! 3. whitespace normalization
//!
//! A markdown *document* is the converted body preceded by YAML frontmatter
//! and a level-1 title heading.

pub mod frontmatter;
pub mod handlers;
pub mod postprocess;

pub use frontmatter::Frontmatter;
pub use postprocess::{normalize_whitespace, resolve_relative_links};

use url::Url;

use crate::error::{DeclutterError, DeclutterResult};
use crate::extractor::ParseResult;
use crate::source::Source;

/// Options for HTML to markdown conversion
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Base URL for resolving relative links (default: None)
    pub base_url: Option<Url>,

    /// Normalize whitespace and blank lines (default: true)
    pub normalize_whitespace: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            normalize_whitespace: true,
        }
    }
}

impl MarkdownOptions {
    /// Options resolving links against the page URL of `result`
    #[must_use]
    pub fn for_result(result: &ParseResult) -> Self {
        Self {
            base_url: result.url.as_deref().and_then(|u| Url::parse(u).ok()),
            ..Self::default()
        }
    }
}

/// Convert an HTML fragment or document to markdown
///
/// # Errors
///
/// Returns [`DeclutterError::Markdown`] when htmd cannot convert the input.
pub fn convert_html_to_markdown(html: &str, options: &MarkdownOptions) -> DeclutterResult<String> {
    let converter = handlers::create_converter();
    let markdown = converter
        .convert(html)
        .map_err(|e| DeclutterError::Markdown(e.to_string()))?;

    let markdown = match &options.base_url {
        Some(base) => resolve_relative_links(&markdown, base),
        None => markdown,
    };

    if options.normalize_whitespace {
        Ok(normalize_whitespace(&markdown))
    } else {
        Ok(markdown.trim().to_string())
    }
}

/// Frontmatter, a `# title` heading, and the converted content
///
/// The heading is left out when the title is empty or the body already
/// opens with a level-1 heading.
pub fn to_markdown_document(
    result: &ParseResult,
    source: &Source,
    options: &MarkdownOptions,
) -> DeclutterResult<String> {
    let body = convert_html_to_markdown(&result.content, options)?;
    let mut document = Frontmatter::from_result(result, source).render();
    document.push('\n');

    let title = result.title.trim();
    if !title.is_empty() && !starts_with_h1(&body) {
        document.push_str("# ");
        document.push_str(title);
        document.push_str("\n\n");
    }

    document.push_str(&body);
    document.push('\n');
    Ok(document)
}

fn starts_with_h1(markdown: &str) -> bool {
    markdown
        .lines()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| l.trim_start().starts_with("# ") || l.trim() == "#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorKind;

    fn result(title: &str, content: &str) -> ParseResult {
        ParseResult {
            title: title.to_string(),
            author: Some("Ada".to_string()),
            content: content.to_string(),
            description: None,
            domain: Some("example.com".to_string()),
            favicon: None,
            image: None,
            published: None,
            site: None,
            lang: None,
            dir: None,
            word_count: 2,
            parse_time_ms: 0,
            url: Some("https://example.com/blog/post".to_string()),
            meta_tags: Vec::new(),
            schema_org_data: Vec::new(),
            extractor: ExtractorKind::Readability,
        }
    }

    #[test]
    fn converts_with_link_resolution() {
        let options = MarkdownOptions {
            base_url: Some(Url::parse("https://example.com/blog/post").unwrap()),
            ..MarkdownOptions::default()
        };
        let md = convert_html_to_markdown(
            r#"<h2>Part</h2><p>See <a href="other">the other post</a>.</p>"#,
            &options,
        )
        .unwrap();
        assert_eq!(md, "## Part\n\nSee [the other post](https://example.com/blog/other).");
    }

    #[test]
    fn links_in_code_with_nested_fences_are_not_resolved() {
        let options = MarkdownOptions {
            base_url: Some(Url::parse("https://example.com/docs/").unwrap()),
            ..MarkdownOptions::default()
        };
        let md = convert_html_to_markdown(
            "<pre><code>```\n[guide](intro.md)\n```</code></pre>",
            &options,
        )
        .unwrap();
        assert!(md.contains("[guide](intro.md)"), "got: {md}");
        assert!(md.starts_with("````"), "got: {md}");
    }

    #[test]
    fn document_gets_frontmatter_and_title() {
        let r = result("Hello", "<p>Some text</p>");
        let source = Source::Url(Url::parse("https://example.com/blog/post").unwrap());
        let doc = to_markdown_document(&r, &source, &MarkdownOptions::for_result(&r)).unwrap();

        assert!(doc.starts_with("---\ntitle: \"Hello\"\nauthor: \"Ada\"\n"));
        assert!(doc.contains("---\n\n# Hello\n\nSome text\n"));
        assert!(doc.ends_with("Some text\n"));
    }

    #[test]
    fn existing_h1_is_not_repeated() {
        let r = result("Hello", "<h1>Hello</h1><p>Some text</p>");
        let source = Source::Url(Url::parse("https://example.com/").unwrap());
        let doc = to_markdown_document(&r, &source, &MarkdownOptions::default()).unwrap();
        assert_eq!(doc.matches("# Hello").count(), 1);
    }
}
