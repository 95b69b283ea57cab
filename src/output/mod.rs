//! Rendering parse results and writing them out

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::DeclutterResult;
use crate::extractor::ParseResult;
use crate::markdown::{MarkdownOptions, to_markdown_document};
use crate::source::Source;

/// How `parse` prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The extracted content HTML
    #[default]
    Html,
    /// The whole result as pretty-printed JSON
    Json,
    /// Markdown with YAML frontmatter
    Markdown,
}

/// Render `result` in `format`
///
/// # Errors
///
/// Fails when JSON serialization or markdown conversion fails.
pub fn render(result: &ParseResult, format: OutputFormat, source: &Source) -> DeclutterResult<String> {
    match format {
        OutputFormat::Html => Ok(result.content.clone()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Markdown => {
            to_markdown_document(result, source, &MarkdownOptions::for_result(result))
        }
    }
}

/// Render a single property as plain text
///
/// Strings are printed verbatim, `null` as an empty string, and everything
/// else as pretty-printed JSON.
///
/// # Errors
///
/// Fails for unknown property names.
pub fn render_property(result: &ParseResult, name: &str) -> DeclutterResult<String> {
    match result.property(name)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(serde_json::to_string_pretty(&other)?),
    }
}

/// Write `text` to `path`, or to stdout followed by a newline
///
/// Parent directories of `path` are created as needed. A file write is
/// confirmed on stderr.
pub async fn write_output(text: &str, path: Option<&Path>) -> DeclutterResult<()> {
    let Some(path) = path else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;

    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(&mut stderr, "Output written to {}", path.display())?;
    stderr.reset()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorKind;
    use std::path::PathBuf;

    fn result() -> ParseResult {
        ParseResult {
            title: "Title".to_string(),
            author: None,
            content: "<p>Body text</p>".to_string(),
            description: Some("Short".to_string()),
            domain: None,
            favicon: None,
            image: None,
            published: None,
            site: None,
            lang: None,
            dir: None,
            word_count: 2,
            parse_time_ms: 1,
            url: None,
            meta_tags: Vec::new(),
            schema_org_data: Vec::new(),
            extractor: ExtractorKind::Fallback,
        }
    }

    fn source() -> Source {
        Source::File(PathBuf::from("/tmp/page.html"))
    }

    #[test]
    fn html_is_the_content() {
        assert_eq!(render(&result(), OutputFormat::Html, &source()).unwrap(), "<p>Body text</p>");
    }

    #[test]
    fn json_uses_camel_case() {
        let json = render(&result(), OutputFormat::Json, &source()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["wordCount"], 2);
        assert_eq!(value["extractor"], "fallback");
    }

    #[test]
    fn markdown_has_frontmatter() {
        let md = render(&result(), OutputFormat::Markdown, &source()).unwrap();
        assert!(md.starts_with("---\n"));
        assert!(md.contains("# Title\n\nBody text"));
    }

    #[test]
    fn properties_render_as_text() {
        let r = result();
        assert_eq!(render_property(&r, "description").unwrap(), "Short");
        assert_eq!(render_property(&r, "author").unwrap(), "");
        assert_eq!(render_property(&r, "wordCount").unwrap(), "2");
        assert_eq!(render_property(&r, "metaTags").unwrap(), "[]");
        assert!(render_property(&r, "nope").is_err());
    }

    #[tokio::test]
    async fn file_output_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.md");
        write_output("hello", Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
