//! YAML frontmatter for markdown documents

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

use crate::extractor::ParseResult;
use crate::source::Source;

/// Metadata block written above the markdown body
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub author: Option<String>,
    pub source: String,
    pub domain: Option<String>,
    pub site: Option<String>,
    pub published: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub word_count: usize,
    pub extracted: DateTime<Utc>,
}

impl Frontmatter {
    /// Collect frontmatter fields from a parse result, stamped with the current time
    ///
    /// `source` is the page URL when known, otherwise the input the page
    /// was loaded from.
    #[must_use]
    pub fn from_result(result: &ParseResult, source: &Source) -> Self {
        Self {
            title: result.title.clone(),
            author: result.author.clone(),
            source: result.url.clone().unwrap_or_else(|| source.to_string()),
            domain: result.domain.clone(),
            site: result.site.clone(),
            published: result.published.clone(),
            description: result.description.clone(),
            image: result.image.clone(),
            word_count: result.word_count,
            extracted: Utc::now(),
        }
    }

    /// Render the `---`-delimited block, ending with a newline
    ///
    /// Strings are double-quoted with JSON escaping, which YAML reads as
    /// ordinary double-quoted scalars. Unknown optional fields are left out.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");

        push_string(&mut out, "title", Some(&self.title));
        push_string(&mut out, "author", self.author.as_deref());
        push_string(&mut out, "source", Some(&self.source));
        push_string(&mut out, "domain", self.domain.as_deref());
        push_string(&mut out, "site", self.site.as_deref());
        push_string(&mut out, "published", self.published.as_deref());
        push_string(&mut out, "description", self.description.as_deref());
        push_string(&mut out, "image", self.image.as_deref());
        let _ = writeln!(out, "word_count: {}", self.word_count);
        let extracted = self.extracted.to_rfc3339_opts(SecondsFormat::Secs, true);
        push_string(&mut out, "extracted", Some(&extracted));

        out.push_str("---\n");
        out
    }
}

fn push_string(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = writeln!(out, "{key}: {}", quote(value));
    }
}

/// Double-quoted scalar with JSON escapes
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}
