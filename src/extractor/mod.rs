//! Readable-content extraction
//!
//! The readability pass is delegated to `dom_smoothie`. Whatever metadata it
//! cannot find is filled in from `<meta>` tags and JSON-LD, and when it finds
//! no main-content candidate at all the script-free `<body>` is used instead.

mod result;

pub use result::{ExtractorKind, ParseResult};

use dom_smoothie::{Article, Config, Readability};
use log::{debug, warn};
use ego_tree::iter::Edge;
use scraper::{Html, Node};
use serde_json::Value;
use std::time::Instant;

use crate::config::ExtractOptions;
use crate::document::{Document, MetaTag, schema_string};
use crate::error::{DeclutterError, DeclutterResult};
use crate::utils::{collapse_whitespace, display_domain, word_count};

const AUTHOR_KEYS: &[&str] = &["author", "article:author", "parsely-author", "dc.creator", "twitter:creator"];
const DESCRIPTION_KEYS: &[&str] = &["description", "og:description", "twitter:description"];
const PUBLISHED_KEYS: &[&str] = &["article:published_time", "datePublished", "pubdate", "dc.date"];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:url", "twitter:image"];
const SITE_KEYS: &[&str] = &["og:site_name", "application-name"];
const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];

/// Elements whose boundaries separate words in extracted text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "img", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Runs the readability pass over documents
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the readable content and metadata of `document`
    ///
    /// Never fails because readability found nothing: that case falls back
    /// to the script-free body.
    pub fn extract(&self, document: &Document) -> DeclutterResult<ParseResult> {
        let started = Instant::now();

        let narrowed = self
            .options
            .content_selector
            .as_deref()
            .and_then(|selector| {
                let narrowed = document.narrowed(selector);
                if narrowed.is_none() {
                    warn!("Content selector '{selector}' matched nothing, using the whole document");
                }
                narrowed
            });
        let document = narrowed.as_ref().unwrap_or(document);

        let meta_tags = document.meta_tags();
        let schema_org_data = document.schema_org_data();
        if self.options.debug {
            debug!(
                "Found {} meta tags and {} JSON-LD entities",
                meta_tags.len(),
                schema_org_data.len()
            );
        }

        let mut result = match self.run_readability(document) {
            Ok(article) => from_article(article),
            Err(e) => {
                warn!("Readability found no main content ({e}), falling back to <body>");
                fallback(document)
            }
        };

        fill_metadata(&mut result, document, &meta_tags, &schema_org_data);

        result.word_count = word_count(&html_text(&result.content));
        result.meta_tags = meta_tags;
        result.schema_org_data = schema_org_data;
        result.parse_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(
            "Extracted \"{}\" via {} ({} words, {}ms)",
            result.title, result.extractor, result.word_count, result.parse_time_ms
        );
        Ok(result)
    }

    fn run_readability(&self, document: &Document) -> DeclutterResult<Article> {
        let config = Config {
            max_elements_to_parse: self.options.max_elements_to_parse,
            char_threshold: self.options.char_threshold,
            n_top_candidates: self.options.n_top_candidates,
            keep_classes: self.options.keep_classes,
            ..Default::default()
        };

        let base = document.base_url.as_ref().map(url::Url::as_str);
        let mut readability = Readability::new(document.html.as_str(), base, Some(config))
            .map_err(|e| DeclutterError::Extraction(e.to_string()))?;
        let article = readability
            .parse()
            .map_err(|e| DeclutterError::Extraction(e.to_string()))?;

        let text_chars = article.text_content.trim().chars().count();
        if text_chars < self.options.char_threshold {
            return Err(DeclutterError::Extraction(format!(
                "best candidate has {text_chars} chars, below the threshold of {}",
                self.options.char_threshold
            )));
        }
        if self.options.debug {
            debug!(
                "Readability picked {} chars of text, excerpt: {:?}",
                article.length, article.excerpt
            );
        }
        Ok(article)
    }
}

fn from_article(article: Article) -> ParseResult {
    ParseResult {
        title: article.title.trim().to_string(),
        author: non_empty(article.byline),
        content: article.content.to_string(),
        description: non_empty(article.excerpt),
        domain: None,
        favicon: non_empty(article.favicon),
        image: non_empty(article.image),
        published: non_empty(article.published_time),
        site: non_empty(article.site_name),
        lang: non_empty(article.lang),
        dir: non_empty(article.dir),
        word_count: 0,
        parse_time_ms: 0,
        url: non_empty(article.url),
        meta_tags: Vec::new(),
        schema_org_data: Vec::new(),
        extractor: ExtractorKind::Readability,
    }
}

fn fallback(document: &Document) -> ParseResult {
    ParseResult {
        title: document.title_tag().unwrap_or_default(),
        author: None,
        content: document.clean_body_html().trim().to_string(),
        description: None,
        domain: None,
        favicon: None,
        image: None,
        published: None,
        site: None,
        lang: None,
        dir: None,
        word_count: 0,
        parse_time_ms: 0,
        url: None,
        meta_tags: Vec::new(),
        schema_org_data: Vec::new(),
        extractor: ExtractorKind::Fallback,
    }
}

/// Fill fields readability left empty from meta tags and JSON-LD
fn fill_metadata(result: &mut ParseResult, document: &Document, meta: &[MetaTag], schema: &[Value]) {
    if result.title.is_empty() {
        result.title = meta_value(meta, TITLE_KEYS)
            .or_else(|| document.title_tag())
            .or_else(|| schema_value(schema, &["headline", "name"]))
            .unwrap_or_default();
    }
    result.title = collapse_whitespace(&result.title);

    fill(&mut result.author, || {
        meta_value(meta, AUTHOR_KEYS).or_else(|| schema_value(schema, &["author", "creator"]))
    });
    fill(&mut result.description, || {
        meta_value(meta, DESCRIPTION_KEYS).or_else(|| schema_value(schema, &["description"]))
    });
    fill(&mut result.published, || {
        meta_value(meta, PUBLISHED_KEYS).or_else(|| schema_value(schema, &["datePublished", "dateCreated"]))
    });
    fill(&mut result.image, || {
        meta_value(meta, IMAGE_KEYS).or_else(|| schema_value(schema, &["image", "thumbnailUrl"]))
    });
    fill(&mut result.site, || {
        meta_value(meta, SITE_KEYS).or_else(|| schema_value(schema, &["publisher"]))
    });

    if result.url.is_none() {
        result.url = document.base_url.as_ref().map(ToString::to_string);
    }
    if result.favicon.is_none() {
        result.favicon = document
            .base_url
            .as_ref()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .and_then(|u| u.join("/favicon.ico").ok())
            .map(|u| u.to_string());
    }

    result.domain = document
        .base_url
        .as_ref()
        .and_then(display_domain)
        .or_else(|| {
            result
                .url
                .as_deref()
                .and_then(|u| url::Url::parse(u).ok())
                .and_then(|u| display_domain(&u))
        });
}

fn fill(field: &mut Option<String>, lookup: impl FnOnce() -> Option<String>) {
    if field.is_none() {
        *field = lookup();
    }
}

fn meta_value(meta: &[MetaTag], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        meta.iter()
            .find(|tag| tag.is(key))
            .map(|tag| tag.content.trim().to_string())
            .filter(|c| !c.is_empty())
    })
}

fn schema_value(schema: &[Value], keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| schema.iter().find_map(|entity| schema_string(entity, key)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Visible text of an HTML fragment
///
/// Inline markup joins its text directly (`un<em>believ</em>able` is one
/// word); block and line-break elements separate words.
fn html_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();

    for edge in fragment.root_element().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => text.push(' '),
                _ => {}
            },
            Edge::Close(node) => match node.value() {
                Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => text.push(' '),
                _ => {}
            },
        }
    }
    text
}
