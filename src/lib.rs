//! Readable-content extraction for web pages.
//!
//! Pages come from a local file, a URL, or every URL listed in a sitemap.
//! Each page is loaded into a [`Document`], run through the readability
//! extractor, and rendered as HTML, JSON, or a markdown document with YAML
//! frontmatter.
//!
//! ```rust,no_run
//! # async fn run() -> declutter::DeclutterResult<()> {
//! use declutter::{ExtractOptions, FetchConfig, OutputFormat, parse_source};
//!
//! let parsed = parse_source(
//!     "https://example.com/post",
//!     &FetchConfig::default(),
//!     &ExtractOptions::default(),
//!     None,
//! )
//! .await?;
//! let markdown = declutter::output::render(&parsed.result, OutputFormat::Markdown, &parsed.source)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod crawl;
pub mod document;
pub mod error;
pub mod extractor;
pub mod markdown;
pub mod output;
pub mod sitemap;
pub mod source;
pub mod utils;

pub use config::{CrawlConfig, ExtractOptions, FetchConfig};
pub use crawl::{CrawlSummary, NoOpProgress, PageOutcome, ProgressReporter, RetryPolicy, crawl_sitemap};
pub use document::Document;
pub use error::{DeclutterError, DeclutterResult, FetchError};
pub use extractor::{Extractor, ParseResult};
pub use output::OutputFormat;
pub use source::{Fetcher, LoadedPage, Source};

use log::warn;
use url::Url;

/// A page that went through the full load-and-extract pipeline.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub source: Source,
    pub result: ParseResult,
}

/// Load `input` (file path or URL), then extract its readable content.
///
/// `base_url` overrides the URL used for resolving relative links; for URL
/// sources the final URL after redirects is used otherwise.
pub async fn parse_source(
    input: &str,
    fetch_config: &FetchConfig,
    options: &ExtractOptions,
    base_url: Option<Url>,
) -> DeclutterResult<ParsedPage> {
    let source = Source::detect(input)?;
    let fetcher = Fetcher::new(fetch_config)?;
    let page = source.load(&fetcher).await?;
    if !page.is_markup() {
        warn!(
            "{source} is served as {}, extracting it as HTML anyway",
            page.content_type.as_deref().unwrap_or_default()
        );
    }

    let base = base_url.or_else(|| page.final_url.clone());
    let document = Document::new(page.html, base);
    let result = Extractor::new(options.clone()).extract(&document)?;

    Ok(ParsedPage { source, result })
}
