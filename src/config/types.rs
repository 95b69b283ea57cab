//! Core configuration types
//!
//! `FetchConfig` controls HTTP requests, `ExtractOptions` tunes the
//! readability pass, and `CrawlConfig` drives a sitemap crawl.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::crawl::RetryPolicy;
use crate::utils::{
    DEFAULT_CHAR_THRESHOLD, DEFAULT_MAX_ELEMENTS_TO_PARSE,
    DEFAULT_N_TOP_CANDIDATES, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_REDIRECTS,
};

/// HTTP client settings shared by page and sitemap fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirects: MAX_REDIRECTS,
        }
    }
}

/// Knobs for the readability pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Log candidate selection details and the document environment
    pub debug: bool,
    /// Minimum text length readability accepts before falling back
    pub char_threshold: usize,
    /// Element budget (0 = unlimited)
    pub max_elements_to_parse: usize,
    /// Top-scoring candidates compared before picking the winner
    pub n_top_candidates: usize,
    /// Keep `class` attributes on the extracted content
    pub keep_classes: bool,
    /// CSS selector narrowing the document before extraction
    pub content_selector: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            debug: false,
            char_threshold: DEFAULT_CHAR_THRESHOLD,
            max_elements_to_parse: DEFAULT_MAX_ELEMENTS_TO_PARSE,
            n_top_candidates: DEFAULT_N_TOP_CANDIDATES,
            keep_classes: false,
            content_selector: None,
        }
    }
}

/// File format of pages saved by a sitemap crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    Markdown,
    Json,
}

impl PageFormat {
    /// File name each page is saved under
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Markdown => "index.md",
            Self::Json => "index.json",
        }
    }
}

/// Configuration for a sitemap crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) sitemap_url: Url,

    /// Where pages are written.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) output_dir: PathBuf,

    pub(crate) limit: Option<usize>,
    pub(crate) concurrency: usize,
    pub(crate) delay_between_requests_ms: u64,
    pub(crate) retry: RetryPolicy,
    pub(crate) format: PageFormat,
    pub(crate) overwrite: bool,
    pub(crate) include_patterns: Vec<String>,
    pub(crate) exclude_patterns: Vec<String>,

    /// Compiled from the glob patterns once, at build time
    #[serde(skip)]
    pub(crate) include_compiled: Vec<Regex>,
    #[serde(skip)]
    pub(crate) exclude_compiled: Vec<Regex>,

    pub(crate) extract: ExtractOptions,
    pub(crate) fetch: FetchConfig,
}

impl CrawlConfig {
    /// Whether `url` passes the include/exclude filters
    ///
    /// With no include patterns every URL is included. Exclusion wins over
    /// inclusion.
    #[must_use]
    pub fn accepts(&self, url: &str) -> bool {
        let included =
            self.include_compiled.is_empty() || self.include_compiled.iter().any(|re| re.is_match(url));
        included && !self.exclude_compiled.iter().any(|re| re.is_match(url))
    }
}
