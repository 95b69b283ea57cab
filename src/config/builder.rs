//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! The sitemap URL and the output directory are required; `build()` only
//! exists once both have been set.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::types::{CrawlConfig, ExtractOptions, FetchConfig, PageFormat};
use crate::crawl::RetryPolicy;
use crate::error::{DeclutterError, DeclutterResult};
use crate::utils::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, compile_glob_pattern, is_valid_url};

// Type states for the builder
pub struct WithSitemapUrl;
pub struct Complete;

pub struct CrawlConfigBuilder<State = ()> {
    sitemap_url: Option<String>,
    output_dir: Option<PathBuf>,
    limit: Option<usize>,
    concurrency: usize,
    delay_between_requests_ms: u64,
    retry: RetryPolicy,
    format: PageFormat,
    overwrite: bool,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    extract: ExtractOptions,
    fetch: FetchConfig,
    _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            sitemap_url: None,
            output_dir: None,
            limit: None,
            concurrency: DEFAULT_CONCURRENCY,
            delay_between_requests_ms: 0,
            retry: RetryPolicy::default(),
            format: PageFormat::default(),
            overwrite: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            extract: ExtractOptions::default(),
            fetch: FetchConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl<State> CrawlConfigBuilder<State> {
    fn into_state<Next>(self) -> CrawlConfigBuilder<Next> {
        CrawlConfigBuilder {
            sitemap_url: self.sitemap_url,
            output_dir: self.output_dir,
            limit: self.limit,
            concurrency: self.concurrency,
            delay_between_requests_ms: self.delay_between_requests_ms,
            retry: self.retry,
            format: self.format,
            overwrite: self.overwrite,
            include_patterns: self.include_patterns,
            exclude_patterns: self.exclude_patterns,
            extract: self.extract,
            fetch: self.fetch,
            _phantom: PhantomData,
        }
    }

    /// Process at most `limit` pages (after filtering)
    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Number of pages fetched at once (1..=16)
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Pause taken before each page fetch
    #[must_use]
    pub fn delay_between_requests(mut self, delay: Duration) -> Self {
        self.delay_between_requests_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Retry policy for page and sitemap fetches
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shorthand for changing only the retry count
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    #[must_use]
    pub fn format(mut self, format: PageFormat) -> Self {
        self.format = format;
        self
    }

    /// Re-extract pages whose output file already exists
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Only process URLs matching one of these globs
    #[must_use]
    pub fn include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// Skip URLs matching any of these globs
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    #[must_use]
    pub fn extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    #[must_use]
    pub fn fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }
}

impl CrawlConfigBuilder<()> {
    pub fn sitemap_url(mut self, url: impl Into<String>) -> CrawlConfigBuilder<WithSitemapUrl> {
        self.sitemap_url = Some(url.into());
        self.into_state()
    }
}

impl CrawlConfigBuilder<WithSitemapUrl> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<Complete> {
        self.output_dir = Some(dir.into());
        self.into_state()
    }
}

impl CrawlConfigBuilder<Complete> {
    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Fails when the sitemap URL is not http(s), the concurrency is out of
    /// range, or a glob pattern does not compile.
    pub fn build(self) -> DeclutterResult<CrawlConfig> {
        let raw_url = self.sitemap_url.unwrap_or_default();
        if !is_valid_url(&raw_url) {
            return Err(DeclutterError::Config(format!(
                "Sitemap URL must be an absolute http(s) URL, got '{raw_url}'"
            )));
        }
        let sitemap_url = Url::parse(&raw_url)
            .map_err(|e| DeclutterError::Config(format!("Invalid sitemap URL '{raw_url}': {e}")))?;

        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(DeclutterError::Config(format!(
                "Concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }

        let output_dir = self.output_dir.unwrap_or_else(|| PathBuf::from("."));
        let output_dir = std::path::absolute(&output_dir)?;

        let include_compiled = self
            .include_patterns
            .iter()
            .map(|p| compile_glob_pattern(p))
            .collect::<DeclutterResult<Vec<_>>>()?;
        let exclude_compiled = self
            .exclude_patterns
            .iter()
            .map(|p| compile_glob_pattern(p))
            .collect::<DeclutterResult<Vec<_>>>()?;

        Ok(CrawlConfig {
            sitemap_url,
            output_dir,
            limit: self.limit,
            concurrency: self.concurrency,
            delay_between_requests_ms: self.delay_between_requests_ms,
            retry: self.retry,
            format: self.format,
            overwrite: self.overwrite,
            include_patterns: self.include_patterns,
            exclude_patterns: self.exclude_patterns,
            include_compiled,
            exclude_compiled,
            extract: self.extract,
            fetch: self.fetch,
        })
    }
}
