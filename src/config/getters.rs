//! Getter methods for `CrawlConfig`

use std::path::Path;
use std::time::Duration;
use url::Url;

use super::types::{CrawlConfig, ExtractOptions, FetchConfig, PageFormat};
use crate::crawl::RetryPolicy;

impl CrawlConfig {
    #[must_use]
    pub fn sitemap_url(&self) -> &Url {
        &self.sitemap_url
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn format(&self) -> PageFormat {
        self.format
    }

    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    #[must_use]
    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    #[must_use]
    pub fn extract_options(&self) -> &ExtractOptions {
        &self.extract
    }

    #[must_use]
    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch
    }
}
