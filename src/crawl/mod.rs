//! Sitemap crawling with retry and progress reporting

pub mod orchestrator;
pub mod progress;
pub mod retry;

pub use orchestrator::{CrawlSummary, PageOutcome, PageStatus, crawl_sitemap};
pub use progress::{BarProgress, NoOpProgress, ProgressReporter};
pub use retry::{Attempted, RetryPolicy, retry, retry_with_backoff};
