//! Configuration for fetching, extraction, and sitemap crawls
//!
//! `CrawlConfig` is built through a type-safe builder that validates the
//! sitemap URL, the concurrency range, and the glob filters.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, CrawlConfigBuilder, WithSitemapUrl};
pub use types::{CrawlConfig, ExtractOptions, FetchConfig, PageFormat};
