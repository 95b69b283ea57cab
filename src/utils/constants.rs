//! Shared configuration constants
//!
//! Default values used by the CLI flags and the config builders.

/// User agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; declutter/",
    env!("CARGO_PKG_VERSION"),
    "; +https://github.com/declutter-rs/declutter)"
);

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects followed per request
pub const MAX_REDIRECTS: usize = 10;

/// Retry attempts after the first failure of a page fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First retry delay in milliseconds; doubles on every further attempt
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;

/// Upper bound for a single retry delay in milliseconds
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Growth factor between consecutive retry delays
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Pages fetched at once during a sitemap crawl
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Upper bound for `--concurrency`
pub const MAX_CONCURRENCY: usize = 16;

/// Nesting depth followed through sitemap index files
pub const MAX_SITEMAP_DEPTH: u8 = 3;

/// Minimum text length readability accepts as an article
pub const DEFAULT_CHAR_THRESHOLD: usize = 500;

/// Number of top candidates readability compares
pub const DEFAULT_N_TOP_CANDIDATES: usize = 5;

/// Element budget for readability (0 = unlimited)
pub const DEFAULT_MAX_ELEMENTS_TO_PARSE: usize = 0;

/// Viewport width reported by the document environment
pub const VIEWPORT_WIDTH: u32 = 1024;

/// Viewport height reported by the document environment
pub const VIEWPORT_HEIGHT: u32 = 768;

/// File name of the crawl summary written next to crawled pages
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
