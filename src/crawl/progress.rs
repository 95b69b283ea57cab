//! Progress reporting abstraction for sitemap crawls
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting, a
//! no-op implementation for library callers, and a terminal progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::utils::ellipsize;

/// Longest URL shown next to the progress bar
const MAX_MESSAGE_CHARS: usize = 60;

/// Trait for reporting crawl progress at key lifecycle events
///
/// Implementations can log to console, update a UI, collect events in tests, etc.
pub trait ProgressReporter: Send + Sync {
    /// The sitemap has been loaded and filtered; `total` pages will be processed
    fn report_started(&self, total: usize);

    /// A page fetch is starting
    fn report_page_started(&self, url: &str);

    /// A page was extracted and saved
    fn report_page_saved(&self, url: &str);

    /// A page was skipped (already on disk)
    fn report_page_skipped(&self, url: &str);

    /// A page failed after all retries
    fn report_page_failed(&self, url: &str, error: &str);

    /// Every page has been handled
    fn report_completed(&self);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_started(&self, _total: usize) {}

    #[inline(always)]
    fn report_page_started(&self, _url: &str) {}

    #[inline(always)]
    fn report_page_saved(&self, _url: &str) {}

    #[inline(always)]
    fn report_page_skipped(&self, _url: &str) {}

    #[inline(always)]
    fn report_page_failed(&self, _url: &str, _error: &str) {}

    #[inline(always)]
    fn report_completed(&self) {}
}

/// Progress bar on stderr
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn report_started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn report_page_started(&self, url: &str) {
        self.bar.set_message(ellipsize(url, MAX_MESSAGE_CHARS));
    }

    fn report_page_saved(&self, _url: &str) {
        self.bar.inc(1);
    }

    fn report_page_skipped(&self, _url: &str) {
        self.bar.inc(1);
    }

    fn report_page_failed(&self, url: &str, error: &str) {
        self.bar.println(format!("failed: {url}: {error}"));
        self.bar.inc(1);
    }

    fn report_completed(&self) {
        self.bar.finish_and_clear();
    }
}
