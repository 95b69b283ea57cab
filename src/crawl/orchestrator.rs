//! Sitemap crawl orchestration
//!
//! Loads the sitemap, filters its URLs, then fetches, extracts, and saves
//! each page with bounded concurrency. One page failing never aborts the
//! crawl; the outcome of every page lands in the summary and in
//! `manifest.json`.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use super::progress::ProgressReporter;
use super::retry::retry_with_backoff;
use crate::config::{CrawlConfig, PageFormat};
use crate::document::Document;
use crate::error::{DeclutterError, DeclutterResult};
use crate::extractor::Extractor;
use crate::markdown::{MarkdownOptions, to_markdown_document};
use crate::sitemap::SitemapLoader;
use crate::source::{Fetcher, Source};
use crate::utils::{MANIFEST_FILE_NAME, get_output_path};

/// What happened to one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageStatus {
    Saved { path: PathBuf },
    Failed { error: String },
    Skipped { reason: String },
}

/// Per-page crawl record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutcome {
    pub url: String,
    #[serde(flatten)]
    pub status: PageStatus,
    /// Fetch attempts made (0 when the page was never fetched)
    pub attempts: u32,
}

/// Result of a whole sitemap crawl, also written as `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub sitemap_url: Url,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// URLs listed by the sitemap before filtering
    pub listed: usize,
    /// Pages selected for processing
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<PageOutcome>,
}

impl CrawlSummary {
    /// Every selected page failed
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failed == self.total
    }
}

/// Shared state for processing one page
struct PageContext<'a, P: ?Sized> {
    config: &'a CrawlConfig,
    fetcher: &'a Fetcher,
    extractor: &'a Extractor,
    pacer: &'a Pacer,
    progress: &'a P,
}

/// Spaces page fetches at least `delay` apart, across all concurrent tasks
///
/// The first fetch of a crawl starts immediately.
struct Pacer {
    delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_start: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        // Held across the sleep so waiting tasks start one by one
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            match previous.checked_add(self.delay) {
                Some(next) => tokio::time::sleep_until(next).await,
                None => tokio::time::sleep(self.delay).await,
            }
        }
        *last_start = Some(Instant::now());
    }
}

/// Crawl every page listed by the configured sitemap
///
/// # Errors
///
/// Fails only when the sitemap itself cannot be loaded, the output
/// directory cannot be created, or the manifest cannot be written.
pub async fn crawl_sitemap<P>(config: &CrawlConfig, progress: &P) -> DeclutterResult<CrawlSummary>
where
    P: ProgressReporter + ?Sized,
{
    let started_at = Utc::now();
    let fetcher = Fetcher::new(config.fetch_config())?;

    let loader = SitemapLoader::new(fetcher.clone(), config.retry_policy().clone());
    let entries = loader.load(config.sitemap_url()).await?;
    let listed = entries.len();

    let urls: Vec<Url> = entries
        .into_iter()
        .map(|entry| entry.loc)
        .filter(|url| {
            let accepted = config.accepts(url.as_str());
            if !accepted {
                debug!("Filtered out {url}");
            }
            accepted
        })
        .take(config.limit().unwrap_or(usize::MAX))
        .collect();
    info!(
        "Processing {} of {listed} sitemap URLs with concurrency {}",
        urls.len(),
        config.concurrency()
    );

    tokio::fs::create_dir_all(config.output_dir()).await?;
    progress.report_started(urls.len());

    let extractor = Extractor::new(config.extract_options().clone());
    let pacer = Pacer::new(config.delay_between_requests());
    let ctx = PageContext {
        config,
        fetcher: &fetcher,
        extractor: &extractor,
        pacer: &pacer,
        progress,
    };

    let outcomes: Vec<PageOutcome> = stream::iter(urls)
        .map(|url| process_page(&ctx, url))
        .buffered(config.concurrency())
        .collect()
        .await;

    progress.report_completed();

    let count = |pred: fn(&PageStatus) -> bool| outcomes.iter().filter(|o| pred(&o.status)).count();
    let summary = CrawlSummary {
        sitemap_url: config.sitemap_url().clone(),
        started_at,
        finished_at: Utc::now(),
        listed,
        total: outcomes.len(),
        saved: count(|s| matches!(s, PageStatus::Saved { .. })),
        failed: count(|s| matches!(s, PageStatus::Failed { .. })),
        skipped: count(|s| matches!(s, PageStatus::Skipped { .. })),
        outcomes,
    };

    let manifest = config.output_dir().join(MANIFEST_FILE_NAME);
    tokio::fs::write(&manifest, serde_json::to_vec_pretty(&summary)?).await?;
    info!(
        "Crawl finished: {} saved, {} skipped, {} failed (manifest: {})",
        summary.saved,
        summary.skipped,
        summary.failed,
        manifest.display()
    );

    Ok(summary)
}

async fn process_page<P>(ctx: &PageContext<'_, P>, url: Url) -> PageOutcome
where
    P: ProgressReporter + ?Sized,
{
    let config = ctx.config;
    let outcome = |status: PageStatus, attempts: u32| PageOutcome {
        url: url.to_string(),
        status,
        attempts,
    };

    let path = match get_output_path(&url, config.output_dir(), config.format().file_name()) {
        Ok(path) => path,
        Err(e) => {
            ctx.progress.report_page_failed(url.as_str(), &e.to_string());
            return outcome(PageStatus::Failed { error: e.to_string() }, 0);
        }
    };

    if !config.overwrite() && output_exists(&path).await {
        debug!("Skipping {url}: {} exists", path.display());
        ctx.progress.report_page_skipped(url.as_str());
        return outcome(
            PageStatus::Skipped {
                reason: format!("{} already exists", path.display()),
            },
            0,
        );
    }

    ctx.progress.report_page_started(url.as_str());

    ctx.pacer.wait().await;

    let attempted = retry_with_backoff(config.retry_policy(), url.as_str(), || {
        ctx.fetcher.fetch_text(&url)
    })
    .await;
    let attempts = attempted.attempts;

    let saved = match attempted.result {
        Ok(fetched) => {
            let base = fetched.final_url;
            match render_page(ctx.extractor, config.format(), fetched.body, &url, base) {
                Ok(text) => save(&path, &text).await,
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    };

    match saved {
        Ok(()) => {
            debug!("Saved {url} to {}", path.display());
            ctx.progress.report_page_saved(url.as_str());
            outcome(PageStatus::Saved { path }, attempts)
        }
        Err(e) => {
            warn!("Failed to process {url}: {e}");
            ctx.progress.report_page_failed(url.as_str(), &e.to_string());
            outcome(PageStatus::Failed { error: e.to_string() }, attempts)
        }
    }
}

fn render_page(
    extractor: &Extractor,
    format: PageFormat,
    html: String,
    url: &Url,
    base: Url,
) -> DeclutterResult<String> {
    let document = Document::new(html, Some(base));
    let result = extractor.extract(&document)?;

    match format {
        PageFormat::Markdown => {
            let options = MarkdownOptions {
                base_url: document.base_url.clone(),
                ..MarkdownOptions::default()
            };
            to_markdown_document(&result, &Source::Url(url.clone()), &options)
        }
        PageFormat::Json => serde_json::to_string_pretty(&result).map_err(DeclutterError::from),
    }
}

/// Whether a page was already saved; unreadable paths count as missing
async fn output_exists(path: &Path) -> bool {
    match tokio::fs::try_exists(path).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!("Cannot check {}: {e}, fetching the page again", path.display());
            false
        }
    }
}

async fn save(path: &Path, text: &str) -> DeclutterResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}
