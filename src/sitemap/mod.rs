//! Sitemap discovery
//!
//! Handles `<urlset>` and `<sitemapindex>` documents (optionally gzipped)
//! and plain-text sitemaps with one URL per line. Indexes are followed up to
//! [`MAX_SITEMAP_DEPTH`] levels deep.

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::io::Read;
use std::sync::LazyLock;
use url::Url;

use crate::crawl::{RetryPolicy, retry};
use crate::error::{DeclutterError, DeclutterResult};
use crate::source::Fetcher;
use crate::utils::MAX_SITEMAP_DEPTH;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static SITEMAPINDEX_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("sitemapindex").expect("BUG: hardcoded CSS selector 'sitemapindex' is invalid")
});

static URLSET_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("urlset").expect("BUG: hardcoded CSS selector 'urlset' is invalid")
});

static URL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("url").expect("BUG: hardcoded CSS selector 'url' is invalid")
});

static SITEMAP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("sitemap").expect("BUG: hardcoded CSS selector 'sitemap' is invalid")
});

static LOC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("loc").expect("BUG: hardcoded CSS selector 'loc' is invalid")
});

static LASTMOD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("lastmod").expect("BUG: hardcoded CSS selector 'lastmod' is invalid")
});

static CDATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("CDATA_RE: hardcoded regex is valid")
});

/// One page listed in a `<urlset>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// Page URLs
    UrlSet(Vec<SitemapEntry>),
    /// Child sitemap URLs
    Index(Vec<Url>),
}

/// Parse a sitemap document
///
/// Returns `None` when the input is neither an XML sitemap nor a list of
/// URLs. `<loc>` values that are not http(s) URLs are skipped with a warning.
#[must_use]
pub fn parse_sitemap(xml: &str) -> Option<Sitemap> {
    let xml = CDATA_RE.replace_all(xml, |caps: &regex::Captures<'_>| {
        caps[1]
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    });
    let document = Html::parse_document(&xml);

    if document.select(&SITEMAPINDEX_SELECTOR).next().is_some() {
        let sitemaps = document
            .select(&SITEMAP_SELECTOR)
            .filter_map(|sitemap| child_text(&sitemap, &LOC_SELECTOR))
            .filter_map(|loc| parse_loc(&loc))
            .collect();
        return Some(Sitemap::Index(sitemaps));
    }

    if document.select(&URLSET_SELECTOR).next().is_some() {
        let entries = document
            .select(&URL_SELECTOR)
            .filter_map(|url| {
                let loc = parse_loc(&child_text(&url, &LOC_SELECTOR)?)?;
                let lastmod = child_text(&url, &LASTMOD_SELECTOR);
                Some(SitemapEntry { loc, lastmod })
            })
            .collect();
        return Some(Sitemap::UrlSet(entries));
    }

    let entries: Vec<SitemapEntry> = xml
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .filter_map(parse_loc)
        .map(|loc| SitemapEntry { loc, lastmod: None })
        .collect();
    (!entries.is_empty()).then_some(Sitemap::UrlSet(entries))
}

fn child_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn parse_loc(loc: &str) -> Option<Url> {
    match Url::parse(loc.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            warn!("Skipping sitemap entry with unsupported scheme: {url}");
            None
        }
        Err(e) => {
            warn!("Skipping invalid sitemap entry '{loc}': {e}");
            None
        }
    }
}

/// Decode a sitemap body, gunzipping it when it starts with the gzip magic
///
/// # Errors
///
/// Fails when gzip data is corrupt.
pub fn decode_body(bytes: &[u8]) -> DeclutterResult<String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut decoded)?;
        debug!("Decompressed sitemap: {} -> {} bytes", bytes.len(), decoded.len());
        return Ok(String::from_utf8_lossy(&decoded).into_owned());
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Fetches a sitemap and everything its indexes point to
#[derive(Debug, Clone)]
pub struct SitemapLoader {
    fetcher: Fetcher,
    retry: RetryPolicy,
}

impl SitemapLoader {
    #[must_use]
    pub fn new(fetcher: Fetcher, retry: RetryPolicy) -> Self {
        Self { fetcher, retry }
    }

    /// Every page URL reachable from `url`, first-seen order, without duplicates
    ///
    /// # Errors
    ///
    /// Fails when the top-level sitemap cannot be fetched or parsed. Broken
    /// child sitemaps are skipped with a warning.
    pub async fn load(&self, url: &Url) -> DeclutterResult<Vec<SitemapEntry>> {
        let mut queue = VecDeque::from([(url.clone(), 0u8)]);
        let mut visited_sitemaps = HashSet::new();
        let mut seen_pages = HashSet::new();
        let mut entries = Vec::new();

        while let Some((sitemap_url, depth)) = queue.pop_front() {
            if !visited_sitemaps.insert(sitemap_url.clone()) {
                debug!("Sitemap {sitemap_url} already visited");
                continue;
            }

            let sitemap = match self.fetch_one(&sitemap_url).await {
                Ok(sitemap) => sitemap,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    warn!("Skipping child sitemap {sitemap_url}: {e}");
                    continue;
                }
            };

            match sitemap {
                Sitemap::UrlSet(pages) => {
                    debug!("{sitemap_url}: {} URLs", pages.len());
                    for entry in pages {
                        if seen_pages.insert(entry.loc.clone()) {
                            entries.push(entry);
                        }
                    }
                }
                Sitemap::Index(children) => {
                    if depth >= MAX_SITEMAP_DEPTH {
                        warn!(
                            "Sitemap index {sitemap_url} nested deeper than {MAX_SITEMAP_DEPTH} levels, ignoring {} children",
                            children.len()
                        );
                        continue;
                    }
                    debug!("{sitemap_url}: index of {} sitemaps", children.len());
                    queue.extend(children.into_iter().map(|child| (child, depth + 1)));
                }
            }
        }

        info!("Sitemap {url} lists {} unique pages", entries.len());
        Ok(entries)
    }

    async fn fetch_one(&self, url: &Url) -> DeclutterResult<Sitemap> {
        let fetched = retry(&self.retry, url.as_str(), || self.fetcher.fetch_bytes(url)).await?;
        let body = decode_body(&fetched.body)?;
        parse_sitemap(&body).ok_or_else(|| DeclutterError::Sitemap {
            url: url.to_string(),
            reason: "not a <urlset>, <sitemapindex>, or URL list".to_string(),
        })
    }
}
