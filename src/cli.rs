//! Command-line arguments
//!
//! Parsing lives in the library so the flag mapping can be tested without
//! spawning the binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{CrawlConfig, ExtractOptions, FetchConfig, PageFormat};
use crate::error::DeclutterResult;
use crate::output::OutputFormat;
use crate::utils::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(name = "declutter", version)]
#[command(about = "Extract the readable content of web pages from files, URLs, or sitemaps")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// User agent sent with every request
    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Hide the spinner and progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the main content of one page
    Parse(ParseArgs),
    /// Extract every page listed in a sitemap into a directory
    Sitemap(SitemapArgs),
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// HTML file path or http(s) URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// Shorthand for `--format markdown`
    #[arg(long, conflicts_with = "format")]
    pub markdown: bool,

    /// Print a single property of the result (JSON name, e.g. `title` or `wordCount`)
    #[arg(short, long, value_name = "PROPERTY")]
    pub property: Option<String>,

    /// Base URL for resolving relative links in file sources
    #[arg(long, value_name = "URL")]
    pub base_url: Option<Url>,

    /// CSS selector narrowing the page before extraction
    #[arg(long, value_name = "CSS")]
    pub selector: Option<String>,

    /// Verbose extraction logging
    #[arg(long)]
    pub debug: bool,
}

impl ParseArgs {
    /// Format after applying `--markdown`
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.markdown {
            OutputFormat::Markdown
        } else {
            self.format
        }
    }

    #[must_use]
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            debug: self.debug,
            content_selector: self.selector.clone(),
            ..ExtractOptions::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct SitemapArgs {
    /// Sitemap URL (`sitemap.xml`, `.xml.gz`, index, or plain-text list)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Directory pages are saved under
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Process at most this many pages
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pages fetched in parallel (1-16)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Retries per page for transient failures
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Minimum gap between page fetches in milliseconds (shared across concurrent fetches)
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Only process URLs matching this glob (`*` wildcard); repeatable
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip URLs matching this glob; repeatable
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// File format of saved pages
    #[arg(long, value_enum, default_value_t = PageFormat::Markdown)]
    pub format: PageFormat,

    /// Replace pages that already exist on disk
    #[arg(long)]
    pub overwrite: bool,

    /// Verbose extraction logging
    #[arg(long)]
    pub debug: bool,
}

impl SitemapArgs {
    /// Build the crawl configuration
    ///
    /// # Errors
    ///
    /// Fails on an invalid sitemap URL, concurrency out of range, or a glob
    /// that does not compile.
    pub fn crawl_config(&self, fetch: FetchConfig) -> DeclutterResult<CrawlConfig> {
        CrawlConfig::builder()
            .limit(self.limit)
            .concurrency(self.concurrency)
            .max_retries(self.retries)
            .delay_between_requests(Duration::from_millis(self.delay_ms))
            .include_patterns(self.include.clone())
            .exclude_patterns(self.exclude.clone())
            .format(self.format)
            .overwrite(self.overwrite)
            .extract_options(ExtractOptions {
                debug: self.debug,
                ..ExtractOptions::default()
            })
            .fetch_config(fetch)
            .sitemap_url(self.url.clone())
            .output_dir(self.output_dir.clone())
            .build()
    }
}

impl GlobalArgs {
    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_secs: self.timeout_secs,
            ..FetchConfig::default()
        }
    }
}

impl Cli {
    /// Whether any subcommand asked for debug logging
    #[must_use]
    pub fn debug(&self) -> bool {
        match &self.command {
            Commands::Parse(args) => args.debug,
            Commands::Sitemap(args) => args.debug,
        }
    }
}
