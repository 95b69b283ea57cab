// declutter: extract readable content from a file, a URL, or a whole sitemap.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use declutter::cli::{Cli, Commands, GlobalArgs, ParseArgs, SitemapArgs};
use declutter::crawl::{BarProgress, CrawlSummary, NoOpProgress, crawl_sitemap};
use declutter::output::{render, render_property, write_output};
use declutter::parse_source;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug());

    let outcome = match &cli.command {
        Commands::Parse(args) => run_parse(&cli.global, args).await,
        Commands::Sitemap(args) => run_sitemap(&cli.global, args).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("declutter", log::LevelFilter::Debug);
    }
    builder
        .filter_module("html5ever", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .init();
}

fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    Some(bar)
}

async fn run_parse(global: &GlobalArgs, args: &ParseArgs) -> Result<ExitCode> {
    let spinner = spinner("Parsing content...", global.quiet);

    let parsed = parse_source(
        &args.source,
        &global.fetch_config(),
        &args.extract_options(),
        args.base_url.clone(),
    )
    .await;

    let parsed = match parsed {
        Ok(parsed) => {
            if let Some(bar) = &spinner {
                bar.finish_with_message("Content parsed successfully");
            }
            parsed
        }
        Err(e) => {
            if let Some(bar) = &spinner {
                bar.finish_and_clear();
            }
            return Err(e.into());
        }
    };

    let text = match &args.property {
        Some(name) => render_property(&parsed.result, name)?,
        None => render(&parsed.result, args.effective_format(), &parsed.source)?,
    };
    write_output(&text, args.output.as_deref()).await?;

    Ok(ExitCode::SUCCESS)
}

async fn run_sitemap(global: &GlobalArgs, args: &SitemapArgs) -> Result<ExitCode> {
    let config = args.crawl_config(global.fetch_config())?;

    let summary = if global.quiet {
        crawl_sitemap(&config, &NoOpProgress).await?
    } else {
        crawl_sitemap(&config, &BarProgress::new()).await?
    };

    print_summary(&summary)?;

    if summary.all_failed() {
        print_error(&format!("All {} pages failed", summary.total));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &CrawlSummary) -> Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);

    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(&mut stderr, "Sitemap: {}", summary.sitemap_url)?;
    stderr.reset()?;
    writeln!(
        &mut stderr,
        "  {} listed, {} processed",
        summary.listed, summary.total
    )?;

    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(&mut stderr, "  {} saved", summary.saved)?;
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(&mut stderr, "  {} skipped", summary.skipped)?;
    let failed_color = if summary.failed > 0 { Color::Red } else { Color::White };
    stderr.set_color(ColorSpec::new().set_fg(Some(failed_color)))?;
    writeln!(&mut stderr, "  {} failed", summary.failed)?;
    stderr.reset()?;
    Ok(())
}

fn print_error(message: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = writeln!(&mut stderr, "Error: {message}");
    let _ = stderr.reset();
}
