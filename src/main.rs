//! Pagesift main entry point
//!
//! This is the command-line interface for the Pagesift scraper.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagesift::config::load_config_with_hash;
use pagesift::output::{parse_extract_list, render_json, run_extractions};
use pagesift::{Scraper, ScraperConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pagesift: a polite page scraper
///
/// Pagesift fetches a page under a rolling-window rate limit and extracts links,
/// images, metadata, content, sitemaps and RSS feeds as JSON.
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(version)]
#[command(about = "Scrape a page and extract structured data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a website and extract data
    Scrape {
        /// The URL to scrape
        url: String,

        /// Data to extract (links,images,meta,content,sitemap,rss)
        #[arg(short, long, default_value = "links")]
        extract: String,

        /// Path to TOML configuration file
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Scrape {
            url,
            extract,
            config,
        } => handle_scrape(&url, &extract, config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the JSON result.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagesift=info,warn"),
            1 => EnvFilter::new("pagesift=debug,info"),
            2 => EnvFilter::new("pagesift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scraper_config(path: Option<PathBuf>) -> anyhow::Result<ScraperConfig> {
    let Some(path) = path else {
        return Ok(ScraperConfig::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the `scrape` subcommand
///
/// The extract list is checked before any request goes out.
async fn handle_scrape(url: &str, extract: &str, config: Option<PathBuf>) -> anyhow::Result<()> {
    let kinds = parse_extract_list(extract)?;
    let config = load_scraper_config(config)?;

    let mut scraper = Scraper::new(config)?;
    scraper.go(url).await?;

    let results = run_extractions(&scraper, &kinds).await?;
    println!("{}", render_json(&results)?);
    Ok(())
}
