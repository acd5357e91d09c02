//! Scrapyard main entry point
//!
//! This is the command-line interface for running scrap tasks described in a
//! TOML file.

use anyhow::Context;
use clap::Parser;
use scrapyard::config::{load_config_with_hash, Config, OutputConfig, TransportKind};
use scrapyard::crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scrapyard: a queue-driven web scraper
///
/// Scrapyard fetches the seed URLs of every configured scrap, extracts one
/// record per matched item with CSS selectors, follows pagination links and
/// writes the records to JSON, CSV, SQLite or the log.
#[derive(Parser, Debug)]
#[command(name = "scrapyard")]
#[command(version)]
#[command(about = "A queue-driven web scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrapyard=info,warn"),
            1 => EnvFilter::new("scrapyard=debug,info"),
            2 => EnvFilter::new("scrapyard=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn describe_output(output: &OutputConfig) -> String {
    match output {
        OutputConfig::Json { path } => format!("json -> {}", path),
        OutputConfig::Csv { path, delimiter } => {
            format!("csv -> {} (delimiter '{}')", path, delimiter)
        }
        OutputConfig::Sqlite { path, table } => format!("sqlite -> {} (table {})", path, table),
        OutputConfig::Log => "log".to_string(),
    }
}

/// Handles the --dry-run mode: shows the validated plan
fn handle_dry_run(config: &Config) {
    println!("=== Scrapyard Dry Run ===\n");

    println!("Engine:");
    match config.engine.transport {
        TransportKind::Http => {
            println!("  Transport: http");
            println!("  User agent: {}", config.http.user_agent);
            println!("  Timeout: {}s", config.http.timeout_secs);
        }
        TransportKind::Browser => {
            let browser = config.browser.clone().unwrap_or_default();
            match &browser.remote_url {
                Some(remote) => println!("  Transport: browser (remote {})", remote),
                None => println!(
                    "  Transport: browser (local Chrome, headless={})",
                    browser.headless
                ),
            }
            println!("  Wait after request: {}ms", browser.wait_after_request_ms);
        }
    }
    println!("  Retry limit: {}", config.engine.retry_limit);

    println!("\nScraps ({}):", config.scraps.len());
    for scrap in &config.scraps {
        println!(
            "  - {} ({} seeds, retry limit {})",
            scrap.name,
            scrap.seeds.len(),
            scrap.retry_limit.unwrap_or(config.engine.retry_limit)
        );
        for seed in &scrap.seeds {
            println!("    * {}", seed);
        }
        let fields: Vec<&str> = scrap.fields.iter().map(|f| f.name.as_str()).collect();
        println!("    fields: {}", fields.join(", "));
        if let Some(follow) = &scrap.follow_selector {
            println!("    follows: {}", follow);
        }
        for output in &scrap.outputs {
            println!("    output: {}", describe_output(output));
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start scraping with {} seed URLs",
        config.scraps.iter().map(|s| s.seeds.len()).sum::<usize>()
    );
}

/// Handles the main scrape operation and prints a per-task report
async fn handle_scrape(config: &Config) -> anyhow::Result<()> {
    let seed_count: usize = config.scraps.iter().map(|s| s.seeds.len()).sum();
    tracing::info!(
        "Scraps: {}, total seed URLs: {}",
        config.scraps.len(),
        seed_count
    );

    let engine = crawler::run(config).await.context("Scrape failed")?;

    println!("=== Scrapyard Summary ===\n");
    for task in engine.tasks() {
        let stats = task.stats();
        println!("{}:", task.name());
        println!("  Pages fetched: {}", stats.fetched);
        println!("  Failed attempts: {}", stats.fetch_failures);
        println!("  Dropped requests: {}", stats.dropped);
        println!("  Records written: {}", stats.records_written);
    }

    let failed: Vec<_> = engine.failed_requests().collect();
    if !failed.is_empty() {
        println!("\nFailed URLs ({}):", failed.len());
        for (task, failure) in failed {
            println!(
                "  [{}] {} after {} attempt(s): {} ({})",
                task,
                failure.request.url(),
                failure.request.fail_count(),
                failure.error,
                failure.failed_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    tracing::info!("Scrape completed successfully");
    Ok(())
}
