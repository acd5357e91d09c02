//! Engine module for fetching and processing pages
//!
//! This module contains the core scraping logic, including:
//! - Requests and the per-task FIFO queue with its retry policy
//! - Tasks, scrapers and the frontier they queue follow-ups through
//! - HTTP and headless browser transports
//! - The engine that drives tasks to completion

mod browser;
mod coordinator;
mod fetcher;
mod request;
mod scheduler;
mod task;

pub use browser::BrowserTransport;
pub use coordinator::{Engine, EngineBuilder};
pub use fetcher::{build_http_client, HttpTransport, Transport};
pub use request::{Method, Request};
pub use scheduler::{RequestQueue, RetryDecision};
pub use task::{
    scraper_fn, FailedRequest, FnScraper, Frontier, Scraper, Task, TaskInfo, TaskState,
    TaskStats, DEFAULT_RETRY_LIMIT,
};

use crate::config::{Config, TransportKind};
use crate::scrapers::task_from_config;
use crate::Result;

/// Builds an engine with one task per configured scrap
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(Engine)` - Engine with every scrap registered, in file order
/// * `Err(ScrapeError)` - A transport or an output could not be set up
pub fn engine_from_config(config: &Config) -> Result<Engine> {
    let mut builder = Engine::builder().http(config.http.clone());
    if config.engine.transport == TransportKind::Browser {
        builder = builder.browser(config.browser.clone().unwrap_or_default());
    }

    let mut engine = builder.build()?;
    for scrap in &config.scraps {
        engine.scrap(task_from_config(scrap, &config.engine)?);
    }
    Ok(engine)
}

/// Runs a complete scrape operation
///
/// Builds the engine from `config`, runs it, and hands it back so the caller
/// can read per-task statistics and failed requests.
pub async fn run(config: &Config) -> Result<Engine> {
    let mut engine = engine_from_config(config)?;
    engine.start().await?;
    Ok(engine)
}
