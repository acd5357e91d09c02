//! Scrapyard: a queue-driven web scraping engine
//!
//! Tasks hold a FIFO queue of requests, a parser, writers and middlewares.
//! The [`Engine`] drains each task in turn, brackets every fetch with the
//! task's middleware hooks, retries failed fetches a bounded number of times
//! and routes parsed records to every writer of the task.

pub mod config;
pub mod crawler;
pub mod middleware;
pub mod output;
pub mod page;
pub mod scrapers;

use thiserror::Error;

/// Main error type for Scrapyard operations
///
/// [`Engine::start`] recovers fetch failures with its retry policy, so the
/// `Fetch` variant only shows up when a [`Transport`] is driven directly. What
/// escapes a run is a programmer error: a bad selector, a missing link
/// attribute, a failing hook or writer.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Element has no href attribute: {element}")]
    InvalidLink { element: String },

    #[error("Element has no src attribute: {element}")]
    InvalidImage { element: String },

    #[error("Middleware '{middleware}' failed: {message}")]
    Middleware { middleware: String, message: String },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Transport-level failures
///
/// Every variant except [`FetchError::NotFound`] and [`FetchError::InvalidUrl`]
/// is retried by the engine until the task's retry limit is reached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{url} not found")]
    NotFound { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Returns false for failures that a retry cannot fix
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound { .. } | Self::InvalidUrl { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Scrapyard operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    BrowserTransport, Engine, EngineBuilder, FailedRequest, Frontier, HttpTransport, Method,
    Request, RequestQueue, RetryDecision, Scraper, Task, TaskInfo, TaskState, TaskStats,
    Transport,
};
pub use middleware::{DelayMiddleware, LogMiddleware, Middleware, ThrottleMiddleware};
pub use output::{Record, Writer};
pub use page::{Document, Element, Image, Link, Response};
