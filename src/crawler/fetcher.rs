//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for the engine, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests and form-encoded POST requests
//! - Redirect following (bounded)
//! - Error classification into [`FetchError`]

use crate::config::HttpConfig;
use crate::crawler::request::{Method, Request};
use crate::page::Response;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Performs the actual fetch of a request
///
/// Implementations must not retry on their own; the engine's retry policy
/// decides what happens after a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one request
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;

    /// Releases whatever the transport holds; called once at the end of a run
    async fn close(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }

    async fn close(&self) -> Result<(), FetchError> {
        (**self).close().await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use scrapyard::config::HttpConfig;
/// use scrapyard::crawler::build_http_client;
///
/// let config = HttpConfig {
///     user_agent: "MyScraper/1.0 (+https://example.com/about)".to_string(),
///     ..HttpConfig::default()
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S) with `reqwest`
///
/// # Error classification
///
/// | Condition | Error |
/// |-----------|-------|
/// | HTTP 404, 410 | `NotFound` (not retried) |
/// | URL does not parse | `InvalidUrl` (not retried) |
/// | Other non-2xx | `Status` |
/// | Timeout | `Timeout` |
/// | Connection refused, DNS, TLS | `Connect` |
/// | Redirect loop, too many redirects, body errors | `Transport` |
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Uses an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = Url::parse(request.url()).map_err(|e| FetchError::InvalidUrl {
            url: request.url().to_string(),
            message: e.to_string(),
        })?;

        let builder = match request.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url).form(request.body()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(request.url(), e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(FetchError::NotFound {
                url: request.url().to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url().to_string(),
                status: status.as_u16(),
            });
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(request.url(), e))?;

        tracing::debug!("Fetched {} ({}, {} bytes)", final_url, status, body.len());

        Ok(headers.into_iter().fold(
            Response::new(final_url, Some(status.as_u16()), body),
            |response, (name, value)| response.with_header(&name, value),
        ))
    }
}

/// Maps a client error onto the engine's failure kinds
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
