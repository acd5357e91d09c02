//! Browser-backed transport
//!
//! Pages are rendered by Chrome driven over the DevTools protocol with
//! `chromiumoxide`. The browser is launched (or a running one is attached to)
//! on the first fetch and shut down by [`Transport::close`]. Chrome does not
//! report HTTP status codes here, so responses carry no status.

use crate::config::BrowserConfig;
use crate::crawler::fetcher::Transport;
use crate::crawler::request::{Method, Request};
use crate::page::Response;
use crate::{ConfigError, FetchError};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig as LaunchConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

/// A running browser and the task pumping its DevTools connection
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Fetches pages through headless Chrome
pub struct BrowserTransport {
    remote_url: Option<String>,
    executable: Option<PathBuf>,
    headless: bool,
    wait_after_request: Duration,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
}

impl BrowserTransport {
    /// Creates a transport from `config`
    ///
    /// Nothing is launched until the first fetch.
    pub fn new(config: &BrowserConfig) -> crate::Result<Self> {
        if let Some(remote) = &config.remote_url {
            Url::parse(remote).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid browser remote-url: {}", e))
            })?;
        }

        Ok(Self {
            remote_url: config.remote_url.clone(),
            executable: config.executable.as_ref().map(PathBuf::from),
            headless: config.headless,
            wait_after_request: Duration::from_millis(config.wait_after_request_ms),
            client: reqwest::Client::builder().build()?,
            session: Mutex::new(None),
        })
    }

    /// Whether a browser is currently launched or attached
    pub async fn is_running(&self) -> bool {
        self.session.lock().await.is_some()
    }

    fn launch_config(&self) -> Result<LaunchConfig, FetchError> {
        let mut builder = LaunchConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(FetchError::Browser)
    }

    /// Resolves the DevTools websocket of a running browser
    ///
    /// `ws://` URLs are used as they are; for `http://` the browser's
    /// `/json/version` endpoint is asked for the websocket URL.
    pub async fn debugger_url(&self, remote: &str) -> Result<String, FetchError> {
        if remote.starts_with("ws://") || remote.starts_with("wss://") {
            return Ok(remote.to_string());
        }

        let version_url = format!("{}/json/version", remote.trim_end_matches('/'));
        let version: Value = self
            .client
            .get(&version_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::Browser(format!("cannot reach {}: {}", version_url, e)))?
            .json()
            .await
            .map_err(|e| FetchError::Browser(format!("unreadable {}: {}", version_url, e)))?;

        version
            .get("webSocketDebuggerUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::Browser(format!("{} has no webSocketDebuggerUrl", version_url))
            })
    }

    async fn start(&self) -> Result<Session, FetchError> {
        let (browser, mut handler) = match &self.remote_url {
            Some(remote) => {
                let ws_url = self.debugger_url(remote).await?;
                tracing::info!("Connecting to browser at {}", ws_url);
                Browser::connect(ws_url).await.map_err(browser_error)?
            }
            None => {
                tracing::info!("Launching browser (headless={})", self.headless);
                Browser::launch(self.launch_config()?)
                    .await
                    .map_err(browser_error)?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Session { browser, handler })
    }

    /// Opens a tab, starting the browser first if needed
    async fn open_page(&self) -> Result<Page, FetchError> {
        let mut guard = self.session.lock().await;
        let session = match guard.take() {
            Some(session) => session,
            None => self.start().await?,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                *guard = Some(session);
                Ok(page)
            }
            Err(e) => {
                tracing::warn!("Browser is gone, a new one will be started: {}", e);
                session.handler.abort();
                Err(browser_error(e))
            }
        }
    }

    async fn navigate(&self, page: &Page, request: &Request, url: &Url) -> Result<(), CdpError> {
        match request.method() {
            Method::Get => {
                page.goto(url.as_str()).await?;
            }
            Method::Post => {
                page.set_content(post_form(url, request.body())).await?;
                page.find_element("button[type=submit]")
                    .await?
                    .click()
                    .await?;
                page.wait_for_navigation().await?;
            }
        }
        Ok(())
    }

    async fn render(
        &self,
        page: &Page,
        request: &Request,
        url: &Url,
    ) -> Result<Response, FetchError> {
        self.navigate(page, request, url)
            .await
            .map_err(browser_error)?;

        if !self.wait_after_request.is_zero() {
            tokio::time::sleep(self.wait_after_request).await;
        }

        let body = page.content().await.map_err(browser_error)?;
        let final_url = page
            .url()
            .await
            .map_err(browser_error)?
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        tracing::debug!("Rendered {} ({} bytes)", final_url, body.len());
        Ok(Response::new(final_url, None, body))
    }
}

fn browser_error(error: CdpError) -> FetchError {
    FetchError::Browser(error.to_string())
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Page holding a form that POSTs `body` to `url` when its button is clicked
fn post_form(url: &Url, body: &[(String, String)]) -> String {
    let inputs: String = body
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                escape_attr(name),
                escape_attr(value)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<html><body><form method="post" action="{}">{}"#,
            r#"<button type="submit">send</button></form></body></html>"#
        ),
        escape_attr(url.as_str()),
        inputs
    )
}

#[async_trait]
impl Transport for BrowserTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = Url::parse(request.url()).map_err(|e| FetchError::InvalidUrl {
            url: request.url().to_string(),
            message: e.to_string(),
        })?;

        let page = self.open_page().await?;
        let rendered = self.render(&page, request, &url).await;
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }
        rendered
    }

    async fn close(&self) -> Result<(), FetchError> {
        let Some(mut session) = self.session.lock().await.take() else {
            return Ok(());
        };

        // Attached browsers are left running.
        let closed = if self.remote_url.is_none() {
            let closed = session.browser.close().await.map(|_| ());
            if let Err(e) = session.browser.wait().await {
                tracing::debug!("Failed to wait for browser exit: {}", e);
            }
            closed
        } else {
            Ok(())
        };
        session.handler.abort();

        closed.map_err(browser_error)?;
        tracing::info!("Browser closed");
        Ok(())
    }
}

impl std::fmt::Debug for BrowserTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserTransport")
            .field("remote_url", &self.remote_url)
            .field("executable", &self.executable)
            .field("headless", &self.headless)
            .field("wait_after_request", &self.wait_after_request)
            .finish()
    }
}
