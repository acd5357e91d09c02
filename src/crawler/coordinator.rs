//! Engine - main scrape orchestration logic
//!
//! This module contains the loop that drives every registered task:
//! - Running the task's middleware hooks around the task and each fetch
//! - Fetching requests through the transport
//! - Handing pages to the scraper and records to the writers
//! - Applying the retry policy to failed fetches

use crate::config::{BrowserConfig, HttpConfig};
use crate::crawler::fetcher::{HttpTransport, Transport};
use crate::crawler::task::{FailedRequest, Task, TaskState};
use crate::crawler::browser::BrowserTransport;
use crate::crawler::RetryDecision;
use crate::Result;

/// Runs tasks one after another against a single transport
///
/// Tasks run in registration order and each is drained completely before the
/// next one starts. Within a task, requests are fetched one at a time.
///
/// # Example
///
/// ```no_run
/// use scrapyard::crawler::scraper_fn;
/// use scrapyard::output::LogWriter;
/// use scrapyard::{Engine, LogMiddleware, Record, Task};
///
/// # async fn run() -> scrapyard::Result<()> {
/// let task = Task::new(
///     "titles",
///     scraper_fn(|response, _| {
///         let title = response.css("title", |e| e.text())?;
///         Ok(vec![Record::new().with("title", title)])
///     }),
/// )
/// .with_request("https://example.com/")
/// .with_middleware(LogMiddleware::new())
/// .with_writer(LogWriter::new());
///
/// let mut engine = Engine::builder().build()?;
/// engine.scrap(task).start().await?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    transport: Box<dyn Transport>,
    tasks: Vec<Task>,
}

impl Engine {
    /// Creates an engine that fetches through `transport`
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_boxed_transport(Box::new(transport))
    }

    pub fn with_boxed_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            tasks: Vec::new(),
        }
    }

    /// Starts building an engine with a default transport
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Registers a task; the same scrap may be registered more than once
    pub fn scrap(&mut self, task: Task) -> &mut Self {
        tracing::debug!("Registered task '{}'", task.name());
        self.tasks.push(task);
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// First registered task with this name
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    /// Requests dropped by any task, with the name of their task
    pub fn failed_requests(&self) -> impl Iterator<Item = (&str, &FailedRequest)> {
        self.tasks
            .iter()
            .flat_map(|task| task.failed_requests().iter().map(move |f| (task.name(), f)))
    }

    /// Runs every registered task to completion
    ///
    /// Fetch failures are handled by the retry policy and never returned.
    /// Errors from middleware hooks, scrapers and writers abort the run.
    /// The transport is closed in both cases.
    pub async fn start(&mut self) -> Result<()> {
        let transport = self.transport.as_ref();
        let mut result = Ok(());

        for task in self.tasks.iter_mut() {
            if let Err(e) = run_task(transport, task).await {
                tracing::error!("Task '{}' aborted: {}", task.name(), e);
                result = Err(e);
                break;
            }
        }

        if let Err(e) = transport.close().await {
            tracing::warn!("Failed to close transport: {}", e);
        }

        result
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("tasks", &self.tasks).finish()
    }
}

/// Brackets one task with its `before_all` and `after_all` hooks
async fn run_task(transport: &dyn Transport, task: &mut Task) -> Result<()> {
    task.state = TaskState::Running;
    tracing::info!(
        "Starting task '{}' with {} request(s)",
        task.name(),
        task.pending()
    );
    let start_time = std::time::Instant::now();

    let info = task.info();
    task.middlewares.before_all(&info).await?;

    process_task(transport, task).await?;

    let info = task.info();
    task.middlewares.after_all(&info).await?;
    task.state = TaskState::Done;

    let stats = task.stats();
    tracing::info!(
        "Task '{}' done in {:.2}s: {} fetched, {} failed attempts, {} dropped, {} records",
        task.name(),
        start_time.elapsed().as_secs_f64(),
        stats.fetched,
        stats.fetch_failures,
        stats.dropped,
        stats.records_written
    );
    Ok(())
}

/// Drains the task's queue
///
/// Each request goes through `before_request`, the fetch, `after_request`,
/// the scraper and the writers. A failed fetch skips everything after it and
/// goes to the retry policy.
async fn process_task(transport: &dyn Transport, task: &mut Task) -> Result<()> {
    while let Some(request) = task.next_request() {
        let info = task.info();
        task.middlewares.before_request(&info, &request).await?;

        let response = match transport.fetch(&request).await {
            Ok(response) => response,
            Err(error) => {
                let url = request.url().to_string();
                let decision = if error.is_retryable() {
                    task.fail_request_with(request, &error)
                } else {
                    task.abandon_request(request, &error)
                };

                tracing::error!(
                    url = %url,
                    fail_count = decision.fail_count(),
                    "Failed to fetch {}: {}",
                    url,
                    error
                );
                if let RetryDecision::Dropped { fail_count } = decision {
                    tracing::warn!("Giving up on {} after {} attempt(s)", url, fail_count);
                }
                continue;
            }
        };

        task.stats.fetched += 1;
        task.middlewares
            .after_request(&info, &request, &response)
            .await?;

        let records = task.parse(&response)?;
        tracing::debug!(
            "{} gave {} record(s), {} request(s) pending",
            response.url(),
            records.len(),
            task.pending()
        );
        for record in &records {
            task.deliver(record)?;
        }
    }

    tracing::info!("Queue of task '{}' is empty", task.name());
    Ok(())
}

/// Builder for an [`Engine`] with one of the stock transports
#[derive(Default)]
pub struct EngineBuilder {
    http: HttpConfig,
    browser: Option<BrowserConfig>,
    transport: Option<Box<dyn Transport>>,
}

impl EngineBuilder {
    /// Settings for the HTTP transport (the default)
    pub fn http(mut self, config: HttpConfig) -> Self {
        self.http = config;
        self
    }

    /// Fetches through headless Chrome instead of plain HTTP
    pub fn browser(mut self, config: BrowserConfig) -> Self {
        self.browser = Some(config);
        self
    }

    /// Uses a custom transport; overrides the other settings
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Result<Engine> {
        let transport: Box<dyn Transport> = match (self.transport, self.browser) {
            (Some(transport), _) => transport,
            (None, Some(browser)) => Box::new(BrowserTransport::new(&browser)?),
            (None, None) => Box::new(HttpTransport::new(&self.http)?),
        };
        Ok(Engine::with_boxed_transport(transport))
    }
}
