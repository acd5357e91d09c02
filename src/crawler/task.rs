//! Task definition: what to fetch, how to parse it and where records go

use crate::crawler::request::Request;
use crate::crawler::scheduler::{RequestQueue, RetryDecision};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::output::{Record, Writer};
use crate::page::Response;
use crate::{FetchError, Result};
use chrono::{DateTime, Utc};

/// Default number of fetch attempts per request
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Turns a fetched page into records and follow-up requests
///
/// `parse` must not fetch anything itself; new pages go through the
/// [`Frontier`] and are fetched by the engine later.
pub trait Scraper: Send {
    fn parse(&mut self, response: &Response, frontier: &mut Frontier<'_>) -> Result<Vec<Record>>;
}

/// [`Scraper`] backed by a closure, see [`scraper_fn`]
pub struct FnScraper<F>(F);

/// Wraps a closure as a [`Scraper`]
///
/// # Example
///
/// ```
/// use scrapyard::crawler::scraper_fn;
/// use scrapyard::{Record, Task};
///
/// let task = Task::new(
///     "titles",
///     scraper_fn(|response, _frontier| {
///         let title = response.document().title().unwrap_or_default();
///         Ok(vec![Record::new().with("title", title)])
///     }),
/// )
/// .with_request("https://example.com/");
/// assert_eq!(task.pending(), 1);
/// ```
pub fn scraper_fn<F>(f: F) -> FnScraper<F>
where
    F: FnMut(&Response, &mut Frontier<'_>) -> Result<Vec<Record>> + Send,
{
    FnScraper(f)
}

impl<F> Scraper for FnScraper<F>
where
    F: FnMut(&Response, &mut Frontier<'_>) -> Result<Vec<Record>> + Send,
{
    fn parse(&mut self, response: &Response, frontier: &mut Frontier<'_>) -> Result<Vec<Record>> {
        (self.0)(response, frontier)
    }
}

/// Handle a scraper uses to queue follow-up requests while parsing
pub struct Frontier<'a> {
    queue: &'a mut RequestQueue,
}

impl<'a> Frontier<'a> {
    pub(crate) fn new(queue: &'a mut RequestQueue) -> Self {
        Self { queue }
    }

    /// Queues a request at the tail of the task's queue
    pub fn add_request(&mut self, request: Request) {
        self.queue.push(request);
    }

    /// Queues a GET request for `url`
    pub fn follow(&mut self, url: impl Into<String>) {
        self.add_request(Request::new(url));
    }

    /// Requests still waiting in the task's queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Lifecycle of a task within an engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskState {
    #[default]
    Idle,
    Running,
    Done,
}

/// Counters collected while a task runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Successful fetches
    pub fetched: u64,
    /// Failed fetch attempts, retried or not
    pub fetch_failures: u64,
    /// Requests given up on
    pub dropped: u64,
    /// Records handed to the writers
    pub records_written: u64,
}

/// A request that was given up on, with the last error it hit
#[derive(Debug, Clone)]
pub struct FailedRequest {
    pub request: Request,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Snapshot of a task handed to middleware hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    /// Requests waiting in the queue
    pub pending: usize,
    pub retry_limit: u32,
}

/// A scraper with its queue, writers and middlewares
///
/// Build one with [`Task::new`] and the `with_*` builders, then register it on
/// an [`Engine`](crate::Engine).
pub struct Task {
    name: String,
    scraper: Box<dyn Scraper>,
    pub(super) queue: RequestQueue,
    writers: Vec<Box<dyn Writer>>,
    pub(super) middlewares: MiddlewareChain,
    retry_limit: u32,
    pub(super) state: TaskState,
    pub(super) stats: TaskStats,
    failed: Vec<FailedRequest>,
}

impl Task {
    pub fn new(name: impl Into<String>, scraper: impl Scraper + 'static) -> Self {
        Self {
            name: name.into(),
            scraper: Box::new(scraper),
            queue: RequestQueue::new(),
            writers: Vec::new(),
            middlewares: MiddlewareChain::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            state: TaskState::Idle,
            stats: TaskStats::default(),
            failed: Vec::new(),
        }
    }

    /// Adds a writer; records go to writers in the order they were added
    pub fn with_writer(mut self, writer: impl Writer + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    /// Adds an already boxed writer
    pub fn with_boxed_writer(mut self, writer: Box<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Sets the number of fetch attempts per request; values below 1 count as 1
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    /// Seeds the queue with a request or a URL
    pub fn with_request(mut self, request: impl Into<Request>) -> Self {
        self.add_request(request);
        self
    }

    pub fn add_request(&mut self, request: impl Into<Request>) {
        self.queue.push(request.into());
    }

    /// Takes the next request off the head of the queue
    pub fn next_request(&mut self) -> Option<Request> {
        self.queue.pop()
    }

    /// Hands a failed request to the retry policy
    ///
    /// Increments its fail count, then either re-queues it at the tail or,
    /// once the retry limit is reached, drops it into the failed list.
    pub fn fail_request(&mut self, request: Request) -> RetryDecision {
        self.fail_request_with(request, "retry limit reached")
    }

    /// Like [`Task::fail_request`], recording `error` if the request is dropped
    pub fn fail_request_with(&mut self, request: Request, error: impl ToString) -> RetryDecision {
        self.stats.fetch_failures += 1;
        match self.queue.fail(request, self.retry_limit) {
            Ok(decision) => decision,
            Err((decision, request)) => {
                self.record_failed(request, error.to_string());
                decision
            }
        }
    }

    /// Gives up on a request whose failure a retry cannot fix
    pub fn abandon_request(&mut self, mut request: Request, error: &FetchError) -> RetryDecision {
        self.stats.fetch_failures += 1;
        request.increment_fail_count();
        let fail_count = request.fail_count();
        self.record_failed(request, error.to_string());
        RetryDecision::Dropped { fail_count }
    }

    fn record_failed(&mut self, request: Request, error: String) {
        self.stats.dropped += 1;
        self.failed.push(FailedRequest {
            request,
            error,
            failed_at: Utc::now(),
        });
    }

    /// Runs the scraper over a fetched page
    pub fn parse(&mut self, response: &Response) -> Result<Vec<Record>> {
        let mut frontier = Frontier::new(&mut self.queue);
        self.scraper.parse(response, &mut frontier)
    }

    /// Writes a record to every writer, in registration order
    pub fn deliver(&mut self, record: &Record) -> Result<()> {
        for writer in &mut self.writers {
            writer.write(record)?;
        }
        self.stats.records_written += 1;
        Ok(())
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            pending: self.queue.len(),
            retry_limit: self.retry_limit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Requests waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    /// Requests given up on, oldest first
    pub fn failed_requests(&self) -> &[FailedRequest] {
        &self.failed
    }

    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("pending", &self.queue.len())
            .field("writers", &self.writers.len())
            .field("middlewares", &self.middlewares)
            .field("retry_limit", &self.retry_limit)
            .field("state", &self.state)
            .finish()
    }
}
