//! Shared doubles for the integration tests

use async_trait::async_trait;
use scrapyard::output::{OutputError, OutputResult};
use scrapyard::page::Response;
use scrapyard::{FetchError, Middleware, Record, Request, TaskInfo, Transport, Writer};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use url::Url;

/// Ordered log of what happened during a run
pub type Events = Arc<Mutex<Vec<String>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

#[derive(Default)]
struct MockState {
    scripted: HashMap<String, VecDeque<FetchError>>,
    always_fail: HashMap<String, FetchError>,
    bodies: HashMap<String, String>,
    fetched: Vec<String>,
    closed: bool,
}

/// Transport answering from a script instead of the network
///
/// Unscripted URLs succeed with a small page containing the URL.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    events: Option<Events>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs `fetch:<url>` into `events`
    pub fn with_events(mut self, events: Events) -> Self {
        self.events = Some(events);
        self
    }

    /// The next `times` fetches of `url` fail with `error`
    pub fn fail_times(&self, url: &str, times: usize, error: FetchError) {
        let mut state = self.state.lock().unwrap();
        let queue = state.scripted.entry(url.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    pub fn always_fail(&self, url: &str, error: FetchError) {
        self.state
            .lock()
            .unwrap()
            .always_fail
            .insert(url.to_string(), error);
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .bodies
            .insert(url.to_string(), body.to_string());
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched.clone()
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url().to_string();
        if let Some(events) = &self.events {
            events.lock().unwrap().push(format!("fetch:{}", url));
        }

        let mut state = self.state.lock().unwrap();
        state.fetched.push(url.clone());

        if let Some(error) = state.always_fail.get(&url) {
            return Err(error.clone());
        }
        if let Some(error) = state.scripted.get_mut(&url).and_then(|q| q.pop_front()) {
            return Err(error);
        }

        let body = state
            .bodies
            .get(&url)
            .cloned()
            .unwrap_or_else(|| format!("<html><body><p class=\"url\">{}</p></body></html>", url));
        let parsed = Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Response::new(parsed, Some(200), body))
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

pub fn server_error(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: 500,
    }
}

/// Middleware logging every hook call into `events`
pub struct RecordingMiddleware {
    pub label: &'static str,
    pub events: Events,
}

impl RecordingMiddleware {
    pub fn new(label: &'static str, events: Events) -> Self {
        Self { label, events }
    }

    fn push(&self, entry: String) {
        self.events.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl Middleware for RecordingMiddleware {
    fn name(&self) -> String {
        self.label.to_string()
    }

    async fn before_all(&self, task: &TaskInfo) -> scrapyard::Result<()> {
        self.push(format!("{}:before_all:{}", self.label, task.name));
        Ok(())
    }

    async fn after_all(&self, task: &TaskInfo) -> scrapyard::Result<()> {
        self.push(format!("{}:after_all:{}", self.label, task.name));
        Ok(())
    }

    async fn before_request(&self, _task: &TaskInfo, request: &Request) -> scrapyard::Result<()> {
        self.push(format!("{}:before_request:{}", self.label, request.url()));
        Ok(())
    }

    async fn after_request(
        &self,
        _task: &TaskInfo,
        request: &Request,
        _response: &Response,
    ) -> scrapyard::Result<()> {
        self.push(format!("{}:after_request:{}", self.label, request.url()));
        Ok(())
    }
}

/// Writer keeping records in memory, tagged with its label
#[derive(Clone)]
pub struct MemoryWriter {
    pub label: &'static str,
    pub log: Arc<Mutex<Vec<(String, Record)>>>,
    pub fail_on: HashSet<String>,
}

impl MemoryWriter {
    pub fn new(label: &'static str, log: Arc<Mutex<Vec<(String, Record)>>>) -> Self {
        Self {
            label,
            log,
            fail_on: HashSet::new(),
        }
    }
}

impl Writer for MemoryWriter {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        if let Some(url) = record.get("url").and_then(|v| v.as_str()) {
            if self.fail_on.contains(url) {
                return Err(OutputError::Write(format!("refusing {}", url)));
            }
        }
        self.log
            .lock()
            .unwrap()
            .push((self.label.to_string(), record.clone()));
        Ok(())
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        Ok(self
            .log
            .lock()
            .unwrap()
            .iter()
            .any(|(_, r)| r.matches(criteria)))
    }
}

/// Counts ERROR-level events
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
