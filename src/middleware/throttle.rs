use crate::crawler::{Request, TaskInfo};
use crate::middleware::Middleware;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Keeps a minimum interval between two requests to the same host
///
/// Requests to different hosts do not wait on each other. Wrap it in an
/// `Arc` and register it on several tasks to throttle across them.
#[derive(Debug)]
pub struct ThrottleMiddleware {
    min_interval: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl ThrottleMiddleware {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserves the next slot for `host` and returns how long to wait for it
    ///
    /// Returns None if a request can be made now.
    fn reserve(&self, host: &str, now: Instant) -> Option<Duration> {
        let mut last_request = match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let wait = last_request.get(host).and_then(|last| {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.min_interval {
                Some(self.min_interval - elapsed)
            } else {
                None
            }
        });

        last_request.insert(host.to_string(), now + wait.unwrap_or_default());
        wait
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

#[async_trait]
impl Middleware for ThrottleMiddleware {
    fn name(&self) -> String {
        "throttle".to_string()
    }

    async fn before_request(&self, _task: &TaskInfo, request: &Request) -> Result<()> {
        let Some(host) = host_of(request.url()) else {
            return Ok(());
        };

        if let Some(wait) = self.reserve(&host, Instant::now()) {
            tracing::debug!("Throttling {} for {:?}", host, wait);
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }
}
