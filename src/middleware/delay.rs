use crate::crawler::{Request, TaskInfo};
use crate::middleware::Middleware;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Waits a fixed time before every request
///
/// A zero delay never sleeps.
#[derive(Debug, Clone, Copy)]
pub struct DelayMiddleware {
    delay: Duration,
}

impl DelayMiddleware {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Middleware for DelayMiddleware {
    fn name(&self) -> String {
        "delay".to_string()
    }

    async fn before_request(&self, _task: &TaskInfo, request: &Request) -> Result<()> {
        if self.delay.is_zero() {
            return Ok(());
        }
        tracing::debug!("Waiting {:?} before {}", self.delay, request.url());
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
