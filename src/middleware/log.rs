use crate::crawler::{Request, TaskInfo};
use crate::middleware::Middleware;
use crate::page::Response;
use crate::Result;
use async_trait::async_trait;

/// Logs task start and finish, every request and every response status
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMiddleware;

impl LogMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for LogMiddleware {
    fn name(&self) -> String {
        "log".to_string()
    }

    async fn before_all(&self, task: &TaskInfo) -> Result<()> {
        tracing::info!(
            "Task '{}' started with {} queued request(s)",
            task.name,
            task.pending
        );
        Ok(())
    }

    async fn after_all(&self, task: &TaskInfo) -> Result<()> {
        tracing::info!("Task '{}' finished", task.name);
        Ok(())
    }

    async fn before_request(&self, _task: &TaskInfo, request: &Request) -> Result<()> {
        tracing::info!("Accessing {}", request);
        Ok(())
    }

    async fn after_request(
        &self,
        _task: &TaskInfo,
        _request: &Request,
        response: &Response,
    ) -> Result<()> {
        match response.status() {
            Some(status) => tracing::info!("{} responded with status {}", response.url(), status),
            None => tracing::info!("{} loaded", response.url()),
        }
        Ok(())
    }
}
