//! Hooks around task and request processing
//!
//! A [`Middleware`] observes a task run: once before and after the whole
//! task, and before and after every successful fetch. Hooks cannot change or
//! cancel a request; an `Err` from any hook aborts the run.

mod delay;
mod log;
mod throttle;

pub use delay::DelayMiddleware;
pub use log::LogMiddleware;
pub use throttle::ThrottleMiddleware;

use crate::crawler::{Request, TaskInfo};
use crate::page::Response;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Observer of a task run
///
/// Every hook defaults to doing nothing, so an implementation only overrides
/// what it needs.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Runs once before the task's first request
    async fn before_all(&self, _task: &TaskInfo) -> Result<()> {
        Ok(())
    }

    /// Runs once after the task's queue is drained
    async fn after_all(&self, _task: &TaskInfo) -> Result<()> {
        Ok(())
    }

    /// Runs before every fetch, including retries
    async fn before_request(&self, _task: &TaskInfo, _request: &Request) -> Result<()> {
        Ok(())
    }

    /// Runs after every successful fetch, before parsing
    async fn after_request(
        &self,
        _task: &TaskInfo,
        _request: &Request,
        _response: &Response,
    ) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> String {
        (**self).name()
    }

    async fn before_all(&self, task: &TaskInfo) -> Result<()> {
        (**self).before_all(task).await
    }

    async fn after_all(&self, task: &TaskInfo) -> Result<()> {
        (**self).after_all(task).await
    }

    async fn before_request(&self, task: &TaskInfo, request: &Request) -> Result<()> {
        (**self).before_request(task, request).await
    }

    async fn after_request(
        &self,
        task: &TaskInfo,
        request: &Request,
        response: &Response,
    ) -> Result<()> {
        (**self).after_request(task, request, response).await
    }
}

/// Ordered middlewares of one task
///
/// Each hook runs the middlewares in registration order and stops at the
/// first error.
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        tracing::debug!("Registering middleware {}", middleware.name());
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub async fn before_all(&self, task: &TaskInfo) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.before_all(task).await?;
        }
        Ok(())
    }

    pub async fn after_all(&self, task: &TaskInfo) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.after_all(task).await?;
        }
        Ok(())
    }

    pub async fn before_request(&self, task: &TaskInfo, request: &Request) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.before_request(task, request).await?;
        }
        Ok(())
    }

    pub async fn after_request(
        &self,
        task: &TaskInfo,
        request: &Request,
        response: &Response,
    ) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.after_request(task, request, response).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
