//! Per-task request queue and retry policy
//!
//! The queue is strictly FIFO. A failed request that still has attempts left
//! goes to the back of the queue, so every other pending request of the task is
//! serviced before the retry.

use crate::crawler::request::Request;
use std::collections::VecDeque;

/// Outcome of handing a failed request to the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-queued at the tail; carries the updated fail count
    Requeued { fail_count: u32 },

    /// Retry limit reached; the request will not be fetched again
    Dropped { fail_count: u32 },
}

impl RetryDecision {
    pub fn fail_count(&self) -> u32 {
        match self {
            Self::Requeued { fail_count } | Self::Dropped { fail_count } => *fail_count,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }
}

/// FIFO queue of pending requests
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<Request>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request at the tail
    pub fn push(&mut self, request: Request) {
        tracing::trace!("Queued {}", request);
        self.pending.push_back(request);
    }

    /// Pops the head of the queue
    pub fn pop(&mut self) -> Option<Request> {
        self.pending.pop_front()
    }

    /// Applies the retry policy to a request whose fetch just failed
    ///
    /// The fail count grows by exactly one. While it stays below `retry_limit`
    /// the request is re-queued at the tail; otherwise it is handed back to the
    /// caller inside `Err` so it can be recorded as permanently failed.
    pub fn fail(
        &mut self,
        mut request: Request,
        retry_limit: u32,
    ) -> Result<RetryDecision, (RetryDecision, Request)> {
        request.increment_fail_count();
        let fail_count = request.fail_count();

        if fail_count < retry_limit {
            self.pending.push_back(request);
            Ok(RetryDecision::Requeued { fail_count })
        } else {
            Err((RetryDecision::Dropped { fail_count }, request))
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterates pending requests from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.pending.iter()
    }
}
