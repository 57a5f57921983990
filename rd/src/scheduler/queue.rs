//! Queue types for the scheduler

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use super::error::SchedulerError;
use crate::transport::TransportError;

/// Identifier of a logical request, unique per scheduler instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Lifecycle of a queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Waiting in the queue for its first dispatch
    Pending,
    /// Attempt currently running
    Dispatched,
    /// Rate limited; waiting out backoff or re-queued for this attempt number
    Retrying { attempt: u32 },
    /// Caller has been answered
    Settled,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Dispatched => write!(f, "dispatched"),
            Self::Retrying { attempt } => write!(f, "retrying({})", attempt),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// One attempt-able unit of work with its caller's reply channel erased
#[async_trait]
pub(crate) trait Job: Send {
    /// Run one attempt. On success the caller has already been answered.
    async fn attempt(&mut self) -> Result<(), TransportError>;

    /// Answer the caller with a final failure
    fn reject(self: Box<Self>, error: SchedulerError);
}

/// Adapts a caller's operation and reply sender into a [`Job`]
pub(crate) struct OperationJob<T, F> {
    operation: F,
    reply: Option<oneshot::Sender<Result<T, SchedulerError>>>,
}

impl<T, F> OperationJob<T, F> {
    pub(crate) fn new(operation: F, reply: oneshot::Sender<Result<T, SchedulerError>>) -> Self {
        Self {
            operation,
            reply: Some(reply),
        }
    }
}

#[async_trait]
impl<T, F, Fut> Job for OperationJob<T, F>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
{
    async fn attempt(&mut self) -> Result<(), TransportError> {
        let value = (self.operation)().await?;
        let Some(reply) = self.reply.take() else {
            return Ok(());
        };
        if reply.send(Ok(value)).is_err() {
            debug!("OperationJob::attempt: caller stopped waiting");
        }
        Ok(())
    }

    fn reject(mut self: Box<Self>, error: SchedulerError) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        if reply.send(Err(error)).is_err() {
            debug!("OperationJob::reject: caller stopped waiting");
        }
    }
}

/// A request owned by the scheduler
pub(crate) struct QueuedRequest {
    pub id: RequestId,
    pub label: String,
    pub retry_count: u32,
    pub state: RequestState,
    pub enqueued_at: Instant,
    pub job: Box<dyn Job>,
}

impl QueuedRequest {
    pub(crate) fn entry(&self, now: Instant) -> QueueEntry {
        QueueEntry {
            id: self.id,
            label: self.label.clone(),
            retry_count: self.retry_count,
            state: self.state,
            wait_time: now.saturating_duration_since(self.enqueued_at),
        }
    }
}

/// A rate-limited request waiting for its backoff to elapse
pub(crate) struct DelayedRequest {
    pub ready_at: Instant,
    pub request: QueuedRequest,
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_enqueued: u64,
    pub total_dispatched: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub total_retried: u64,
    pub total_rate_limited: u64,
    pub peak_queue_depth: usize,
}

/// Snapshot of scheduler state
#[derive(Debug, Clone)]
pub struct QueueState {
    pub queued: usize,
    pub in_flight: bool,
    pub backing_off: usize,
    pub draining: bool,
    pub stats: SchedulerStats,
}

/// Per-request view for display
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: RequestId,
    pub label: String,
    pub retry_count: u32,
    pub state: RequestState,
    pub wait_time: Duration,
}
