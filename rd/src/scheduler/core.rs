//! Scheduler implementation

use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use super::error::SchedulerError;
use super::queue::{
    DelayedRequest, OperationJob, QueueEntry, QueueState, QueuedRequest, RequestId, RequestState, SchedulerStats,
};
use crate::transport::TransportError;

/// Fallback when a backoff would overflow the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365);

/// Internal state protected by mutex
struct SchedulerInner {
    /// FIFO of requests waiting for dispatch
    queue: VecDeque<QueuedRequest>,

    /// Rate-limited requests waiting out their backoff
    backing_off: Vec<DelayedRequest>,

    /// The request whose attempt is running, if any
    in_flight: Option<QueueEntry>,

    /// Whether a drain task is alive
    draining: bool,

    /// When the most recent attempt finished
    last_settled: Option<Instant>,

    next_id: u64,

    stats: SchedulerStats,
}

impl SchedulerInner {
    /// Move every request whose backoff has elapsed to the back of the queue,
    /// earliest deadline first
    fn promote_due(&mut self, now: Instant) {
        if self.backing_off.is_empty() {
            return;
        }

        let mut due: Vec<DelayedRequest> = Vec::new();
        let mut waiting = Vec::with_capacity(self.backing_off.len());
        for delayed in self.backing_off.drain(..) {
            if delayed.ready_at <= now {
                due.push(delayed);
            } else {
                waiting.push(delayed);
            }
        }
        self.backing_off = waiting;

        due.sort_by_key(|d| (d.ready_at, d.request.id));
        for delayed in due {
            debug!(id = %delayed.request.id, "promote_due: backoff elapsed, re-queueing");
            self.queue.push_back(delayed.request);
        }
        self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
    }

    fn earliest_retry(&self) -> Option<Instant> {
        self.backing_off.iter().map(|d| d.ready_at).min()
    }
}

/// What the drain loop does next
enum Step {
    Dispatch(QueuedRequest),
    Wait(Instant),
    Exit,
}

struct Shared {
    name: String,
    config: SchedulerConfig,
    inner: Mutex<SchedulerInner>,
    notify: Notify,
}

/// Serializes calls to a rate-limited remote API.
///
/// Requests run one at a time in FIFO order. Consecutive attempts are spaced
/// by at least `min_delay`, and rate-limited (HTTP 429) attempts are retried
/// after `min_delay * 2^retry_count` by re-entering at the back of the queue.
/// Cloning yields another handle to the same instance; separately constructed
/// schedulers share nothing.
#[derive(Clone)]
pub struct RequestScheduler {
    shared: Arc<Shared>,
}

impl RequestScheduler {
    /// Create a new scheduler with the given configuration
    pub fn new(name: impl Into<String>, config: SchedulerConfig) -> Self {
        let name = name.into();
        debug!(%name, ?config, "RequestScheduler::new: called");
        Self {
            shared: Arc::new(Shared {
                name,
                config,
                inner: Mutex::new(SchedulerInner {
                    queue: VecDeque::new(),
                    backing_off: Vec::new(),
                    in_flight: None,
                    draining: false,
                    last_settled: None,
                    next_id: 0,
                    stats: SchedulerStats::default(),
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configuration of this instance
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Queue an operation and wait for its final outcome
    pub async fn enqueue<T, F, Fut>(&self, label: impl Into<String>, operation: F) -> Result<T, SchedulerError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        self.enqueue_with_retry_count(label, 0, operation).await
    }

    /// Queue an operation that has already used `retry_count` of its retries
    pub async fn enqueue_with_retry_count<T, F, Fut>(
        &self,
        label: impl Into<String>,
        retry_count: u32,
        operation: F,
    ) -> Result<T, SchedulerError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let label = label.into();
        debug!(scheduler = %self.shared.name, %label, retry_count, "RequestScheduler::enqueue: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = OperationJob::new(operation, reply_tx);

        {
            let mut inner = self.shared.inner.lock().await;
            let now = Instant::now();

            // Anything whose backoff already elapsed was "re-submitted" before us
            inner.promote_due(now);

            let id = RequestId(inner.next_id);
            inner.next_id += 1;
            let state = if retry_count > 0 {
                RequestState::Retrying { attempt: retry_count }
            } else {
                RequestState::Pending
            };
            inner.queue.push_back(QueuedRequest {
                id,
                label,
                retry_count,
                state,
                enqueued_at: now,
                job: Box::new(job),
            });
            inner.stats.total_enqueued += 1;
            inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.queue.len());

            if inner.draining {
                debug!(scheduler = %self.shared.name, %id, "RequestScheduler::enqueue: drain active, appended");
            } else {
                debug!(scheduler = %self.shared.name, %id, "RequestScheduler::enqueue: starting drain");
                inner.draining = true;
                tokio::spawn(drain(self.shared.clone()));
            }
        }
        self.shared.notify.notify_one();

        reply_rx.await.map_err(|_| SchedulerError::Abandoned)?
    }

    /// Get current queue state
    pub async fn queue_state(&self) -> QueueState {
        debug!(scheduler = %self.shared.name, "RequestScheduler::queue_state: called");
        let inner = self.shared.inner.lock().await;
        QueueState {
            queued: inner.queue.len(),
            in_flight: inner.in_flight.is_some(),
            backing_off: inner.backing_off.len(),
            draining: inner.draining,
            stats: inner.stats.clone(),
        }
    }

    /// Get every live request: in flight first, then queued, then backing off
    pub async fn queue_details(&self) -> Vec<QueueEntry> {
        debug!(scheduler = %self.shared.name, "RequestScheduler::queue_details: called");
        let inner = self.shared.inner.lock().await;
        let now = Instant::now();

        let mut backing_off: Vec<_> = inner.backing_off.iter().collect();
        backing_off.sort_by_key(|d| (d.ready_at, d.request.id));

        inner
            .in_flight
            .iter()
            .cloned()
            .chain(inner.queue.iter().map(|r| r.entry(now)))
            .chain(backing_off.into_iter().map(|d| d.request.entry(now)))
            .collect()
    }

    /// Get the scheduler statistics
    pub async fn stats(&self) -> SchedulerStats {
        debug!(scheduler = %self.shared.name, "RequestScheduler::stats: called");
        self.shared.inner.lock().await.stats.clone()
    }
}

/// The single drain loop of a scheduler instance
async fn drain(shared: Arc<Shared>) {
    debug!(scheduler = %shared.name, "drain: started");
    let min_delay = shared.config.min_delay();

    loop {
        let step = {
            let mut inner = shared.inner.lock().await;
            let now = Instant::now();
            inner.promote_due(now);

            let pace_until = inner.last_settled.map(|t| t + min_delay).filter(|t| *t > now);

            if inner.queue.is_empty() {
                match inner.earliest_retry() {
                    Some(ready_at) => Step::Wait(ready_at),
                    None => {
                        inner.draining = false;
                        Step::Exit
                    }
                }
            } else if let Some(ready_at) = pace_until {
                Step::Wait(ready_at)
            } else if let Some(mut request) = inner.queue.pop_front() {
                request.state = RequestState::Dispatched;
                inner.in_flight = Some(request.entry(now));
                inner.stats.total_dispatched += 1;
                Step::Dispatch(request)
            } else {
                inner.draining = false;
                Step::Exit
            }
        };

        match step {
            Step::Exit => {
                debug!(scheduler = %shared.name, "drain: queue empty, exiting");
                return;
            }
            Step::Wait(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = shared.notify.notified() => {}
                }
            }
            Step::Dispatch(request) => dispatch(&shared, request).await,
        }
    }
}

/// Run one attempt and settle, retry or reject the request
async fn dispatch(shared: &Shared, mut request: QueuedRequest) {
    debug!(
        scheduler = %shared.name,
        id = %request.id,
        label = %request.label,
        retry_count = request.retry_count,
        "dispatch: called"
    );

    let outcome = match AssertUnwindSafe(request.job.attempt()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            warn!(scheduler = %shared.name, id = %request.id, label = %request.label, %reason, "Operation panicked");
            Err(TransportError::other(format!("operation panicked: {}", reason)))
        }
    };

    let mut inner = shared.inner.lock().await;
    let now = Instant::now();
    inner.last_settled = Some(now);
    inner.in_flight = None;

    match outcome {
        Ok(()) => {
            request.state = RequestState::Settled;
            inner.stats.total_succeeded += 1;
            debug!(scheduler = %shared.name, id = %request.id, "dispatch: succeeded");
        }
        Err(err) if err.is_rate_limit() && request.retry_count < shared.config.max_retries => {
            inner.stats.total_rate_limited += 1;
            inner.stats.total_retried += 1;
            let backoff = shared.config.backoff(request.retry_count);
            request.retry_count += 1;
            request.state = RequestState::Retrying {
                attempt: request.retry_count,
            };
            warn!(
                scheduler = %shared.name,
                id = %request.id,
                label = %request.label,
                retry = request.retry_count,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Rate limited, retrying after backoff"
            );
            let ready_at = now.checked_add(backoff).unwrap_or_else(|| now + FAR_FUTURE);
            inner.backing_off.push(DelayedRequest { ready_at, request });
        }
        Err(err) => {
            let error = if err.is_rate_limit() {
                inner.stats.total_rate_limited += 1;
                SchedulerError::RetriesExhausted {
                    attempts: request.retry_count + 1,
                    source: err,
                }
            } else {
                SchedulerError::Failed(err)
            };
            inner.stats.total_failed += 1;
            drop(inner);

            warn!(
                scheduler = %shared.name,
                id = %request.id,
                label = %request.label,
                error = %error,
                "Request failed"
            );
            request.state = RequestState::Settled;
            request.job.reject(error);
            return;
        }
    }

    if inner.queue.is_empty() && inner.backing_off.is_empty() {
        info!(scheduler = %shared.name, "Queue drained");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
