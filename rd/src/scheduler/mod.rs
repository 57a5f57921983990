//! Request scheduler for rate-limited remote APIs
//!
//! Serializes outbound calls with a minimum inter-dispatch delay and retries
//! rate-limited calls with bounded exponential backoff. Each client owns its
//! own instance; there is no shared global budget.

mod config;
mod core;
mod error;
mod queue;

pub use config::SchedulerConfig;
pub use core::RequestScheduler;
pub use error::SchedulerError;
pub use queue::{QueueEntry, QueueState, RequestId, RequestState, SchedulerStats};
