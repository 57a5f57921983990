//! Scheduler error types

use thiserror::Error;

use crate::transport::TransportError;

/// Errors delivered to a caller of [`RequestScheduler::enqueue`](super::RequestScheduler::enqueue)
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("still rate limited after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Failed(#[from] TransportError),

    #[error("request was dropped before it settled")]
    Abandoned,
}

impl SchedulerError {
    /// The underlying transport error, unchanged
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            SchedulerError::RetriesExhausted { source, .. } => Some(source),
            SchedulerError::Failed(err) => Some(err),
            SchedulerError::Abandoned => None,
        }
    }

    /// Consume self and return the underlying transport error
    pub fn into_transport(self) -> Option<TransportError> {
        match self {
            SchedulerError::RetriesExhausted { source, .. } => Some(source),
            SchedulerError::Failed(err) => Some(err),
            SchedulerError::Abandoned => None,
        }
    }

    /// HTTP status attached by the failing operation, if any
    pub fn status_code(&self) -> Option<u16> {
        self.transport().and_then(|e| e.status_code)
    }

    /// Check if the final failure was a rate limit
    pub fn is_rate_limit(&self) -> bool {
        self.transport().map(|e| e.is_rate_limit()).unwrap_or(false)
    }
}
