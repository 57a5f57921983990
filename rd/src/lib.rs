//! rootdash - Root Network portfolio, explorer and swap client
//!
//! Talks to the Rootscan block-explorer API and the ChangeNOW swap API. Both
//! services rate limit aggressively, so every call goes through a
//! [`RequestScheduler`] that runs requests one at a time, spaces them out and
//! retries HTTP 429 responses with exponential backoff.
//!
//! # Modules
//!
//! - [`scheduler`] - FIFO request scheduler with pacing and retry
//! - [`transport`] - Transport error boundary shared by all clients
//! - [`explorer`] - Rootscan client and snapshot types
//! - [`swap`] - ChangeNOW client and swap types
//! - [`journal`] - Recorded API responses
//! - [`export`] - JSON export of fetched data
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod explorer;
pub mod export;
pub mod journal;
pub mod scheduler;
pub mod swap;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ExplorerConfig, ExportConfig, SwapConfig};
pub use explorer::{Endpoint, ExplorerClient, ExplorerOverview, Pagination, PortfolioSnapshot};
pub use journal::{RecordedResponse, ResponseJournal};
pub use scheduler::{
    QueueEntry, QueueState, RequestId, RequestScheduler, RequestState, SchedulerConfig, SchedulerError, SchedulerStats,
};
pub use swap::{SwapClient, SwapError, SwapRequest, SwapTransaction, TransactionHistory, TransactionStatus};
pub use transport::{TransportError, TransportErrorKind};
