//! Rootscan block-explorer access
//!
//! Payloads are kept as opaque JSON; only the `data` envelope member is
//! unwrapped for snapshots.

mod client;
mod types;

pub use client::ExplorerClient;
pub use types::{Endpoint, ExplorerOverview, Pagination, PortfolioSnapshot, data_of};
