//! Explorer request and snapshot types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rootscan endpoints, each a path segment under the API base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Address,
    AddressTokenBalances,
    AddressNftBalances,
    NativeTransfers,
    EvmTransfers,
    EvmTransactions,
    EvmTransaction,
    Extrinsics,
    Extrinsic,
    Blocks,
    Block,
    Events,
    Event,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::AddressTokenBalances => "address-token-balances",
            Self::AddressNftBalances => "address-nft-balances",
            Self::NativeTransfers => "native-transfers",
            Self::EvmTransfers => "evm-transfers",
            Self::EvmTransactions => "evm-transactions",
            Self::EvmTransaction => "evm-transaction",
            Self::Extrinsics => "extrinsics",
            Self::Extrinsic => "extrinsic",
            Self::Blocks => "blocks",
            Self::Block => "block",
            Self::Events => "events",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Optional paging fields merged into list request bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl Pagination {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    pub fn per_page(per_page: u32) -> Self {
        Self {
            page: None,
            per_page: Some(per_page),
        }
    }
}

/// Everything the portfolio view shows for one address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub address: String,
    pub address_data: serde_json::Value,
    pub token_balances: serde_json::Value,
    pub nft_balances: serde_json::Value,
    pub native_transfers: serde_json::Value,
    pub evm_transfers: serde_json::Value,
    pub extrinsics: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Number of items in a list-shaped field, zero when absent
    pub fn count(value: &serde_json::Value) -> usize {
        value.as_array().map(|a| a.len()).unwrap_or(0)
    }
}

/// Latest chain activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerOverview {
    pub evm_transactions: serde_json::Value,
    pub blocks: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

/// The `data` member of a Rootscan response, or Null
pub fn data_of(body: &serde_json::Value) -> serde_json::Value {
    body.get("data").cloned().unwrap_or(serde_json::Value::Null)
}
