//! Rootscan block-explorer client
//!
//! Every endpoint is a JSON POST carrying an `x-api-key` header. Calls are
//! funnelled through the client's own [`RequestScheduler`], so a burst of
//! lookups is paced and 429s are retried with backoff.

use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::types::{Endpoint, ExplorerOverview, Pagination, PortfolioSnapshot, data_of};
use crate::config::ExplorerConfig;
use crate::journal::{RecordedResponse, ResponseJournal};
use crate::scheduler::{RequestScheduler, SchedulerConfig, SchedulerError};
use crate::transport::{TransportError, read_json};

/// Rootscan API client
#[derive(Clone)]
pub struct ExplorerClient {
    base_url: String,
    api_key: String,
    http: Client,
    scheduler: RequestScheduler,
    journal: ResponseJournal,
}

impl ExplorerClient {
    /// Create a client with an explicit API key and scheduler
    pub fn new(config: &ExplorerConfig, api_key: impl Into<String>, scheduler: RequestScheduler) -> Result<Self, TransportError> {
        debug!(base_url = %config.base_url, scheduler = %scheduler.name(), "ExplorerClient::new: called");
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
            scheduler,
            journal: ResponseJournal::new(),
        })
    }

    /// Create a client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &ExplorerConfig, scheduler_config: SchedulerConfig) -> eyre::Result<Self> {
        let api_key = config.get_api_key()?;
        let scheduler = RequestScheduler::new("explorer", scheduler_config);
        Ok(Self::new(config, api_key, scheduler)?)
    }

    pub fn journal(&self) -> &ResponseJournal {
        &self.journal
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    /// POST `body` to `endpoint` through the scheduler and journal the reply
    /// under `response_key`
    pub async fn post(&self, endpoint: Endpoint, body: Value, response_key: impl Into<String>) -> Result<Value, SchedulerError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let response_key = response_key.into();
        debug!(%url, %response_key, "ExplorerClient::post: called");

        let http = self.http.clone();
        let api_key = self.api_key.clone();
        let journal = self.journal.clone();

        self.scheduler
            .enqueue(endpoint.path(), move || {
                let http = http.clone();
                let api_key = api_key.clone();
                let journal = journal.clone();
                let url = url.clone();
                let body = body.clone();
                let response_key = response_key.clone();
                async move {
                    let response = http
                        .post(&url)
                        .header("accept", "application/json")
                        .header("x-api-key", api_key)
                        .json(&body)
                        .send()
                        .await?;
                    let data: Value = read_json(response).await?;
                    journal
                        .record(response_key, RecordedResponse::new(url, "POST", Some(body), data.clone()))
                        .await;
                    Ok(data)
                }
            })
            .await
    }

    pub async fn address(&self, address: &str) -> Result<Value, SchedulerError> {
        self.post(Endpoint::Address, json!({ "address": address }), "address").await
    }

    pub async fn token_balances(&self, address: &str) -> Result<Value, SchedulerError> {
        self.post(Endpoint::AddressTokenBalances, json!({ "address": address }), "tokenBalances")
            .await
    }

    pub async fn nft_balances(&self, address: &str, page: Pagination) -> Result<Value, SchedulerError> {
        self.post(Endpoint::AddressNftBalances, with_address(address, page), "nftBalances")
            .await
    }

    pub async fn native_transfers(&self, address: &str, page: Pagination) -> Result<Value, SchedulerError> {
        self.post(Endpoint::NativeTransfers, with_address(address, page), "nativeTransfers")
            .await
    }

    pub async fn evm_transfers(&self, address: &str, page: Pagination) -> Result<Value, SchedulerError> {
        self.post(Endpoint::EvmTransfers, with_address(address, page), "evmTransfers")
            .await
    }

    /// Latest EVM transactions, optionally for one address
    pub async fn evm_transactions(&self, address: Option<&str>, page: Pagination) -> Result<Value, SchedulerError> {
        let body = match address {
            Some(address) => with_address(address, page),
            None => paged(page),
        };
        self.post(Endpoint::EvmTransactions, body, "evmTransactions").await
    }

    pub async fn evm_transaction(&self, hash: &str) -> Result<Value, SchedulerError> {
        self.post(
            Endpoint::EvmTransaction,
            json!({ "hash": hash }),
            format!("transactionDetail_{}", hash),
        )
        .await
    }

    pub async fn extrinsics(&self, address: &str, page: Pagination) -> Result<Value, SchedulerError> {
        self.post(Endpoint::Extrinsics, with_address(address, page), "extrinsics")
            .await
    }

    pub async fn extrinsic(&self, hash: &str) -> Result<Value, SchedulerError> {
        self.post(
            Endpoint::Extrinsic,
            json!({ "hash": hash }),
            format!("extrinsicDetail_{}", hash),
        )
        .await
    }

    pub async fn blocks(&self, page: Pagination) -> Result<Value, SchedulerError> {
        self.post(Endpoint::Blocks, paged(page), "blocks").await
    }

    pub async fn block(&self, block_number: u64) -> Result<Value, SchedulerError> {
        self.post(
            Endpoint::Block,
            json!({ "blockNumber": block_number }),
            format!("blockDetail_{}", block_number),
        )
        .await
    }

    /// Events emitted in a block
    pub async fn events(&self, block_number: u64) -> Result<Value, SchedulerError> {
        self.post(
            Endpoint::Events,
            json!({ "blockNumber": block_number }),
            format!("blockEvents_{}", block_number),
        )
        .await
    }

    /// A single event, ids look like `<block>-<index>`
    pub async fn event(&self, event_id: &str) -> Result<Value, SchedulerError> {
        self.post(
            Endpoint::Event,
            json!({ "eventId": event_id }),
            format!("eventDetail_{}", event_id),
        )
        .await
    }

    /// Fetch everything the portfolio view shows, one endpoint after another
    pub async fn fetch_portfolio(&self, address: &str) -> Result<PortfolioSnapshot, SchedulerError> {
        info!(%address, "Fetching portfolio");

        let address_data = data_of(&self.address(address).await?);
        let token_balances = data_of(&self.token_balances(address).await?);
        let nft_balances = data_of(&self.nft_balances(address, Pagination::page(0)).await?);
        let native_transfers = data_of(&self.native_transfers(address, Pagination::default()).await?);
        let evm_transfers = data_of(&self.evm_transfers(address, Pagination::default()).await?);
        let extrinsics = data_of(&self.extrinsics(address, Pagination::default()).await?);

        Ok(PortfolioSnapshot {
            address: address.to_string(),
            address_data,
            token_balances,
            nft_balances,
            native_transfers,
            evm_transfers,
            extrinsics,
            fetched_at: Utc::now(),
        })
    }

    /// Fetch latest transactions and blocks; both are queued at once and the
    /// scheduler paces them
    pub async fn fetch_overview(&self, per_page: u32) -> Result<ExplorerOverview, SchedulerError> {
        info!(per_page, "Fetching explorer overview");
        let page = Pagination::per_page(per_page);

        let (transactions, blocks) =
            futures::future::try_join(self.evm_transactions(None, page), self.blocks(page)).await?;

        Ok(ExplorerOverview {
            evm_transactions: data_of(&transactions),
            blocks: data_of(&blocks),
            fetched_at: Utc::now(),
        })
    }
}

fn paged(page: Pagination) -> Value {
    serde_json::to_value(page).unwrap_or_else(|_| json!({}))
}

fn with_address(address: &str, page: Pagination) -> Value {
    let mut body = paged(page);
    if let Some(map) = body.as_object_mut() {
        map.insert("address".to_string(), Value::String(address.to_string()));
    }
    body
}
