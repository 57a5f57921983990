//! ChangeNOW swap client

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{MinAmount, SwapRequest, SwapTransaction, TransactionStatus};
use crate::config::SwapConfig;
use crate::journal::{RecordedResponse, ResponseJournal, redact};
use crate::scheduler::{RequestScheduler, SchedulerConfig, SchedulerError};
use crate::transport::{TransportError, read_json};

/// Errors from swap calls
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid swap request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Request(#[from] SchedulerError),
}

impl SwapError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_rate_limit())
    }
}

/// ChangeNOW API client
#[derive(Clone)]
pub struct SwapClient {
    base_url: String,
    api_key: String,
    http: Client,
    scheduler: RequestScheduler,
    journal: ResponseJournal,
}

impl SwapClient {
    pub fn new(config: &SwapConfig, api_key: impl Into<String>, scheduler: RequestScheduler) -> Result<Self, TransportError> {
        debug!(base_url = %config.base_url, scheduler = %scheduler.name(), "SwapClient::new: called");
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
            scheduler,
            journal: ResponseJournal::new(),
        })
    }

    pub fn from_config(config: &SwapConfig, scheduler_config: SchedulerConfig) -> eyre::Result<Self> {
        let api_key = config.get_api_key()?;
        let scheduler = RequestScheduler::new("swap", scheduler_config);
        Ok(Self::new(config, api_key, scheduler)?)
    }

    pub fn journal(&self) -> &ResponseJournal {
        &self.journal
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    /// Smallest amount of `from` ChangeNOW accepts for a swap into `to`
    pub async fn min_amount(&self, from: &str, to: &str) -> Result<MinAmount, SwapError> {
        let (from, to) = check_pair(from, to)?;
        let url = format!("{}/min-amount/{}_{}?api_key={}", self.base_url, from, to, self.api_key);
        let key = format!("minAmount_{}_{}", from, to);
        self.call(Method::GET, url, None::<&SwapRequest>, key).await
    }

    /// Start a standard-flow swap
    pub async fn create_transaction(&self, request: &SwapRequest) -> Result<SwapTransaction, SwapError> {
        let (from, to) = check_pair(&request.from, &request.to)?;
        if request.amount.trim().is_empty() {
            return Err(SwapError::Invalid("amount is required".to_string()));
        }
        if request.address.trim().is_empty() {
            return Err(SwapError::Invalid("recipient address is required".to_string()));
        }

        let request = SwapRequest {
            from,
            to,
            ..request.clone()
        };
        info!(from = %request.from, to = %request.to, amount = %request.amount, "Creating swap transaction");
        let url = format!("{}/transactions/{}", self.base_url, self.api_key);
        self.call(Method::POST, url, Some(&request), "createTransaction").await
    }

    pub async fn transaction_status(&self, id: &str) -> Result<TransactionStatus, SwapError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SwapError::Invalid("transaction id is required".to_string()));
        }
        let url = format!("{}/transactions/{}/{}", self.base_url, id, self.api_key);
        self.call(Method::GET, url, None::<&SwapRequest>, format!("transactionStatus_{}", id))
            .await
    }

    async fn call<T, B>(&self, method: Method, url: String, body: Option<&B>, response_key: impl Into<String>) -> Result<T, SwapError>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize,
    {
        let response_key = response_key.into();
        let recorded_url = redact(&url, &self.api_key);
        debug!(%method, url = %recorded_url, %response_key, "SwapClient::call: called");

        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| SwapError::Request(SchedulerError::Failed(e.into())))?;
        let http = self.http.clone();
        let journal = self.journal.clone();
        let label = format!("{} {}", method, recorded_url);

        let value = self
            .scheduler
            .enqueue(label, move || {
                let http = http.clone();
                let journal = journal.clone();
                let method = method.clone();
                let url = url.clone();
                let recorded_url = recorded_url.clone();
                let body = body.clone();
                let response_key = response_key.clone();
                async move {
                    let mut request = http.request(method.clone(), &url).header("accept", "application/json");
                    if let Some(body) = &body {
                        request = request.json(body);
                    }
                    let data: Value = read_json(request.send().await?).await?;
                    journal
                        .record(
                            response_key,
                            RecordedResponse::new(recorded_url, method.as_str(), body, data.clone()),
                        )
                        .await;
                    Ok(data)
                }
            })
            .await?;

        serde_json::from_value(value).map_err(|e| SwapError::Request(SchedulerError::Failed(e.into())))
    }
}

fn check_pair(from: &str, to: &str) -> Result<(String, String), SwapError> {
    let from = from.trim().to_lowercase();
    let to = to.trim().to_lowercase();
    if from.is_empty() || to.is_empty() {
        return Err(SwapError::Invalid("both currencies are required".to_string()));
    }
    if from == to {
        return Err(SwapError::Invalid(format!("cannot swap {} into itself", from)));
    }
    Ok((from, to))
}
