//! ChangeNOW request and response types

use serde::{Deserialize, Serialize};

/// A token offered for swapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub symbol: &'static str,
    pub name: &'static str,
    pub network: &'static str,
    pub decimals: u8,
}

pub const SUPPORTED_TOKENS: &[Token] = &[
    Token { symbol: "btc", name: "Bitcoin", network: "Bitcoin", decimals: 8 },
    Token { symbol: "eth", name: "Ethereum", network: "Ethereum", decimals: 18 },
    Token { symbol: "xrp", name: "XRP", network: "XRP Ledger", decimals: 6 },
    Token { symbol: "root", name: "Root Network", network: "Root Network", decimals: 6 },
    Token { symbol: "usdt", name: "Tether USD", network: "Multiple", decimals: 6 },
    Token { symbol: "bnb", name: "BNB", network: "BSC", decimals: 18 },
    Token { symbol: "ada", name: "Cardano", network: "Cardano", decimals: 6 },
    Token { symbol: "sol", name: "Solana", network: "Solana", decimals: 9 },
];

/// Look up a supported token by symbol, case-insensitively
pub fn find_token(symbol: &str) -> Option<&'static Token> {
    SUPPORTED_TOKENS.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinAmount {
    pub min_amount: f64,
}

/// Body of a create-transaction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub address: String,
    pub flow: String,
}

impl SwapRequest {
    /// Standard-flow request; symbols are lower-cased
    pub fn new(from: &str, to: &str, amount: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            from: from.to_lowercase(),
            to: to.to_lowercase(),
            amount: amount.into(),
            address: address.into(),
            flow: "standard".to_string(),
        }
    }
}

/// A created swap: where to send funds and what comes back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    pub id: String,
    pub payin_address: String,
    pub payout_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payin_extra_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payin_extra_id_name: Option<String>,
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub directed_amount: f64,
}

/// Current state of a swap as reported by ChangeNOW
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub id: String,
    pub status: String,
    pub payin_address: String,
    pub payout_address: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub expected_send_amount: Option<f64>,
    #[serde(default)]
    pub expected_receive_amount: Option<f64>,
    #[serde(default)]
    pub is_partner: bool,
}

/// Statuses seen during a session, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHistory {
    entries: Vec<TransactionStatus>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry with the same id in place, or insert at the front
    pub fn upsert(&mut self, status: TransactionStatus) {
        match self.entries.iter_mut().find(|e| e.id == status.id) {
            Some(existing) => *existing = status,
            None => self.entries.insert(0, status),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TransactionStatus> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[TransactionStatus] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str, state: &str) -> TransactionStatus {
        TransactionStatus {
            id: id.to_string(),
            status: state.to_string(),
            payin_address: "payin".to_string(),
            payout_address: "payout".to_string(),
            from_currency: "btc".to_string(),
            to_currency: "root".to_string(),
            updated_at: String::new(),
            created_at: String::new(),
            expected_send_amount: None,
            expected_receive_amount: None,
            is_partner: false,
        }
    }

    #[test]
    fn test_find_token() {
        assert_eq!(find_token("ROOT").unwrap().network, "Root Network");
        assert_eq!(find_token("eth").unwrap().decimals, 18);
        assert!(find_token("doge").is_none());
        assert_eq!(SUPPORTED_TOKENS.len(), 8);
    }

    #[test]
    fn test_swap_request_body() {
        let request = SwapRequest::new("BTC", "Root", "0.1", "rAddr");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": "btc",
                "to": "root",
                "amount": "0.1",
                "address": "rAddr",
                "flow": "standard"
            })
        );
    }

    #[test]
    fn test_swap_transaction_optional_extra_id() {
        let json = r#"{
            "id": "abc123",
            "payinAddress": "bc1q",
            "payoutAddress": "rAddr",
            "fromCurrency": "btc",
            "toCurrency": "root",
            "amount": 0.1,
            "directedAmount": 1500.5
        }"#;
        let tx: SwapTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.payin_extra_id, None);
        assert_eq!(tx.directed_amount, 1500.5);
    }

    #[test]
    fn test_history_upsert() {
        let mut history = TransactionHistory::new();
        history.upsert(status("a", "waiting"));
        history.upsert(status("b", "waiting"));
        assert_eq!(history.entries()[0].id, "b");

        history.upsert(status("a", "finished"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[1].id, "a");
        assert_eq!(history.get("a").unwrap().status, "finished");
    }
}
