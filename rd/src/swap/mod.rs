//! ChangeNOW token swaps

mod client;
mod types;

pub use client::{SwapClient, SwapError};
pub use types::{
    MinAmount, SUPPORTED_TOKENS, SwapRequest, SwapTransaction, Token, TransactionHistory, TransactionStatus, find_token,
};
