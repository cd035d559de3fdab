//! Shared types for the wallet seam and contract calls

use karma_core::KarmaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Contract methods
// ============================================================================

/// Every method the Karma contract exposes to this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMethod {
    RegisterUser,
    AddMarket,
    Bet,
    Resolve,
    Deposit,
    GetCost,
    GetUser,
    GetUsers,
    GetMarket,
    GetMarkets,
}

impl ContractMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractMethod::RegisterUser => "register_user",
            ContractMethod::AddMarket => "add_market",
            ContractMethod::Bet => "bet",
            ContractMethod::Resolve => "resolve",
            ContractMethod::Deposit => "deposit",
            ContractMethod::GetCost => "get_cost",
            ContractMethod::GetUser => "get_user",
            ContractMethod::GetUsers => "get_users",
            ContractMethod::GetMarket => "get_market",
            ContractMethod::GetMarkets => "get_markets",
        }
    }
}

impl fmt::Display for ContractMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure reported by the wallet capability itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("Wallet request failed: {0}")]
    Request(String),
}

impl From<WalletError> for KarmaError {
    fn from(err: WalletError) -> Self {
        KarmaError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
