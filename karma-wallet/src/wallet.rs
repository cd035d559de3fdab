//! Wallet capability seam
//!
//! The wallet lives outside this codebase, usually as a browser extension.
//! Everything the client needs from it is captured by
//! [`WalletProvider`]; transport, signing and key storage stay on the other
//! side of the trait.

use async_trait::async_trait;
use karma_core::WalletAccount;
use serde_json::Value;

use crate::types::Result;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet capability is present at all
    fn is_available(&self) -> bool;

    /// Whether the wallet already holds an authorised connection
    fn is_connected(&self) -> bool;

    async fn is_set_up(&self) -> Result<bool>;

    async fn is_unlocked(&self) -> Result<bool>;

    /// Interactive account request; may prompt the user
    async fn request_accounts(&self) -> Result<Vec<WalletAccount>>;

    /// Non-interactive account listing, used to restore a session
    async fn list_accounts(&self) -> Result<Vec<WalletAccount>>;

    async fn disconnect(&self) -> Result<()>;

    /// Invoke `method` on the contract at `contract_address`.
    ///
    /// Returns the raw, still-enveloped response.
    async fn execute(&self, contract_address: &str, method: &str, args: Value) -> Result<Value>;
}
