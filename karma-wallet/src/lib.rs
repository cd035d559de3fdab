//! Karma Wallet - session and contract access
//!
//! This crate provides:
//! - The wallet capability seam (`WalletProvider`)
//! - Client configuration loaded from the environment
//! - Session management (connect, restore, disconnect)
//! - The contract gateway that invokes and decodes contract calls

pub mod config;
pub mod gateway;
pub mod session;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{ClientConfig, CONTRACT_ADDRESS_ENV};
pub use gateway::ContractGateway;
pub use session::SessionManager;
pub use types::{ContractMethod, WalletError};
pub use wallet::WalletProvider;
