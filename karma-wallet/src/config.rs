//! Client configuration loaded once at process start

use tracing::{info, warn};

/// Environment variable holding the Karma contract address
pub const CONTRACT_ADDRESS_ENV: &str = "KARMA_CONTRACT_ADDRESS";

/// Immutable client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    contract_address: Option<String>,
}

impl ClientConfig {
    /// Configuration pointing at `contract_address` (blank means unset)
    pub fn new(contract_address: impl Into<String>) -> Self {
        let address = contract_address.into();
        let address = address.trim();
        Self {
            contract_address: (!address.is_empty()).then(|| address.to_string()),
        }
    }

    /// Configuration without a contract; every gateway call fails fast
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Load from `KARMA_CONTRACT_ADDRESS`, reading `.env.local` and `.env` first
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::from_filename(".env.local") {
            // Not an error if the file doesn't exist
            if !matches!(e, dotenvy::Error::Io(_)) {
                warn!("Failed to load .env.local: {}", e);
            }
        }
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(CONTRACT_ADDRESS_ENV) {
            Some(address) if !address.trim().is_empty() => {
                info!("Using Karma contract {}", address.trim());
                Self::new(address)
            }
            _ => {
                warn!(
                    "{} not set - contract calls will be rejected",
                    CONTRACT_ADDRESS_ENV
                );
                Self::unconfigured()
            }
        }
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.contract_address.is_some()
    }
}
