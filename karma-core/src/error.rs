//! Error types for the Karma client

use thiserror::Error;

/// Text shown to the user when a failure carries nothing worth reading
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed. Please try again.";

/// Text shown to the user when the contract answered with something unreadable
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from the contract.";

/// Client-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KarmaError {
    /// Bad local input; never reaches the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// No active session or no contract address configured
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Wallet not found")]
    WalletUnavailable,

    #[error("Wallet is not set up")]
    WalletNotSetUp,

    #[error("Wallet is locked")]
    WalletLocked,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    /// The first wallet account could not be turned into an address
    #[error("Invalid account format: {0}")]
    InvalidAccountFormat(String),

    /// The external execute capability itself failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Decoded `Err` envelope, message kept verbatim
    #[error("Contract error: {0}")]
    Contract(String),

    /// Response present but not in any recognised shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KarmaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        KarmaError::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        KarmaError::PreconditionFailed(msg.into())
    }

    pub fn invalid_account(msg: impl Into<String>) -> Self {
        KarmaError::InvalidAccountFormat(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        KarmaError::Transport(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        KarmaError::Contract(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        KarmaError::MalformedResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        KarmaError::Config(msg.into())
    }

    /// Failures worth logging with their raw payload for diagnosis.
    ///
    /// Validation, precondition and session errors are ordinary user
    /// situations; contract errors are business messages.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            KarmaError::Transport(_) | KarmaError::MalformedResponse(_)
        )
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            KarmaError::Validation(msg) | KarmaError::PreconditionFailed(msg) => msg.clone(),
            KarmaError::WalletUnavailable => {
                "Wallet not found. Please install the wallet extension.".to_string()
            }
            KarmaError::WalletNotSetUp => {
                "Wallet is not set up. Please set up your wallet first.".to_string()
            }
            KarmaError::WalletLocked => {
                "Wallet is locked. Please unlock your wallet first.".to_string()
            }
            KarmaError::NoAccounts => {
                "No accounts found. Please create an account in your wallet.".to_string()
            }
            KarmaError::InvalidAccountFormat(_) => "Invalid account address format.".to_string(),
            KarmaError::Contract(msg) => msg.clone(),
            KarmaError::Transport(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            KarmaError::MalformedResponse(_) => UNEXPECTED_RESPONSE_MESSAGE.to_string(),
            KarmaError::Config(msg) => msg.clone(),
        }
    }
}

/// Result type alias for client operations
pub type KarmaResult<T> = Result<T, KarmaError>;
