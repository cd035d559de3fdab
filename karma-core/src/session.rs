//! Session-level types: account addresses and connection state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What naive stringification of an opaque account object produces
pub const OBJECT_PLACEHOLDER: &str = "[object Object]";

/// Keys probed, in order, when a wallet hands back an account object
const ACCOUNT_KEYS: [&str; 3] = ["address", "account", "id"];

// ============================================================================
// Address
// ============================================================================

/// Identifier of the connected account.
///
/// Never empty and never the generic object placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate a candidate address
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() || value == OBJECT_PLACEHOLDER {
            None
        } else {
            Some(Address(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value.clone()).ok_or_else(|| format!("Invalid address: {:?}", value))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Wallet account representations
// ============================================================================

/// An account entry as reported by a wallet
#[derive(Debug, Clone, PartialEq)]
pub enum WalletAccount {
    /// Bare address string
    Plain(String),
    /// Record that may expose `address`, `account` or `id`
    Record(Map<String, Value>),
    /// Opaque handle known only through its textual form
    Described(String),
    /// Anything else the wallet sent
    Unsupported(Value),
}

impl From<Value> for WalletAccount {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => WalletAccount::Plain(s),
            Value::Object(map) => WalletAccount::Record(map),
            other => WalletAccount::Unsupported(other),
        }
    }
}

impl From<&str> for WalletAccount {
    fn from(value: &str) -> Self {
        WalletAccount::Plain(value.to_string())
    }
}

/// Turn any account representation into an [`Address`].
///
/// Records are probed for `address`, `account` then `id`; the first
/// non-empty string wins. Textual forms equal to the object placeholder
/// are rejected.
pub fn normalize_account(account: &WalletAccount) -> Option<Address> {
    match account {
        WalletAccount::Plain(s) | WalletAccount::Described(s) => Address::new(s.as_str()),
        WalletAccount::Record(map) => ACCOUNT_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .filter_map(Value::as_str)
            .find_map(Address::new),
        WalletAccount::Unsupported(_) => None,
    }
}

// ============================================================================
// Connection state
// ============================================================================

/// Lifecycle of the wallet session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Current session as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
}

impl ConnectionState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connecting() -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            address: None,
        }
    }

    pub fn connected(address: Address) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            address: Some(address),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.address.is_some()
    }
}
