//! Wallet session management - connect, restore, disconnect

use karma_core::{
    normalize_account, Address, ConnectionState, ConnectionStatus, KarmaError, KarmaResult,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::wallet::WalletProvider;

/// Owns the single [`ConnectionState`]; nothing else mutates it.
pub struct SessionManager {
    wallet: Arc<dyn WalletProvider>,
    state: RwLock<ConnectionState>,
}

impl SessionManager {
    /// New manager in the `Disconnected` state
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            state: RwLock::new(ConnectionState::disconnected()),
        }
    }

    pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.read().status
    }

    /// Address of the connected account, if any
    pub fn address(&self) -> Option<Address> {
        let state = self.state.read();
        if state.is_connected() {
            state.address.clone()
        } else {
            None
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Establish a session through the interactive wallet flow.
    ///
    /// Checks availability, setup and lock state before asking for
    /// accounts. Any failure leaves the session `Disconnected`.
    pub async fn connect(&self) -> KarmaResult<Address> {
        if !self.wallet.is_available() {
            info!("Connect requested but no wallet is available");
            self.set_state(ConnectionState::disconnected());
            return Err(KarmaError::WalletUnavailable);
        }

        self.set_state(ConnectionState::connecting());

        match self.establish().await {
            Ok(address) => {
                info!("Wallet connected: {}", address);
                self.set_state(ConnectionState::connected(address.clone()));
                Ok(address)
            }
            Err(e) => {
                if e.is_unexpected() {
                    error!("Failed to connect wallet: {}", e);
                } else {
                    info!("Wallet connection refused: {}", e);
                }
                self.set_state(ConnectionState::disconnected());
                Err(e)
            }
        }
    }

    async fn establish(&self) -> KarmaResult<Address> {
        if !self.wallet.is_set_up().await? {
            return Err(KarmaError::WalletNotSetUp);
        }

        if !self.wallet.is_unlocked().await? {
            return Err(KarmaError::WalletLocked);
        }

        let accounts = self.wallet.request_accounts().await?;
        let first = accounts.first().ok_or(KarmaError::NoAccounts)?;
        debug!("First wallet account: {:?}", first);

        normalize_account(first).ok_or_else(|| {
            warn!("Invalid account format: {:?}", first);
            KarmaError::invalid_account(format!("{:?}", first))
        })
    }

    /// Pick up a connection the wallet already holds (e.g. after a reload).
    ///
    /// Skips the setup/lock checks and never surfaces an error: if the
    /// account cannot be normalized the session simply stays disconnected.
    pub async fn restore_session(&self) -> Option<Address> {
        if !self.wallet.is_available() || !self.wallet.is_connected() {
            debug!("No existing wallet connection to restore");
            return None;
        }

        let accounts = match self.wallet.list_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Error checking wallet connection: {}", e);
                return None;
            }
        };

        match accounts.first().and_then(normalize_account) {
            Some(address) => {
                info!("Restored wallet session for {}", address);
                self.set_state(ConnectionState::connected(address.clone()));
                Some(address)
            }
            None => {
                debug!("Existing wallet connection has no usable account");
                None
            }
        }
    }

    /// Best-effort wallet disconnect; local state is cleared regardless.
    pub async fn disconnect(&self) {
        if self.wallet.is_available() && self.wallet.is_connected() {
            if let Err(e) = self.wallet.disconnect().await {
                warn!("Error disconnecting wallet: {}", e);
            }
        }

        self.set_state(ConnectionState::disconnected());
        info!("Wallet session cleared");
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.read())
            .finish()
    }
}
