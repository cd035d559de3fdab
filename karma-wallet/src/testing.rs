//! Scripted in-memory wallet for tests

use async_trait::async_trait;
use karma_core::WalletAccount;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::types::{Result, WalletError};
use crate::wallet::WalletProvider;

/// A contract call as the wallet saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub contract_address: String,
    pub method: String,
    pub args: Value,
}

#[derive(Debug)]
struct ScriptState {
    set_up: bool,
    unlocked: bool,
    connected: bool,
    accounts: Vec<WalletAccount>,
    responses: HashMap<String, VecDeque<Result<Value>>>,
    pauses: HashMap<String, Arc<Notify>>,
    calls: Vec<RecordedCall>,
    disconnect_error: Option<WalletError>,
    disconnects: usize,
}

/// Wallet whose answers are queued up front, per method.
///
/// Each `execute` pops the next queued response for its method; an empty
/// queue yields a [`WalletError::Request`].
#[derive(Debug)]
pub struct ScriptedWallet {
    available: bool,
    state: Mutex<ScriptState>,
}

impl Default for ScriptedWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedWallet {
    /// Available, set up, unlocked, not yet connected, one account `weil1alice`
    pub fn new() -> Self {
        Self {
            available: true,
            state: Mutex::new(ScriptState {
                set_up: true,
                unlocked: true,
                connected: false,
                accounts: vec![WalletAccount::from("weil1alice")],
                responses: HashMap::new(),
                pauses: HashMap::new(),
                calls: Vec::new(),
                disconnect_error: None,
                disconnects: 0,
            }),
        }
    }

    /// No wallet capability present
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_accounts(self, accounts: Vec<WalletAccount>) -> Self {
        self.state.lock().accounts = accounts;
        self
    }

    pub fn with_set_up(self, set_up: bool) -> Self {
        self.state.lock().set_up = set_up;
        self
    }

    pub fn with_unlocked(self, unlocked: bool) -> Self {
        self.state.lock().unlocked = unlocked;
        self
    }

    /// Wallet reports an existing connection (page reload case)
    pub fn already_connected(self) -> Self {
        self.state.lock().connected = true;
        self
    }

    pub fn with_failing_disconnect(self, message: &str) -> Self {
        self.state.lock().disconnect_error = Some(WalletError::Request(message.to_string()));
        self
    }

    /// Swap the accounts the wallet reports from now on (account switch)
    pub fn set_accounts(&self, accounts: Vec<WalletAccount>) {
        self.state.lock().accounts = accounts;
    }

    /// Queue a raw response for the next call to `method`
    pub fn push_response(&self, method: &str, raw: Value) {
        self.push(method, Ok(raw));
    }

    /// Queue a transport failure for the next call to `method`
    pub fn push_failure(&self, method: &str, message: &str) {
        self.push(method, Err(WalletError::Request(message.to_string())));
    }

    fn push(&self, method: &str, response: Result<Value>) {
        self.state
            .lock()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Hold the next call to `method` until the returned handle is notified
    pub fn pause_on(&self, method: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .pauses
            .insert(method.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn is_set_up(&self) -> Result<bool> {
        Ok(self.state.lock().set_up)
    }

    async fn is_unlocked(&self) -> Result<bool> {
        Ok(self.state.lock().unlocked)
    }

    async fn request_accounts(&self) -> Result<Vec<WalletAccount>> {
        let mut state = self.state.lock();
        state.connected = true;
        Ok(state.accounts.clone())
    }

    async fn list_accounts(&self) -> Result<Vec<WalletAccount>> {
        Ok(self.state.lock().accounts.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        state.connected = false;
        match state.disconnect_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn execute(&self, contract_address: &str, method: &str, args: Value) -> Result<Value> {
        let pause = {
            let mut state = self.state.lock();
            state.calls.push(RecordedCall {
                contract_address: contract_address.to_string(),
                method: method.to_string(),
                args,
            });
            state.pauses.remove(method)
        };

        if let Some(notify) = pause {
            notify.notified().await;
        }

        self.state
            .lock()
            .responses
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(WalletError::Request(format!(
                    "no scripted response for {}",
                    method
                )))
            })
    }
}
