//! Market/User Store
//!
//! In-memory mirror of the contract's markets and the connected user's
//! profile. Contents are only ever replaced wholesale by [`MarketStore::refresh`];
//! nothing patches individual fields. A failed half-refresh leaves that half
//! at its last good value, except that a user record is never kept for an
//! account other than the one being refreshed.

use chrono::{DateTime, Utc};
use karma_core::{Address, DecodedResult, KarmaResult, Market, Outcome, Position, User};
use karma_wallet::{ContractGateway, ContractMethod};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::overlay::{OptimisticOverlay, OverlayEntry};

#[derive(Debug, Default)]
struct StoreState {
    markets: Vec<Market>,
    user: Option<User>,
    markets_updated_at: Option<DateTime<Utc>>,
    user_updated_at: Option<DateTime<Utc>>,
}

/// What a single refresh managed to replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RefreshReport {
    /// Refresh did not run: no session or no contract configured
    pub skipped: bool,
    pub markets_replaced: bool,
    pub user_replaced: bool,
    /// Overlay entries discarded at the end of the refresh
    pub overlay_cleared: usize,
}

impl RefreshReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.skipped && self.markets_replaced && self.user_replaced
    }
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_markets: usize,
    pub open_markets: usize,
    pub resolved_markets: usize,
    pub overlay_entries: usize,
    pub has_user: bool,
    pub markets_updated_at: Option<DateTime<Utc>>,
    pub user_updated_at: Option<DateTime<Utc>>,
}

/// Shared mirror of contract state plus the optimistic overlay
pub struct MarketStore {
    state: Arc<RwLock<StoreState>>,
    overlay: Arc<OptimisticOverlay>,
    gateway: Arc<ContractGateway>,
}

impl MarketStore {
    pub fn new(gateway: Arc<ContractGateway>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            overlay: Arc::new(OptimisticOverlay::new()),
            gateway,
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Re-read markets and the connected user, replacing what succeeded.
    ///
    /// Never fails: each half that cannot be read is logged and left as it
    /// was. The overlay is cleared once both reads have completed, whatever
    /// they returned. Concurrent refreshes are fine; the last one to finish
    /// wins.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RefreshReport {
        let address = match self.gateway.ensure_ready() {
            Ok((address, _)) => address,
            Err(e) => {
                debug!("Skipping refresh: {}", e);
                return RefreshReport::skipped();
            }
        };

        let markets_future = self
            .gateway
            .call_decoded::<Vec<Market>>(ContractMethod::GetMarkets, json!({}));
        let user_future = self
            .gateway
            .call_decoded::<Option<User>>(
                ContractMethod::GetUser,
                json!({ "id": address.as_str() }),
            );

        let (markets_result, user_result) = tokio::join!(markets_future, user_future);

        let mut report = RefreshReport::default();

        if let Some(markets) = settle("markets", markets_result) {
            info!("Refreshed {} markets", markets.len());
            self.replace_markets(markets);
            report.markets_replaced = true;
        }

        if let Some(user) = settle("user", user_result) {
            debug!("Refreshed user {}: registered = {}", address, user.is_some());
            self.replace_user(user);
            report.user_replaced = true;
        } else {
            self.drop_foreign_user(&address);
        }

        report.overlay_cleared = self.overlay.clear();
        if report.overlay_cleared > 0 {
            debug!("Discarded {} overlay entries", report.overlay_cleared);
        }

        report
    }

    fn replace_markets(&self, markets: Vec<Market>) {
        let mut state = self.state.write();
        state.markets = markets;
        state.markets_updated_at = Some(Utc::now());
    }

    fn replace_user(&self, user: Option<User>) {
        let mut state = self.state.write();
        state.user = user;
        state.user_updated_at = Some(Utc::now());
    }

    /// A kept user record must belong to the account being refreshed
    fn drop_foreign_user(&self, address: &Address) {
        let mut state = self.state.write();
        if state.user.as_ref().is_some_and(|user| &user.id != address) {
            info!("Dropping user record of a previous account");
            state.user = None;
            state.user_updated_at = None;
        }
    }

    /// Forget the user and any pending overlay (session ended)
    pub fn clear_session(&self) {
        {
            let mut state = self.state.write();
            state.user = None;
            state.user_updated_at = None;
        }
        self.overlay.clear();
    }

    // =========================================================================
    // Overlay
    // =========================================================================

    /// Record a just-submitted vote until the next refresh completes
    pub fn record_vote(&self, market_id: &str, address: &Address, side: Outcome) {
        self.overlay.record(OverlayEntry {
            market_id: market_id.to_string(),
            address: address.clone(),
            side,
        });
    }

    /// Vote of `address` on `market_id`: overlay first, then the mirror
    pub fn current_vote(&self, market_id: &str, address: &Address) -> Option<Outcome> {
        if let Some(side) = self.overlay.get(market_id, address) {
            return Some(side);
        }

        self.state
            .read()
            .markets
            .iter()
            .find(|m| m.id == market_id)
            .and_then(|m| m.vote_of(address))
            .map(|vote| vote.side)
    }

    pub fn overlay(&self) -> &OptimisticOverlay {
        &self.overlay
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn markets(&self) -> Vec<Market> {
        self.state.read().markets.clone()
    }

    pub fn market(&self, market_id: &str) -> Option<Market> {
        self.state
            .read()
            .markets
            .iter()
            .find(|m| m.id == market_id)
            .cloned()
    }

    pub fn open_markets(&self) -> Vec<Market> {
        self.filter_markets(|m| !m.resolved)
    }

    pub fn resolved_markets(&self) -> Vec<Market> {
        self.filter_markets(|m| m.resolved)
    }

    fn filter_markets(&self, predicate: impl Fn(&Market) -> bool) -> Vec<Market> {
        self.state
            .read()
            .markets
            .iter()
            .filter(|m| predicate(m))
            .cloned()
            .collect()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// The user's positions, in history order, for markets currently mirrored
    pub fn user_positions(&self) -> Vec<Position> {
        let state = self.state.read();
        let Some(user) = state.user.as_ref() else {
            return Vec::new();
        };

        user.history
            .iter()
            .filter_map(|id| state.markets.iter().find(|m| &m.id == id))
            .filter_map(|market| Position::from_market(market, &user.id))
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        let resolved = state.markets.iter().filter(|m| m.resolved).count();

        StoreStats {
            total_markets: state.markets.len(),
            open_markets: state.markets.len() - resolved,
            resolved_markets: resolved,
            overlay_entries: self.overlay.len(),
            has_user: state.user.is_some(),
            markets_updated_at: state.markets_updated_at,
            user_updated_at: state.user_updated_at,
        }
    }
}

/// Unpack one half of a refresh, logging whatever went wrong
fn settle<T>(label: &str, result: KarmaResult<DecodedResult<T>>) -> Option<T> {
    match result {
        Ok(DecodedResult::Ok(value)) => Some(value),
        Ok(DecodedResult::Err(message)) => {
            warn!("Contract refused {} read: {}", label, message);
            None
        }
        Ok(DecodedResult::Malformed(raw)) => {
            error!("Malformed {} response: {}", label, raw);
            None
        }
        Err(e) => {
            warn!("Failed to refresh {}: {}", label, e);
            None
        }
    }
}

impl Clone for MarketStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            overlay: Arc::clone(&self.overlay),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_wallet::testing::ScriptedWallet;
    use karma_core::WalletAccount;
    use karma_wallet::{ClientConfig, SessionManager};
    use serde_json::Value;

    fn market_json(id: &str, resolved: bool, voters: Value) -> Value {
        let outcome = if resolved { json!("YES") } else { Value::Null };
        json!({
            "id": id,
            "creator": "weil1creator",
            "question": format!("Question {}?", id),
            "num_yes": 1,
            "num_no": 0,
            "liquidity": 100.0,
            "resolved": resolved,
            "outcome": outcome,
            "voters": voters
        })
    }

    fn ok_envelope(value: Value) -> Value {
        let inner = json!({ "Ok": value.to_string() });
        json!({ "txn_result": inner.to_string() })
    }

    fn user_json(balance: f64, history: Value) -> Value {
        json!({"id": "weil1alice", "bio": "hi", "balance": balance, "history": history})
    }

    fn alice() -> Address {
        Address::new("weil1alice").unwrap()
    }

    async fn connected_store() -> (Arc<ScriptedWallet>, MarketStore) {
        let wallet = Arc::new(ScriptedWallet::new());
        let session = Arc::new(SessionManager::new(wallet.clone()));
        session.connect().await.unwrap();
        let gateway = Arc::new(ContractGateway::new(
            session,
            ClientConfig::new("weil1contract"),
        ));
        (wallet, MarketStore::new(gateway))
    }

    #[tokio::test]
    async fn test_refresh_replaces_both_halves() {
        let (wallet, store) = connected_store().await;
        wallet.push_response(
            "get_markets",
            ok_envelope(json!([
                market_json("m-1", false, json!({})),
                market_json("m-2", true, json!({})),
            ])),
        );
        wallet.push_response("get_user", ok_envelope(user_json(10.0, json!([]))));

        let report = store.refresh().await;
        assert!(report.is_complete());
        assert_eq!(store.markets().len(), 2);
        assert_eq!(store.user().unwrap().balance, 10.0);

        let calls = wallet.calls_to("get_user");
        assert_eq!(calls[0].args, json!({"id": "weil1alice"}));

        let stats = store.stats();
        assert_eq!(stats.open_markets, 1);
        assert_eq!(stats.resolved_markets, 1);
        assert!(stats.markets_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_user_failure_keeps_previous_user() {
        let (wallet, store) = connected_store().await;
        wallet.push_response("get_markets", ok_envelope(json!([])));
        wallet.push_response("get_user", ok_envelope(user_json(10.0, json!([]))));
        store.refresh().await;

        wallet.push_response(
            "get_markets",
            ok_envelope(json!([market_json("m-1", false, json!({}))])),
        );
        wallet.push_failure("get_user", "wallet went away");
        let report = store.refresh().await;

        assert!(report.markets_replaced);
        assert!(!report.user_replaced);
        assert_eq!(store.markets().len(), 1);
        assert_eq!(store.user().unwrap().balance, 10.0);
    }

    #[tokio::test]
    async fn test_malformed_markets_keep_previous_markets() {
        let (wallet, store) = connected_store().await;
        wallet.push_response("get_markets", json!([market_json("m-1", false, json!({}))]));
        wallet.push_response("get_user", ok_envelope(user_json(1.0, json!([]))));
        store.refresh().await;

        wallet.push_response("get_markets", json!({"surprise": true}));
        wallet.push_response("get_user", ok_envelope(user_json(2.0, json!([]))));
        let report = store.refresh().await;

        assert!(!report.markets_replaced);
        assert_eq!(store.markets().len(), 1);
        assert_eq!(store.user().unwrap().balance, 2.0);
    }

    #[tokio::test]
    async fn test_unregistered_user_is_none() {
        let (wallet, store) = connected_store().await;
        wallet.push_response("get_markets", ok_envelope(json!([])));
        wallet.push_response("get_user", json!({"txn_result": "{\"Ok\":\"null\"}"}));

        let report = store.refresh().await;
        assert!(report.user_replaced);
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_refresh_skipped_without_session() {
        let wallet = Arc::new(ScriptedWallet::new());
        let session = Arc::new(SessionManager::new(wallet.clone()));
        let gateway = Arc::new(ContractGateway::new(
            session,
            ClientConfig::new("weil1contract"),
        ));
        let store = MarketStore::new(gateway);

        let report = store.refresh().await;
        assert!(report.skipped);
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overlay_wins_until_refresh_completes() {
        let (wallet, store) = connected_store().await;
        wallet.push_response(
            "get_markets",
            ok_envelope(json!([market_json(
                "m-1",
                false,
                json!({"weil1alice": {"side": "NO", "quantity": 1}})
            )])),
        );
        wallet.push_response("get_user", ok_envelope(user_json(1.0, json!(["m-1"]))));
        store.refresh().await;
        assert_eq!(store.current_vote("m-1", &alice()), Some(Outcome::No));

        store.record_vote("m-1", &alice(), Outcome::Yes);
        assert_eq!(store.current_vote("m-1", &alice()), Some(Outcome::Yes));

        // Refresh fails entirely; the overlay is still discarded
        wallet.push_failure("get_markets", "down");
        wallet.push_failure("get_user", "down");
        let report = store.refresh().await;
        assert_eq!(report.overlay_cleared, 1);
        assert!(store.overlay().is_empty());
        assert_eq!(store.current_vote("m-1", &alice()), Some(Outcome::No));
    }

    #[tokio::test]
    async fn test_user_positions_follow_history() {
        let (wallet, store) = connected_store().await;
        wallet.push_response(
            "get_markets",
            ok_envelope(json!([
                market_json("m-1", false, json!({"weil1alice": {"side": "NO", "quantity": 2}})),
                market_json("m-2", true, json!({"weil1alice": {"side": "YES", "quantity": 5}})),
            ])),
        );
        wallet.push_response(
            "get_user",
            ok_envelope(user_json(1.0, json!(["m-2", "m-1", "m-gone"]))),
        );
        store.refresh().await;

        let positions = store.user_positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].market_id, "m-2");
        assert_eq!(positions[0].won, Some(true));
        assert_eq!(positions[1].market_id, "m-1");
        assert_eq!(positions[1].won, None);
    }

    #[tokio::test]
    async fn test_failed_user_read_drops_previous_account() {
        let (wallet, store) = connected_store().await;
        wallet.push_response("get_markets", ok_envelope(json!([])));
        wallet.push_response("get_user", ok_envelope(user_json(10.0, json!([]))));
        store.refresh().await;
        assert!(store.user().is_some());

        wallet.set_accounts(vec![WalletAccount::from("weil1bob")]);
        store.gateway.session().connect().await.unwrap();

        wallet.push_response("get_markets", ok_envelope(json!([])));
        wallet.push_failure("get_user", "wallet went away");
        let report = store.refresh().await;

        assert!(!report.user_replaced);
        assert!(store.user().is_none());
        assert!(store.stats().user_updated_at.is_none());
    }

    #[tokio::test]
    async fn test_clear_session() {
        let (wallet, store) = connected_store().await;
        wallet.push_response("get_markets", ok_envelope(json!([])));
        wallet.push_response("get_user", ok_envelope(user_json(1.0, json!([]))));
        store.refresh().await;
        store.record_vote("m-1", &alice(), Outcome::Yes);

        store.clear_session();
        assert!(store.user().is_none());
        assert!(store.overlay().is_empty());
    }
}
