//! End-to-end flows through the Karma client against a scripted wallet
//!
//! Run with: cargo test -p karma-services --test test_market_flow -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use karma_core::{ConnectionStatus, KarmaError, Outcome};
use karma_services::KarmaClient;
use karma_wallet::testing::ScriptedWallet;
use karma_wallet::ClientConfig;
use serde_json::{json, Value};

const CONTRACT: &str = "weil1karma";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// `{txn_result: "{\"Ok\": \"<json>\"}"}`, the shape the wallet hands back
fn ok_envelope(value: Value) -> Value {
    let inner = json!({ "Ok": value.to_string() });
    json!({ "txn_result": inner.to_string() })
}

fn err_envelope(message: &str) -> Value {
    let inner = json!({ "Err": message });
    json!({ "txn_result": inner.to_string() })
}

fn market(id: &str, outcome: Option<&str>, voters: Value) -> Value {
    let resolved = outcome.is_some();
    json!({
        "id": id,
        "creator": "weil1bob",
        "question": "Will the bridge open by June?",
        "num_yes": 3,
        "num_no": 1,
        "liquidity": 250.0,
        "resolved": resolved,
        "outcome": outcome,
        "voters": voters
    })
}

fn alice(balance: f64, history: Value) -> Value {
    json!({"id": "weil1alice", "bio": "forecaster", "balance": balance, "history": history})
}

fn script_refresh(wallet: &ScriptedWallet, markets: Value, user: Value) {
    wallet.push_response("get_markets", ok_envelope(markets));
    wallet.push_response("get_user", ok_envelope(user));
}

async fn connected(wallet: &Arc<ScriptedWallet>) -> KarmaClient {
    let client = KarmaClient::new(wallet.clone(), ClientConfig::new(CONTRACT));
    script_refresh(wallet, json!([market("m-1", None, json!({}))]), alice(20.0, json!([])));
    client.connect().await.expect("connect");
    client
}

#[tokio::test]
async fn test_connect_loads_markets_and_user() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = connected(&wallet).await;

    let state = client.connection_state();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.address.unwrap().as_str(), "weil1alice");

    assert_eq!(client.markets().len(), 1);
    assert_eq!(client.user().unwrap().balance, 20.0);

    for call in wallet.calls() {
        assert_eq!(call.contract_address, CONTRACT);
    }
}

#[tokio::test]
async fn test_overlay_visible_while_refresh_in_flight() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = Arc::new(connected(&wallet).await);
    assert_eq!(client.current_vote("m-1"), None);

    wallet.push_response("bet", ok_envelope(Value::Null));
    let release = wallet.pause_on("get_markets");
    script_refresh(
        &wallet,
        json!([market("m-1", None, json!({"weil1alice": {"side": "YES", "quantity": 2}}))]),
        alice(18.0, json!(["m-1"])),
    );

    let bettor = Arc::clone(&client);
    let handle = tokio::spawn(async move { bettor.place_bet("m-1", Outcome::Yes, 2).await });

    // Wait until the post-bet refresh is parked on get_markets
    let mut attempts = 0;
    while wallet.calls_to("get_markets").len() < 2 {
        attempts += 1;
        assert!(attempts < 500, "refresh never started");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(client.current_vote("m-1"), Some(Outcome::Yes));
    assert_eq!(client.store().overlay().len(), 1);

    release.notify_one();
    handle.await.expect("join").expect("bet accepted");

    assert!(client.store().overlay().is_empty());
    assert_eq!(client.current_vote("m-1"), Some(Outcome::Yes));
    assert_eq!(client.user().unwrap().balance, 18.0);
    assert_eq!(client.store().user_positions().len(), 1);
}

#[tokio::test]
async fn test_resolve_then_second_resolve_is_rejected() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = connected(&wallet).await;

    wallet.push_response("resolve", ok_envelope(Value::Null));
    script_refresh(&wallet, json!([market("m-1", Some("NO"), json!({}))]), alice(20.0, json!([])));
    client.resolve("m-1", Outcome::No).await.expect("resolve");

    assert_eq!(
        wallet.calls_to("resolve")[0].args,
        json!({"market_id": "m-1", "outcome": "NO"})
    );
    let resolved = client.store().market("m-1").unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.winning_outcome(), Some(Outcome::No));
    assert_eq!(client.store().resolved_markets().len(), 1);
    assert!(client.store().open_markets().is_empty());

    wallet.push_response("resolve", err_envelope("Market already resolved"));
    let err = client.resolve("m-1", Outcome::Yes).await.unwrap_err();
    assert_eq!(err, KarmaError::Contract("Market already resolved".to_string()));

    // Rejected mutation does not refresh
    assert_eq!(wallet.calls_to("get_markets").len(), 2);
}

#[tokio::test]
async fn test_cost_preview_drives_displayed_total() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = connected(&wallet).await;

    wallet.push_response("get_cost", ok_envelope(json!([0.6123, 0.3877])));
    let quote = client.get_cost_preview("m-1").await.expect("quote");

    assert_eq!(quote.per_share(Outcome::Yes), 0.6123);
    assert!((quote.total(Outcome::Yes, 4) - 2.4492).abs() < 1e-9);
}

#[tokio::test]
async fn test_create_market_and_deposit() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = connected(&wallet).await;

    wallet.push_response("add_market", ok_envelope(Value::Null));
    script_refresh(
        &wallet,
        json!([market("m-1", None, json!({})), market("m-2", None, json!({}))]),
        alice(20.0, json!([])),
    );
    client
        .create_market(" Will it snow? ", 50.0)
        .await
        .expect("create market");
    assert_eq!(
        wallet.calls_to("add_market")[0].args,
        json!({"question": "Will it snow?", "liquidity": 50.0})
    );
    assert_eq!(client.markets().len(), 2);

    wallet.push_response("deposit", ok_envelope(Value::Null));
    script_refresh(&wallet, json!([]), alice(70.0, json!([])));
    client.deposit(50.0).await.expect("deposit");
    assert_eq!(client.user().unwrap().balance, 70.0);
}

#[tokio::test]
async fn test_connect_with_wallet_not_set_up() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new().with_set_up(false));
    let client = KarmaClient::new(wallet.clone(), ClientConfig::new(CONTRACT));

    let err = client.connect().await.unwrap_err();
    assert_eq!(err, KarmaError::WalletNotSetUp);
    assert!(!err.is_unexpected());
    assert_eq!(client.connection_state().status, ConnectionStatus::Disconnected);
    assert!(wallet.calls().is_empty());
}

#[tokio::test]
async fn test_disconnect_then_actions_need_session() {
    init_tracing();
    let wallet = Arc::new(ScriptedWallet::new());
    let client = connected(&wallet).await;

    client.disconnect().await;
    assert!(client.user().is_none());

    let err = client.place_bet("m-1", Outcome::Yes, 1).await.unwrap_err();
    assert_eq!(err, KarmaError::PreconditionFailed("Please connect your wallet".to_string()));
}
