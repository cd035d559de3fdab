//! Karma client - the action orchestrators
//!
//! Every mutation follows the same path: check the session and input,
//! make one gateway call, decode the envelope, then on success apply any
//! overlay entry and refresh the store. Contract errors are surfaced
//! verbatim; nothing is retried.

use karma_core::{
    Address, ConnectionState, CostQuote, DecodedResult, KarmaError, KarmaResult, Market, Outcome,
    User,
};
use karma_wallet::{ClientConfig, ContractGateway, ContractMethod, SessionManager, WalletProvider};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::market_store::{MarketStore, RefreshReport};
use crate::validation;

/// Context object holding the session, gateway and store for one page session
pub struct KarmaClient {
    session: Arc<SessionManager>,
    gateway: Arc<ContractGateway>,
    store: MarketStore,
}

impl KarmaClient {
    /// Create a client in the `Disconnected` state
    pub fn new(wallet: Arc<dyn WalletProvider>, config: ClientConfig) -> Self {
        let session = Arc::new(SessionManager::new(wallet));
        let gateway = Arc::new(ContractGateway::new(Arc::clone(&session), config));
        let store = MarketStore::new(Arc::clone(&gateway));

        Self {
            session,
            gateway,
            store,
        }
    }

    /// Create a client whose contract address comes from the environment
    pub fn from_env(wallet: Arc<dyn WalletProvider>) -> Self {
        Self::new(wallet, ClientConfig::from_env())
    }

    /// Restore an existing wallet session and, once connected, load state.
    ///
    /// The first refresh only runs after the session reaches `Connected`
    /// with a contract configured.
    pub async fn start(&self) -> Option<Address> {
        let address = self.session.restore_session().await?;
        if self.gateway.is_ready() {
            self.store.refresh().await;
        }
        Some(address)
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn address(&self) -> Option<Address> {
        self.session.address()
    }

    /// Connect through the wallet, then load markets and user
    ///
    /// A failed attempt leaves the session `Disconnected`, so anything held
    /// for a previous account is dropped as well.
    pub async fn connect(&self) -> KarmaResult<Address> {
        let address = match self.session.connect().await {
            Ok(address) => address,
            Err(e) => {
                self.store.clear_session();
                return Err(e);
            }
        };
        if self.gateway.is_ready() {
            self.store.refresh().await;
        } else {
            warn!("Connected as {} but no contract address is configured", address);
        }
        Ok(address)
    }

    /// End the session; connection state, user and overlay are always cleared
    pub async fn disconnect(&self) {
        self.session.disconnect().await;
        self.store.clear_session();
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.gateway.config().contract_address()
    }

    /// The contract address is fixed at startup; changing it is always rejected
    pub fn set_contract_address(&self, address: &str) -> KarmaResult<()> {
        warn!(
            "Ignoring request to use contract {}: the address can only be set via {}",
            address,
            karma_wallet::CONTRACT_ADDRESS_ENV
        );
        Err(KarmaError::config(format!(
            "Contract address can only be set via {}",
            karma_wallet::CONTRACT_ADDRESS_ENV
        )))
    }

    // =========================================================================
    // Store access
    // =========================================================================

    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    pub fn markets(&self) -> Vec<Market> {
        self.store.markets()
    }

    pub fn user(&self) -> Option<User> {
        self.store.user()
    }

    /// Connected user's vote on `market_id`, overlay first
    pub fn current_vote(&self, market_id: &str) -> Option<Outcome> {
        let address = self.session.address()?;
        self.store.current_vote(market_id, &address)
    }

    pub async fn refresh(&self) -> RefreshReport {
        self.store.refresh().await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn register(&self, bio: &str) -> KarmaResult<()> {
        self.gateway.ensure_ready()?;
        let bio = validation::require_bio(bio)?;

        self.submit(ContractMethod::RegisterUser, json!({ "bio": bio }), None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn deposit(&self, amount: f64) -> KarmaResult<()> {
        self.gateway.ensure_ready()?;
        let amount = validation::require_amount(amount)?;

        self.submit(ContractMethod::Deposit, json!({ "amount": amount }), None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn place_bet(
        &self,
        market_id: &str,
        side: Outcome,
        quantity: u64,
    ) -> KarmaResult<()> {
        let (address, _) = self.gateway.ensure_ready()?;
        let market_id = validation::require_market_id(market_id)?;
        let quantity = validation::require_quantity(quantity)?;

        let args = json!({
            "market_id": market_id,
            "side": side,
            "quantity": quantity,
        });
        let vote = PendingVote {
            market_id: market_id.to_string(),
            address,
            side,
        };

        self.submit(ContractMethod::Bet, args, Some(vote)).await
    }

    #[instrument(skip(self))]
    pub async fn create_market(&self, question: &str, liquidity: f64) -> KarmaResult<()> {
        self.gateway.ensure_ready()?;
        let question = validation::require_question(question)?;
        let liquidity = validation::require_liquidity(liquidity)?;

        let args = json!({
            "question": question,
            "liquidity": liquidity,
        });
        self.submit(ContractMethod::AddMarket, args, None).await
    }

    /// Resolve a market. Terminality is the contract's business: a second
    /// resolve is sent anyway and its rejection surfaced as a contract error.
    #[instrument(skip(self))]
    pub async fn resolve(&self, market_id: &str, outcome: Outcome) -> KarmaResult<()> {
        self.gateway.ensure_ready()?;
        let market_id = validation::require_market_id(market_id)?;

        let args = json!({
            "market_id": market_id,
            "outcome": outcome,
        });
        self.submit(ContractMethod::Resolve, args, None).await
    }

    async fn submit(
        &self,
        method: ContractMethod,
        args: Value,
        vote: Option<PendingVote>,
    ) -> KarmaResult<()> {
        let decoded = self.gateway.call_unit(method, args).await?;
        expect_ok(method, decoded)?;

        info!("{} accepted by contract", method);
        if let Some(vote) = vote {
            self.store.record_vote(&vote.market_id, &vote.address, vote.side);
        }
        self.store.refresh().await;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Per-share YES/NO prices for `market_id` as quoted by the contract
    #[instrument(skip(self))]
    pub async fn get_cost_preview(&self, market_id: &str) -> KarmaResult<CostQuote> {
        self.gateway.ensure_ready()?;
        let market_id = validation::require_market_id(market_id)?;

        let decoded = self
            .gateway
            .call_decoded::<(f64, f64)>(ContractMethod::GetCost, json!({ "market_id": market_id }))
            .await?;
        let quote = CostQuote::from(expect_ok(ContractMethod::GetCost, decoded)?);

        debug!("Cost for {}: yes {} / no {}", market_id, quote.yes, quote.no);
        Ok(quote)
    }

    /// Displayed total for `quantity` shares of `side`, from a fresh quote
    pub async fn preview_total(
        &self,
        market_id: &str,
        side: Outcome,
        quantity: u64,
    ) -> KarmaResult<f64> {
        let quantity = validation::require_quantity(quantity)?;
        let quote = self.get_cost_preview(market_id).await?;
        Ok(quote.total(side, quantity))
    }

    /// Whether the connected account has a user record on the contract
    pub async fn is_registered(&self) -> KarmaResult<bool> {
        let (address, _) = self.gateway.ensure_ready()?;

        let decoded = self
            .gateway
            .call_decoded::<Option<User>>(
                ContractMethod::GetUser,
                json!({ "id": address.as_str() }),
            )
            .await?;

        match decoded {
            DecodedResult::Ok(user) => Ok(user.is_some()),
            DecodedResult::Err(message) => {
                debug!("No user record for {}: {}", address, message);
                Ok(false)
            }
            other => expect_ok(ContractMethod::GetUser, other).map(|user| user.is_some()),
        }
    }

    /// Look up one market on the contract without touching the store
    pub async fn fetch_market(&self, market_id: &str) -> KarmaResult<Option<Market>> {
        self.gateway.ensure_ready()?;
        let market_id = validation::require_market_id(market_id)?;

        let decoded = self
            .gateway
            .call_decoded::<Option<Market>>(ContractMethod::GetMarket, json!({ "id": market_id }))
            .await?;
        expect_ok(ContractMethod::GetMarket, decoded)
    }

    /// All registered users, read straight from the contract
    pub async fn fetch_users(&self) -> KarmaResult<Vec<User>> {
        let decoded = self
            .gateway
            .call_decoded::<Vec<User>>(ContractMethod::GetUsers, json!({}))
            .await?;
        expect_ok(ContractMethod::GetUsers, decoded)
    }
}

/// Vote to overlay once the bet is accepted
#[derive(Debug)]
struct PendingVote {
    market_id: String,
    address: Address,
    side: Outcome,
}

/// Turn a decoded response into a result, logging malformed payloads
fn expect_ok<T>(method: ContractMethod, decoded: DecodedResult<T>) -> KarmaResult<T> {
    match &decoded {
        DecodedResult::Err(message) => info!("{} rejected by contract: {}", method, message),
        DecodedResult::Malformed(raw) => error!("Unexpected {} response: {}", method, raw),
        DecodedResult::Ok(_) => {}
    }
    decoded.into_result()
}
