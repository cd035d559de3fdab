//! Contract gateway - the only code that invokes the wallet's execute call

use karma_core::{decode, decode_unit, Address, DecodedResult, KarmaError, KarmaResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::session::SessionManager;
use crate::types::ContractMethod;

/// Thin call wrapper over [`crate::WalletProvider::execute`].
///
/// One external invocation per call, no retries, no timeouts.
pub struct ContractGateway {
    session: Arc<SessionManager>,
    config: ClientConfig,
}

impl ContractGateway {
    pub fn new(session: Arc<SessionManager>, config: ClientConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connected address and contract address, or `PreconditionFailed`
    pub fn ensure_ready(&self) -> KarmaResult<(Address, &str)> {
        let address = self
            .session
            .address()
            .ok_or_else(|| KarmaError::precondition("Please connect your wallet"))?;
        let contract = self
            .config
            .contract_address()
            .ok_or_else(|| KarmaError::precondition("Contract address not set"))?;
        Ok((address, contract))
    }

    pub fn is_ready(&self) -> bool {
        self.ensure_ready().is_ok()
    }

    /// Invoke `method` and return the raw response
    pub async fn call(&self, method: ContractMethod, args: Value) -> KarmaResult<Value> {
        let (_, contract) = self.ensure_ready()?;

        debug!("Calling {} on {} with {}", method, contract, args);

        match self
            .session
            .wallet()
            .execute(contract, method.as_str(), args)
            .await
        {
            Ok(raw) => {
                debug!("{} returned {}", method, raw);
                Ok(raw)
            }
            Err(e) => {
                error!("{} failed in transport: {}", method, e);
                Err(e.into())
            }
        }
    }

    /// Invoke `method` and run the response through the envelope decoder
    pub async fn call_decoded<T: DeserializeOwned>(
        &self,
        method: ContractMethod,
        args: Value,
    ) -> KarmaResult<DecodedResult<T>> {
        let raw = self.call(method, args).await?;
        Ok(decode(&raw))
    }

    /// Like [`Self::call_decoded`] for calls whose success carries no value
    pub async fn call_unit(
        &self,
        method: ContractMethod,
        args: Value,
    ) -> KarmaResult<DecodedResult<()>> {
        let raw = self.call(method, args).await?;
        Ok(decode_unit(&raw))
    }
}

impl std::fmt::Debug for ContractGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractGateway")
            .field("contract_address", &self.config.contract_address())
            .field("session", &self.session)
            .finish()
    }
}
