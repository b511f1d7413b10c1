//! Client context: the provider handle, both registries, and node helpers

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, Overrides};
use crate::domain::abi::CodecError;
use crate::domain::error::{decode_error, ContractError, ErrorRegistry};
use crate::domain::event::{EventFilter, EventRegistry, Events};
use crate::infrastructure::ethereum::{create_provider, EthereumProvider, RpcFailure};
use crate::transaction::Transaction;

/// How often receipt polling re-checks the node
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Failure of a contract or client operation
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// A decodable contract revert, mapped through the error registry
    #[error(transparent)]
    Reverted(#[from] ContractError),

    /// Cancellation was requested; the check runs only after the underlying
    /// call settles, so the in-flight request was never aborted
    #[error("operation cancelled")]
    Cancelled,

    /// Signature/ABI programmer error
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport or provider failure, passed through unmodified
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}

/// Process-scoped context tying a provider to its decoding registries
///
/// Registries are populated before construction and immutable afterwards;
/// swapping transports means constructing a new client.
pub struct EthClient {
    provider: Box<dyn EthereumProvider>,
    errors: ErrorRegistry,
    events: EventRegistry,
    overrides: Overrides,
}

impl EthClient {
    pub fn new(
        provider: Box<dyn EthereumProvider>,
        errors: ErrorRegistry,
        events: EventRegistry,
    ) -> Self {
        Self { provider, errors, events, overrides: Overrides::default() }
    }

    /// Build the transport from configuration and wrap it with the given
    /// registries and the config's default call overrides
    pub async fn connect(
        config: &Config,
        errors: ErrorRegistry,
        events: EventRegistry,
    ) -> Result<Self> {
        let provider_config = config
            .endpoint
            .provider_config()
            .context("no endpoint configured")?;
        let provider = create_provider(provider_config).await?;
        Ok(Self::new(provider, errors, events).with_overrides(config.overrides.clone()))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn provider(&self) -> &dyn EthereumProvider {
        self.provider.as_ref()
    }

    pub fn error_registry(&self) -> &ErrorRegistry {
        &self.errors
    }

    pub fn event_registry(&self) -> &EventRegistry {
        &self.events
    }

    pub(crate) fn default_overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Node-managed accounts
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider.accounts().await
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await
    }

    pub async fn block_number(&self) -> Result<u64> {
        self.provider.block_number().await
    }

    /// Timestamp of a block (`None` means the latest block)
    pub async fn block_timestamp(&self, number: Option<u64>) -> Result<u64> {
        self.provider.block_timestamp(number).await
    }

    pub async fn storage_slot(&self, address: Address, slot: U256) -> Result<B256> {
        self.provider.get_storage_at(address, slot).await
    }

    /// The address a CREATE deployment from `from` will land at, at the
    /// account's current nonce plus `nonce_offset`
    pub async fn predict_contract_address(
        &self,
        from: Address,
        nonce_offset: u64,
    ) -> Result<Address> {
        let nonce = self.provider.get_transaction_count(from).await?;
        Ok(from.create(nonce + nonce_offset))
    }

    /// The address deployed by a historic transaction, located by block
    /// number and transaction index
    pub async fn contract_address(
        &self,
        block_number: u64,
        transaction_index: usize,
    ) -> Result<Address> {
        let hashes = self.provider.block_transactions(block_number).await?;
        let hash = hashes
            .get(transaction_index)
            .copied()
            .with_context(|| format!("no transaction {} in block {}", transaction_index, block_number))?;
        let receipt = self
            .provider
            .get_receipt(hash)
            .await?
            .with_context(|| format!("no receipt for transaction {}", hash))?;
        receipt
            .contract_address
            .with_context(|| format!("transaction {} did not deploy a contract", hash))
    }

    /// Fetch matching raw logs in one bulk call and decode them lazily
    ///
    /// The returned sequence is finite and non-restartable; stopping
    /// consumption is the only cancellation the iterator itself needs. The
    /// token, when supplied, is checked once after the fetch settles.
    pub async fn events(
        &self,
        filter: &EventFilter,
        cancel: Option<&CancellationToken>,
    ) -> Result<Events<'_>, CallError> {
        let result = self.provider.get_logs(&filter.to_filter()).await;
        check_cancelled(cancel)?;
        let logs = result.map_err(|err| self.classify_failure(err))?;
        Ok(Events::new(logs, &self.events))
    }

    /// Poll until the transaction is mined and wrap its receipt
    ///
    /// Polls forever if the node never mines the transaction; there is no
    /// timeout anywhere in this crate.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Transaction, CallError> {
        loop {
            let receipt = self
                .provider
                .get_receipt(hash)
                .await
                .map_err(|err| self.classify_failure(err))?;
            if let Some(receipt) = receipt {
                return Ok(Transaction::new(hash, receipt));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    /// Map a provider failure: a revert payload found on the error chain
    /// becomes a registry-decoded [`ContractError`], anything else passes
    /// through unmodified
    pub(crate) fn classify_failure(&self, err: anyhow::Error) -> CallError {
        let decoded = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<RpcFailure>())
            .and_then(|failure| decode_error(&self.errors, &failure.to_value()));
        match decoded {
            Some(error) => CallError::Reverted(error),
            None => CallError::Rpc(err),
        }
    }
}

/// Fail promptly once the surrounding operation has settled, if cancellation
/// was requested meanwhile
pub(crate) fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<(), CallError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(CallError::Cancelled),
        _ => Ok(()),
    }
}
