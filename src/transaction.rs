//! Mined-transaction wrapper

use std::time::Duration;

use alloy::rpc::types::TransactionReceipt;
use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Result};

use crate::client::EthClient;
use crate::domain::abi::CodecError;
use crate::domain::event::{ContractEvent, EventRegistry};

/// How often confirmation waiting re-checks the chain head
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A submitted transaction together with its mined receipt
#[derive(Debug, Clone)]
pub struct Transaction {
    hash: B256,
    receipt: TransactionReceipt,
}

impl Transaction {
    pub fn new(hash: B256, receipt: TransactionReceipt) -> Self {
        Self { hash, receipt }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn receipt(&self) -> &TransactionReceipt {
        &self.receipt
    }

    /// The address created by this transaction, when it was a deployment
    pub fn contract_address(&self) -> Option<Address> {
        self.receipt.contract_address
    }

    pub fn block_number(&self) -> Option<u64> {
        self.receipt.block_number
    }

    pub fn success(&self) -> bool {
        self.receipt.status()
    }

    /// Effective cost of the transaction: gas used times effective gas price
    pub fn gas_cost(&self) -> U256 {
        U256::from(self.receipt.gas_used) * U256::from(self.receipt.effective_gas_price)
    }

    /// Decode every log this transaction emitted
    ///
    /// Logs with unregistered topics come back as unknown events; malformed
    /// data against a registered fragment is an error.
    pub fn events(&self, registry: &EventRegistry) -> Result<Vec<ContractEvent>, CodecError> {
        self.receipt
            .inner
            .logs()
            .iter()
            .cloned()
            .map(|log| registry.decode(log))
            .collect()
    }

    /// Poll until the chain head is `confirmations` blocks past this
    /// transaction's block
    pub async fn wait(&self, client: &EthClient, confirmations: u64) -> Result<()> {
        let Some(mined) = self.block_number() else {
            bail!("receipt for {} is missing a block number", self.hash);
        };
        loop {
            let head = client.block_number().await?;
            if head + 1 >= mined + confirmations {
                return Ok(());
            }
            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }
}
