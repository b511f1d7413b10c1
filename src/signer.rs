//! Node-account signer
//!
//! Signing is delegated to the node (`eth_sendTransaction` against an
//! unlocked or dev-node account); the signer itself is just an address
//! selection.

use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy_primitives::Address;

use crate::client::{CallError, EthClient};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy)]
pub struct Signer {
    address: Address,
}

impl Signer {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The node's first account
    pub async fn first(client: &EthClient) -> Result<Self, CallError> {
        let accounts = client
            .accounts()
            .await
            .map_err(|err| client.classify_failure(err))?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| CallError::Rpc(anyhow::anyhow!("node exposes no accounts")))?;
        Ok(Self { address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Submit a transaction from this signer's account and wait for the
    /// receipt
    pub async fn send_transaction(
        &self,
        client: &EthClient,
        request: TransactionRequest,
    ) -> Result<Transaction, CallError> {
        let request = request.with_from(self.address);
        let hash = client
            .provider()
            .send_transaction(request)
            .await
            .map_err(|err| client.classify_failure(err))?;
        client.wait_for_receipt(hash).await
    }
}
