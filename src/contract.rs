//! Contract wrapper: deployment and invocation by signature
//!
//! No codegen: methods are addressed by their human-readable signature and
//! dynamic argument values, and every provider failure is run through the
//! error registry before surfacing.

use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use tokio_util::sync::CancellationToken;

use crate::client::{check_cancelled, CallError, EthClient};
use crate::domain::abi::{codec, CodecError};
use crate::transaction::Transaction;

/// Per-call overrides, merged over the client's configured defaults
///
/// The token, if supplied, is checked only after the underlying network call
/// settles: it fails the caller promptly but never aborts the in-flight
/// request.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub value: Option<U256>,
    pub nonce: Option<u64>,
    pub cancel: Option<CancellationToken>,
}

/// A deployed contract bound to a client
pub struct Contract<'a> {
    client: &'a EthClient,
    address: Address,
    deploy_transaction: Option<Transaction>,
}

impl<'a> Contract<'a> {
    /// Bind to an already-deployed contract
    pub fn at(client: &'a EthClient, address: Address) -> Self {
        Self { client, address, deploy_transaction: None }
    }

    /// Deploy a contract and wait for the deployment to mine
    ///
    /// `link_args` maps library placeholders inside the bytecode hex to
    /// addresses; constructor arguments are ABI-appended to the linked code.
    pub async fn deploy(
        client: &'a EthClient,
        bytecode: &str,
        link_args: &[(&str, Address)],
        ctor_args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<Contract<'a>, CallError> {
        let result = Self::try_deploy(client, bytecode, link_args, ctor_args, &options).await;
        check_cancelled(options.cancel.as_ref()).and(result)
    }

    async fn try_deploy(
        client: &'a EthClient,
        bytecode: &str,
        link_args: &[(&str, Address)],
        ctor_args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<Contract<'a>, CallError> {
        let mut code = link_bytecode(bytecode, link_args)?;
        code.extend_from_slice(&codec::encode_params(ctor_args));

        let request = apply_overrides(
            TransactionRequest::default().with_deploy_code(code),
            options,
            client,
        );
        let from = resolve_from(client, options).await?;
        let request = request.with_from(from);

        let hash = client
            .provider()
            .send_transaction(request)
            .await
            .map_err(|err| client.classify_failure(err))?;
        let transaction = client.wait_for_receipt(hash).await?;
        let address = transaction.contract_address().ok_or_else(|| {
            CallError::Rpc(anyhow::anyhow!("deployment receipt carries no contract address"))
        })?;
        Ok(Contract { client, address, deploy_transaction: Some(transaction) })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The mined deployment, when this instance came from [`Contract::deploy`]
    pub fn deploy_transaction(&self) -> Option<&Transaction> {
        self.deploy_transaction.as_ref()
    }

    /// Invoke a state-mutating method and wait for the receipt
    pub async fn call(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<Transaction, CallError> {
        let result = self.try_call(signature, args, &options).await;
        check_cancelled(options.cancel.as_ref()).and(result)
    }

    async fn try_call(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<Transaction, CallError> {
        let hash = self.try_send(signature, args, options).await?;
        self.client.wait_for_receipt(hash).await
    }

    /// Submit a state-mutating method without waiting for it to mine
    pub async fn send_transaction(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<B256, CallError> {
        let result = self.try_send(signature, args, &options).await;
        check_cancelled(options.cancel.as_ref()).and(result)
    }

    async fn try_send(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<B256, CallError> {
        let request = self.prepared_request(signature, args, options).await?;
        self.client
            .provider()
            .send_transaction(request)
            .await
            .map_err(|err| self.client.classify_failure(err))
    }

    /// Execute the method read-only (eth_call) and return the raw result
    pub async fn call_static(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<Bytes, CallError> {
        let result = self.try_call_static(signature, args, &options).await;
        check_cancelled(options.cancel.as_ref()).and(result)
    }

    async fn try_call_static(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<Bytes, CallError> {
        let request = self.prepared_request(signature, args, options).await?;
        self.client
            .provider()
            .call(request)
            .await
            .map_err(|err| self.client.classify_failure(err))
    }

    /// [`call_static`](Self::call_static) plus decoding of the returned data
    pub async fn query(
        &self,
        signature: &str,
        args: &[DynSolValue],
        returns: &[&str],
        options: CallOptions,
    ) -> Result<Vec<DynSolValue>, CallError> {
        let data = self.call_static(signature, args, options).await?;
        let names: Vec<String> = returns.iter().map(|name| name.to_string()).collect();
        let types = codec::parse_types(&names)?;
        Ok(codec::decode_params(&types, &data)?)
    }

    /// Estimate the gas the method would consume
    pub async fn estimate_gas(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<u64, CallError> {
        let result = async {
            let request = self.prepared_request(signature, args, &options).await?;
            self.client
                .provider()
                .estimate_gas(request)
                .await
                .map_err(|err| self.client.classify_failure(err))
        }
        .await;
        check_cancelled(options.cancel.as_ref()).and(result)
    }

    /// Build the transaction request without resolving a sender or sending
    pub fn populate(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<TransactionRequest, CallError> {
        let calldata = codec::encode_call(signature, args)?;
        let request = TransactionRequest::default()
            .with_to(self.address)
            .with_input(calldata);
        Ok(apply_overrides(request, options, self.client))
    }

    async fn prepared_request(
        &self,
        signature: &str,
        args: &[DynSolValue],
        options: &CallOptions,
    ) -> Result<TransactionRequest, CallError> {
        let request = self.populate(signature, args, options)?;
        let from = resolve_from(self.client, options).await?;
        Ok(request.with_from(from))
    }

    /// Encode a call: selector plus ABI-encoded arguments
    pub fn encode(signature: &str, args: &[DynSolValue]) -> Result<Bytes, CodecError> {
        codec::encode_call(signature, args)
    }
}

fn apply_overrides(
    mut request: TransactionRequest,
    options: &CallOptions,
    client: &EthClient,
) -> TransactionRequest {
    let defaults = client.default_overrides();
    if let Some(gas) = options.gas.or(defaults.gas) {
        request = request.with_gas_limit(gas);
    }
    if let Some(gas_price) = options.gas_price.or(defaults.gas_price) {
        request = request.with_gas_price(gas_price);
    }
    if let Some(value) = options.value {
        request = request.with_value(value);
    }
    if let Some(nonce) = options.nonce {
        request = request.with_nonce(nonce);
    }
    request
}

async fn resolve_from(client: &EthClient, options: &CallOptions) -> Result<Address, CallError> {
    if let Some(from) = options.from.or(client.default_overrides().from) {
        return Ok(from);
    }
    let accounts = client
        .accounts()
        .await
        .map_err(|err| client.classify_failure(err))?;
    accounts
        .first()
        .copied()
        .ok_or_else(|| CallError::Rpc(anyhow::anyhow!("node exposes no accounts")))
}

fn link_bytecode(bytecode: &str, link_args: &[(&str, Address)]) -> Result<Vec<u8>, CodecError> {
    let trimmed = bytecode.trim();
    let mut code = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_string();
    for (placeholder, address) in link_args {
        code = code.replace(placeholder, &hex::encode(address));
    }
    Ok(hex::decode(&code)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_bytecode_substitutes_placeholders() {
        let placeholder = "__$math$__";
        let address = Address::from([0xAB; 20]);
        let bytecode = format!("0x6001{}6002", placeholder);

        let linked = link_bytecode(&bytecode, &[(placeholder, address)]).unwrap();
        let expected = format!("6001{}6002", hex::encode(address));
        assert_eq!(hex::encode(&linked), expected);
    }

    #[test]
    fn test_link_bytecode_rejects_unlinked_placeholders() {
        // A placeholder left behind is not valid hex.
        assert!(link_bytecode("0x6001__$math$__6002", &[]).is_err());
    }

    #[test]
    fn test_encode_is_selector_plus_args() {
        let calldata = Contract::encode("totalSupply()", &[]).unwrap();
        assert_eq!(calldata.len(), 4);
    }
}
