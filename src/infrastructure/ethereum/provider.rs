//! Ethereum provider abstraction and Alloy implementations
//!
//! Every operation is a single request/response against the configured
//! transport: no timeouts, no retries, no batching. A hung node call hangs
//! the caller.

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use anyhow::{Context, Result};

use super::RpcFailure;

/// Provider configuration
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Abstract Ethereum provider trait
///
/// The operations the facade needs, abstracted over the specific Alloy
/// transport (and replaceable by a mock in tests).
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Get the current block number
    async fn block_number(&self) -> Result<u64>;

    /// Get a block's timestamp (`None` means the latest block)
    async fn block_timestamp(&self, number: Option<u64>) -> Result<u64>;

    /// Get the transaction hashes of a block
    async fn block_transactions(&self, number: u64) -> Result<Vec<B256>>;

    /// Get available accounts (node-managed signing keys)
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Get account balance
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Get account transaction count (nonce)
    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    /// Get storage at a specific slot
    async fn get_storage_at(&self, address: Address, slot: U256) -> Result<B256>;

    /// Get logs matching a filter in one bulk call
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>>;

    /// Execute a read-only call (eth_call)
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Estimate the gas a call would consume
    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64>;

    /// Submit a transaction, returning its hash without waiting for a receipt
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Get transaction receipt
    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

// Type aliases for the filled providers
type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

type WsFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

#[cfg(unix)]
type IpcFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Enum-based provider that stores concrete types for each transport
pub enum AlloyProvider {
    Http {
        provider: HttpFillProvider,
        endpoint: String,
    },
    WebSocket {
        provider: WsFillProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: IpcFillProvider,
        endpoint: String,
    },
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn EthereumProvider>> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyProvider::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyProvider::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc_path = path.to_string_lossy().to_string();
            let ipc = IpcConnect::new(ipc_path);
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            let display = path.display().to_string();
            Ok(Box::new(AlloyProvider::Ipc {
                provider,
                endpoint: display,
            }))
        }
    }
}

/// Surface a JSON-RPC error response as a typed [`RpcFailure`] on the anyhow
/// chain; transport failures pass through unmodified
fn surface_rpc_error(err: RpcError<TransportErrorKind>) -> anyhow::Error {
    match err {
        RpcError::ErrorResp(payload) => {
            let data = payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str(raw.get()).ok());
            anyhow::Error::new(RpcFailure {
                code: payload.code,
                message: payload.message.to_string(),
                data,
            })
        }
        other => anyhow::Error::new(other),
    }
}

// Macro to reduce code duplication for provider method implementations
macro_rules! impl_provider_method {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            AlloyProvider::Http { provider, .. } => provider.$method($($arg),*).await,
            AlloyProvider::WebSocket { provider, .. } => provider.$method($($arg),*).await,
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => provider.$method($($arg),*).await,
        }
    };
}

impl AlloyProvider {
    /// Fetch a block as raw JSON (header only) to stay chain-agnostic
    async fn block_json(&self, tag: &str) -> Result<serde_json::Value> {
        let json: serde_json::Value =
            impl_provider_method!(self, raw_request, "eth_getBlockByNumber".into(), (tag, false))
                .map_err(surface_rpc_error)?;
        Ok(json)
    }
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn block_number(&self) -> Result<u64> {
        impl_provider_method!(self, get_block_number).map_err(surface_rpc_error)
    }

    async fn block_timestamp(&self, number: Option<u64>) -> Result<u64> {
        let tag = match number {
            Some(number) => format!("0x{:x}", number),
            None => "latest".to_string(),
        };
        let json = self.block_json(&tag).await?;
        if json.is_null() {
            anyhow::bail!("block {} not found", tag);
        }
        parse_hex_u64(json.get("timestamp").and_then(|v| v.as_str()).unwrap_or("0x0"))
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<B256>> {
        let json = self.block_json(&format!("0x{:x}", number)).await?;
        if json.is_null() {
            anyhow::bail!("block {} not found", number);
        }
        let mut hashes = Vec::new();
        if let Some(txs) = json.get("transactions").and_then(|v| v.as_array()) {
            for tx in txs {
                // With full-transactions disabled each entry is a hash string.
                if let Some(hash) = tx.as_str() {
                    hashes.push(hash.parse().context("invalid transaction hash in block")?);
                }
            }
        }
        Ok(hashes)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        impl_provider_method!(self, get_accounts).map_err(surface_rpc_error)
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        impl_provider_method!(self, get_balance, address).map_err(surface_rpc_error)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        impl_provider_method!(self, get_transaction_count, address).map_err(surface_rpc_error)
    }

    async fn get_storage_at(&self, address: Address, slot: U256) -> Result<B256> {
        let value =
            impl_provider_method!(self, get_storage_at, address, slot).map_err(surface_rpc_error)?;
        Ok(B256::from(value))
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        impl_provider_method!(self, get_logs, filter).map_err(surface_rpc_error)
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        match self {
            AlloyProvider::Http { provider, .. } => {
                provider.call(request).await.map_err(surface_rpc_error)
            }
            AlloyProvider::WebSocket { provider, .. } => {
                provider.call(request).await.map_err(surface_rpc_error)
            }
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => {
                provider.call(request).await.map_err(surface_rpc_error)
            }
        }
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        match self {
            AlloyProvider::Http { provider, .. } => {
                provider.estimate_gas(request).await.map_err(surface_rpc_error)
            }
            AlloyProvider::WebSocket { provider, .. } => {
                provider.estimate_gas(request).await.map_err(surface_rpc_error)
            }
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => {
                provider.estimate_gas(request).await.map_err(surface_rpc_error)
            }
        }
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = match self {
            AlloyProvider::Http { provider, .. } => {
                provider.send_transaction(request).await.map_err(surface_rpc_error)?
            }
            AlloyProvider::WebSocket { provider, .. } => {
                provider.send_transaction(request).await.map_err(surface_rpc_error)?
            }
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => {
                provider.send_transaction(request).await.map_err(surface_rpc_error)?
            }
        };
        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        impl_provider_method!(self, get_transaction_receipt, hash).map_err(surface_rpc_error)
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyProvider::Http { endpoint, .. } => endpoint.clone(),
            AlloyProvider::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyProvider::Ipc { endpoint, .. } => endpoint.clone(),
        }
    }
}

/// Parse hex string to u64
fn parse_hex_u64(s: &str) -> Result<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).context("Failed to parse hex u64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x10").unwrap(), 16);
        assert_eq!(parse_hex_u64("ff").unwrap(), 255);
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn test_provider_config_display() {
        let config = ProviderConfig::Http("http://localhost:8545".into());
        assert_eq!(config.display(), "http://localhost:8545");
    }
}
