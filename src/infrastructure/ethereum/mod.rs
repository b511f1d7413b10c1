//! Ethereum infrastructure - Alloy provider implementations

mod provider;

pub use provider::{create_provider, EthereumProvider, ProviderConfig};

use serde::Serialize;

/// A structured JSON-RPC error response surfaced by a provider call
///
/// Attached to the `anyhow` chain so callers can recover the payload and
/// feed it to the error decoder; its serialized form is exactly the
/// `{code, message, data}` object shape the decoder searches for.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcFailure {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcFailure {
    /// The payload as a JSON value, ready for the error decoder
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
