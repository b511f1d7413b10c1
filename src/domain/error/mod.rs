//! Contract error domain: the revert sum type, its registry, and decoding

mod decoder;
mod registry;

pub use decoder::{decode_error, decode_error_data, decode_error_hex};
pub use registry::{ErrorDescriptor, ErrorEncoder, ErrorFactory, ErrorRegistry};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Bytes, U256};

use super::abi::{codec, signature, CodecError};

/// Signature of the Solidity default revert error
pub const DEFAULT_ERROR_SIG: &str = "Error(string)";

/// Signature of the Solidity panic error
pub const PANIC_SIG: &str = "Panic(uint256)";

/// A structured contract failure decoded from revert data or a provider
/// error payload
///
/// One case per concrete kind plus the `Unknown` catch-all; dispatch happens
/// by selector lookup, not by downcasting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    /// Revert data whose selector has no registered descriptor; carries the
    /// raw bytes verbatim for later inspection
    #[error("unknown error {data}")]
    Unknown { data: Bytes },

    /// A revert with zero-length return data
    #[error("revert without reason")]
    RevertWithoutReason,

    /// The call ran out of gas before completing
    #[error("out of gas")]
    OutOfGas,

    /// The Solidity default error, `Error(string)`
    #[error("{reason}")]
    Revert { reason: String },

    /// A Solidity panic, `Panic(uint256)`
    #[error("panic {code}")]
    Panic { code: U256 },

    /// A registered custom error with its decoded arguments in declared order
    #[error("{name}({})", display_values(.args))]
    Custom {
        name: String,
        signature: String,
        args: Vec<DynSolValue>,
    },

    /// A provider-pre-decoded error whose signature has no registered
    /// descriptor; carries the raw JSON arguments
    #[error("{name}({})", display_json(.args))]
    Named {
        name: String,
        args: Vec<serde_json::Value>,
    },
}

impl ContractError {
    /// The signature this variant encodes under, if it has one
    pub fn signature(&self) -> Option<&str> {
        match self {
            ContractError::Revert { .. } => Some(DEFAULT_ERROR_SIG),
            ContractError::Panic { .. } => Some(PANIC_SIG),
            ContractError::Custom { signature, .. } => Some(signature),
            _ => None,
        }
    }

    /// Encode this error back to raw revert data: selector followed by the
    /// ABI-encoded fields in declared order
    ///
    /// Left inverse of [`decode_error_data`] for every registered variant.
    /// `RevertWithoutReason` encodes to the literal empty data; `Unknown`
    /// (and the other signature-less variants) cannot be encoded.
    pub fn encode(&self, registry: &ErrorRegistry) -> Result<Bytes, CodecError> {
        if matches!(self, ContractError::RevertWithoutReason) {
            return Ok(Bytes::new());
        }
        let sig = self.signature().ok_or(CodecError::MissingSignature)?;
        let descriptor = registry
            .lookup(signature::selector_of(sig))
            .ok_or_else(|| CodecError::UnregisteredSignature(sig.to_string()))?;
        let values = (descriptor.encode)(self)
            .ok_or_else(|| CodecError::EncoderMismatch(descriptor.signature.clone()))?;
        let encoded = codec::encode_params(&values);
        let mut out = Vec::with_capacity(4 + encoded.len());
        out.extend_from_slice(&descriptor.selector);
        out.extend_from_slice(&encoded);
        Ok(out.into())
    }
}

fn display_values(values: &[DynSolValue]) -> String {
    values.iter().map(codec::format_value).collect::<Vec<_>>().join(", ")
}

fn display_json(values: &[serde_json::Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
