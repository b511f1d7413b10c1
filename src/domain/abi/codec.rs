//! Parameter codec over alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;

use super::{signature, CodecError};

/// Parse a list of ABI type names into dynamic Solidity types
pub fn parse_types(names: &[String]) -> Result<Vec<DynSolType>, CodecError> {
    names
        .iter()
        .map(|name| DynSolType::parse(name).map_err(|_| CodecError::InvalidType(name.clone())))
        .collect()
}

/// ABI-encode a parameter sequence (no selector)
pub fn encode_params(values: &[DynSolValue]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }
    DynSolValue::Tuple(values.to_vec()).abi_encode_params()
}

/// ABI-decode a parameter sequence against the declared types
///
/// Malformed bytes surface as an error, never as a partial result.
pub fn decode_params(types: &[DynSolType], data: &[u8]) -> Result<Vec<DynSolValue>, CodecError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let tuple = DynSolType::Tuple(types.to_vec());
    match tuple.abi_decode_params(data).map_err(CodecError::Decode)? {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

/// Coerce a JSON value into a dynamic Solidity value of the given type
///
/// Used when a provider hands back pre-decoded error arguments as JSON.
pub fn coerce_json(ty: &DynSolType, value: &serde_json::Value) -> Result<DynSolValue, CodecError> {
    let text = match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ty.coerce_str(&text).map_err(|source| CodecError::Coerce {
        ty: ty.to_string(),
        source,
    })
}

/// Encode a call: selector followed by the ABI-encoded arguments
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Result<Bytes, CodecError> {
    let params = signature::param_types(signature)?;
    if params.len() != args.len() {
        return Err(CodecError::Arity {
            expected: params.len(),
            got: args.len(),
        });
    }
    let selector = signature::selector_of(signature);
    let encoded = encode_params(args);
    let mut out = Vec::with_capacity(4 + encoded.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(&encoded);
    Ok(out.into())
}

/// Format a decoded value for display
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => format!("{:?}", addr),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(bytes, size) => format!("0x{}", hex::encode(&bytes[..*size])),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            let formatted: Vec<String> = values.iter().map(format_value).collect();
            format!("[{}]", formatted.join(", "))
        }
        DynSolValue::Tuple(values) => {
            let formatted: Vec<String> = values.iter().map(format_value).collect();
            format!("({})", formatted.join(", "))
        }
        other => format!("{:?}", other),
    }
}
