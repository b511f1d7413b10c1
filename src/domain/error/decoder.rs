//! Revert-data decoding and the provider-error search heuristic

use alloy_primitives::Bytes;
use serde_json::Value;

use super::{ContractError, ErrorRegistry};
use crate::domain::abi::{codec, signature, CodecError};

/// Recursion bound for [`decode_error`]'s payload search. `serde_json`
/// values are trees, so this only guards against pathologically deep input.
const MAX_SEARCH_DEPTH: usize = 32;

/// Decode raw revert data into a structured error
///
/// Zero-length data is a reasonless revert; otherwise the first 4 bytes
/// route to a registered descriptor. An unregistered selector (including
/// data shorter than a selector) yields [`ContractError::Unknown`] with the
/// bytes preserved verbatim. Malformed bytes against a registered type list
/// are an error, not an `Unknown`.
pub fn decode_error_data(
    registry: &ErrorRegistry,
    data: &[u8],
) -> Result<ContractError, CodecError> {
    if data.is_empty() {
        return Ok(ContractError::RevertWithoutReason);
    }
    if data.len() < 4 {
        return Ok(ContractError::Unknown { data: Bytes::copy_from_slice(data) });
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    match registry.lookup(selector) {
        Some(descriptor) => {
            let args = codec::decode_params(&descriptor.types, &data[4..])?;
            Ok((descriptor.factory)(args))
        }
        None => Ok(ContractError::Unknown { data: Bytes::copy_from_slice(data) }),
    }
}

/// [`decode_error_data`] over a `0x`-prefixed hex string
pub fn decode_error_hex(registry: &ErrorRegistry, data: &str) -> Result<ContractError, CodecError> {
    let stripped = data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")).unwrap_or(data);
    let bytes = hex::decode(stripped)?;
    decode_error_data(registry, &bytes)
}

/// Extract a structured error from an opaque provider error payload
///
/// `None` means no structured error was found and the caller should keep the
/// original. Decoding failures inside the search are logged and also yield
/// `None`: this function recovers totally from malformed input.
pub fn decode_error(registry: &ErrorRegistry, error: &Value) -> Option<ContractError> {
    match try_decode_error(registry, error) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode provider error, passing it through");
            None
        }
    }
}

fn try_decode_error(
    registry: &ErrorRegistry,
    error: &Value,
) -> Result<Option<ContractError>, CodecError> {
    // Some providers pre-decode the revert into a signature/name/args triple.
    if let Some(sig) = error.get("errorSignature").and_then(Value::as_str) {
        return decode_predecoded(registry, error, sig).map(Some);
    }
    search(registry, error, 0)
}

fn decode_predecoded(
    registry: &ErrorRegistry,
    error: &Value,
    sig: &str,
) -> Result<ContractError, CodecError> {
    let args = error
        .get("errorArgs")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    match registry.lookup(signature::selector_of(sig)) {
        Some(descriptor) => {
            if args.len() != descriptor.types.len() {
                return Err(CodecError::Arity {
                    expected: descriptor.types.len(),
                    got: args.len(),
                });
            }
            let values = descriptor
                .types
                .iter()
                .zip(&args)
                .map(|(ty, arg)| codec::coerce_json(ty, arg))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((descriptor.factory)(values))
        }
        None => {
            let name = error
                .get("errorName")
                .and_then(Value::as_str)
                .unwrap_or_else(|| signature::name_of(sig));
            Ok(ContractError::Named { name: name.to_string(), args })
        }
    }
}

/// Pre-order depth-first search for the first nested object exposing a
/// `{message: string, code: number, data: string}` shape
///
/// Only property values and array elements are visited; arbitrary message
/// strings are never substring-searched, only the `message` field of a
/// shape-matching object.
fn search(
    registry: &ErrorRegistry,
    value: &Value,
    depth: usize,
) -> Result<Option<ContractError>, CodecError> {
    if depth >= MAX_SEARCH_DEPTH {
        return Ok(None);
    }

    if let Value::Object(fields) = value {
        let message = fields.get("message").and_then(Value::as_str);
        let code = fields.get("code").filter(|code| code.is_number());
        let data = fields.get("data").and_then(Value::as_str);
        if let (Some(message), Some(_), Some(data)) = (message, code, data) {
            if message.contains("revert") && is_hex(data) {
                return decode_error_hex(registry, data).map(Some);
            }
            if message.contains("out of gas") {
                return Ok(Some(ContractError::OutOfGas));
            }
            // Shape matched but neither rule applied: keep searching inside.
        }
    }

    match value {
        Value::Object(fields) => {
            for nested in fields.values() {
                if let Some(found) = search(registry, nested, depth + 1)? {
                    return Ok(Some(found));
                }
            }
        }
        Value::Array(items) => {
            for nested in items {
                if let Some(found) = search(registry, nested, depth + 1)? {
                    return Ok(Some(found));
                }
            }
        }
        _ => {}
    }
    Ok(None)
}

fn is_hex(data: &str) -> bool {
    data.strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .is_some_and(|stripped| {
            stripped.len() % 2 == 0 && stripped.chars().all(|ch| ch.is_ascii_hexdigit())
        })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use serde_json::json;

    use super::*;

    fn revert_data(registry: &ErrorRegistry, reason: &str) -> String {
        let error = ContractError::Revert { reason: reason.to_string() };
        format!("0x{}", hex::encode(error.encode(registry).unwrap()))
    }

    #[test]
    fn test_empty_data_is_revert_without_reason() {
        let registry = ErrorRegistry::new();
        assert_eq!(
            decode_error_data(&registry, &[]).unwrap(),
            ContractError::RevertWithoutReason
        );
        assert_eq!(
            decode_error_hex(&registry, "0x").unwrap(),
            ContractError::RevertWithoutReason
        );
    }

    #[test]
    fn test_unregistered_selector_preserves_bytes() {
        let registry = ErrorRegistry::new();
        let data = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];
        let decoded = decode_error_data(&registry, &data).unwrap();
        assert_eq!(decoded, ContractError::Unknown { data: Bytes::copy_from_slice(&data) });

        // Shorter than a selector is unknown too, never a panic.
        let short = [0xab];
        let decoded = decode_error_data(&registry, &short).unwrap();
        assert_eq!(decoded, ContractError::Unknown { data: Bytes::copy_from_slice(&short) });
    }

    #[test]
    fn test_default_error_fixed_vector() {
        // Error("boom"): selector, offset 0x20, length 4, "boom" padded.
        let registry = ErrorRegistry::new();
        let data = concat!(
            "0x08c379a0",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "626f6f6d00000000000000000000000000000000000000000000000000000000",
        );
        assert_eq!(
            decode_error_hex(&registry, data).unwrap(),
            ContractError::Revert { reason: "boom".into() }
        );
    }

    #[test]
    fn test_round_trip_registered_variants() {
        let mut registry = ErrorRegistry::new();
        registry.register_signature("OneArgUint256Error(uint256)").unwrap();

        let samples = vec![
            ContractError::Revert { reason: "boom".into() },
            ContractError::Panic { code: U256::from(0x11u64) },
            ContractError::Custom {
                name: "OneArgUint256Error".into(),
                signature: "OneArgUint256Error(uint256)".into(),
                args: vec![alloy_dyn_abi::DynSolValue::Uint(U256::from(1u64), 256)],
            },
            ContractError::RevertWithoutReason,
        ];
        for sample in samples {
            let encoded = sample.encode(&registry).unwrap();
            assert_eq!(decode_error_data(&registry, &encoded).unwrap(), sample);
        }
    }

    #[test]
    fn test_malformed_bytes_for_registered_selector_raise() {
        let registry = ErrorRegistry::new();
        // Error(string) selector followed by garbage.
        let result = decode_error_hex(&registry, "0x08c379a0deadbeef");
        assert!(result.is_err());
    }

    #[test]
    fn test_search_finds_nested_revert_payload() {
        let registry = ErrorRegistry::new();
        let data = revert_data(&registry, "nope");
        let error = json!({
            "code": -32000,
            "message": "call failed",
            "error": {
                "message": "execution reverted: nope",
                "code": 3,
                "data": data,
            },
        });
        assert_eq!(
            decode_error(&registry, &error),
            Some(ContractError::Revert { reason: "nope".into() })
        );
    }

    #[test]
    fn test_search_detects_out_of_gas_regardless_of_registry() {
        let registry = ErrorRegistry::empty();
        let error = json!({
            "error": {
                "message": "base fee exceeded: out of gas",
                "code": -32603,
                "data": "not hex",
            },
        });
        assert_eq!(decode_error(&registry, &error), Some(ContractError::OutOfGas));
    }

    #[test]
    fn test_search_ignores_shapeless_graphs() {
        let registry = ErrorRegistry::new();
        let error = json!({
            "message": "revert", // no code/data siblings: shape does not match
            "nested": { "messages": ["revert", "out of gas"] },
        });
        assert_eq!(decode_error(&registry, &error), None);
    }

    #[test]
    fn test_search_depth_is_bounded() {
        let registry = ErrorRegistry::new();
        let mut error = json!({"leaf": true});
        for _ in 0..200 {
            error = json!({ "wrapped": error });
        }
        assert_eq!(decode_error(&registry, &error), None);
    }

    #[test]
    fn test_predecoded_registered_signature() {
        let mut registry = ErrorRegistry::new();
        registry.register_signature("OneArgUint256Error(uint256)").unwrap();
        let error = json!({
            "errorSignature": "OneArgUint256Error(uint256)",
            "errorName": "OneArgUint256Error",
            "errorArgs": [1],
        });
        let decoded = decode_error(&registry, &error).unwrap();
        assert_eq!(
            decoded,
            ContractError::Custom {
                name: "OneArgUint256Error".into(),
                signature: "OneArgUint256Error(uint256)".into(),
                args: vec![alloy_dyn_abi::DynSolValue::Uint(U256::from(1u64), 256)],
            }
        );
    }

    #[test]
    fn test_predecoded_unregistered_signature_synthesizes_named() {
        let registry = ErrorRegistry::new();
        let error = json!({
            "errorSignature": "Mystery(uint256,string)",
            "errorName": "Mystery",
            "errorArgs": [7, "x"],
        });
        assert_eq!(
            decode_error(&registry, &error),
            Some(ContractError::Named {
                name: "Mystery".into(),
                args: vec![json!(7), json!("x")],
            })
        );
    }

    #[test]
    fn test_malformed_predecoded_payload_recovers_to_none() {
        let mut registry = ErrorRegistry::new();
        registry.register_signature("OneArgUint256Error(uint256)").unwrap();
        // Wrong arity: decoding raises internally, decode_error recovers.
        let error = json!({
            "errorSignature": "OneArgUint256Error(uint256)",
            "errorArgs": [1, 2, 3],
        });
        assert_eq!(decode_error(&registry, &error), None);
    }
}
