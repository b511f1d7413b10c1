//! End-to-end decoding scenarios: a registry populated the way an embedding
//! application would, driven through revert data and provider error payloads.

use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Bytes, U256};
use serde_json::json;
use sigil::{decode_error, decode_error_data, decode_error_hex, ContractError, ErrorRegistry};

/// The registry an application would build at startup: built-ins plus a few
/// project-specific errors.
fn test_registry() -> ErrorRegistry {
    let mut registry = ErrorRegistry::new();
    registry.register_signature("NoArgsError()").unwrap();
    registry.register_signature("OneArgUint256Error(uint256)").unwrap();
    registry.register_signature("OneArgStringError(string)").unwrap();
    registry
}

fn one_arg_uint(value: u64) -> ContractError {
    ContractError::Custom {
        name: "OneArgUint256Error".into(),
        signature: "OneArgUint256Error(uint256)".into(),
        args: vec![DynSolValue::Uint(U256::from(value), 256)],
    }
}

#[test]
fn decode_of_encode_round_trips_every_registered_variant() {
    let registry = test_registry();
    let samples = vec![
        ContractError::Revert { reason: "error".into() },
        ContractError::Panic { code: U256::from(0x12u64) },
        ContractError::Custom {
            name: "NoArgsError".into(),
            signature: "NoArgsError()".into(),
            args: vec![],
        },
        one_arg_uint(1),
        ContractError::Custom {
            name: "OneArgStringError".into(),
            signature: "OneArgStringError(string)".into(),
            args: vec![DynSolValue::String("error".into())],
        },
        ContractError::RevertWithoutReason,
    ];

    for sample in samples {
        let encoded = sample.encode(&registry).unwrap();
        let decoded = decode_error_data(&registry, &encoded).unwrap();
        assert_eq!(decoded, sample);
    }
}

#[test]
fn unknown_error_carries_bytes_and_refuses_to_encode() {
    let registry = test_registry();
    let data = vec![0xde, 0xad, 0xbe, 0xef, 0xff];

    let decoded = decode_error_data(&registry, &data).unwrap();
    assert_eq!(decoded, ContractError::Unknown { data: Bytes::from(data) });
    assert!(decoded.encode(&registry).is_err());
}

#[test]
fn empty_revert_data_is_always_reasonless() {
    // Holds even with nothing registered.
    assert_eq!(
        decode_error_data(&ErrorRegistry::empty(), &[]).unwrap(),
        ContractError::RevertWithoutReason
    );
}

#[test]
fn provider_payload_with_default_error_decodes() {
    let registry = test_registry();
    let reason = ContractError::Revert { reason: "error".into() };
    let data = format!("0x{}", hex::encode(reason.encode(&registry).unwrap()));

    // The wrapped shape a node hands back for a failed eth_call.
    let payload = json!({
        "code": -32000,
        "message": "call failed",
        "error": {
            "message": "execution reverted: error",
            "code": 3,
            "data": data,
        },
    });

    assert_eq!(decode_error(&registry, &payload), Some(reason));
}

#[test]
fn provider_payload_with_custom_error_exposes_argument() {
    let registry = test_registry();
    let expected = one_arg_uint(1);
    let data = format!("0x{}", hex::encode(expected.encode(&registry).unwrap()));

    let payload = json!({
        "message": "execution reverted",
        "code": 3,
        "data": data,
    });

    let decoded = decode_error(&registry, &payload).unwrap();
    assert_eq!(decoded, expected);
    match decoded {
        ContractError::Custom { args, .. } => {
            assert_eq!(args, vec![DynSolValue::Uint(U256::from(1u64), 256)]);
        }
        other => panic!("expected custom error, got {:?}", other),
    }
}

#[test]
fn out_of_gas_wins_regardless_of_registry_contents() {
    for registry in [ErrorRegistry::empty(), test_registry()] {
        let payload = json!({
            "error": {
                "message": "gas required exceeds allowance: out of gas",
                "code": -32000,
                "data": "0x",
            },
        });
        assert_eq!(decode_error(&registry, &payload), Some(ContractError::OutOfGas));
    }
}

#[test]
fn unstructured_payload_passes_through() {
    let registry = test_registry();
    let payload = json!({
        "code": -32002,
        "message": "nonce too low",
    });
    assert_eq!(decode_error(&registry, &payload), None);
}

#[test]
fn first_registration_for_a_selector_wins_end_to_end() {
    let mut registry = ErrorRegistry::new();
    registry.register_signature("Duplicate(uint256)").unwrap();
    // Second registration under the same signature: different factory.
    registry
        .register(
            "Duplicate(uint256)",
            Arc::new(|_| ContractError::Revert { reason: "second".into() }),
            Arc::new(|_| None),
        )
        .unwrap();

    let original = ContractError::Custom {
        name: "Duplicate".into(),
        signature: "Duplicate(uint256)".into(),
        args: vec![DynSolValue::Uint(U256::from(9u64), 256)],
    };
    let encoded = original.encode(&registry).unwrap();
    assert_eq!(decode_error_data(&registry, &encoded).unwrap(), original);
}

#[test]
fn hex_entry_point_matches_byte_entry_point() {
    let registry = test_registry();
    let sample = one_arg_uint(7);
    let encoded = sample.encode(&registry).unwrap();

    let from_hex = decode_error_hex(&registry, &format!("0x{}", hex::encode(&encoded))).unwrap();
    let from_bytes = decode_error_data(&registry, &encoded).unwrap();
    assert_eq!(from_hex, from_bytes);
}
