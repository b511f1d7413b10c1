//! Error/function signature hashing and parameter extraction

use alloy_primitives::{keccak256, B256};

use super::CodecError;

/// Compute the 4-byte selector for a signature string
///
/// The selector is the first 4 bytes of keccak256 over the UTF-8 bytes of
/// the normalized signature (e.g. `"Error(string)"` -> `0x08c379a0`).
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(normalize(signature).as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Compute the full 32-byte hash of a signature string (log topics)
pub fn topic_of(signature: &str) -> B256 {
    keccak256(normalize(signature).as_bytes())
}

/// Normalize a signature: drop any `returns` clause and all whitespace
pub fn normalize(signature: &str) -> String {
    let signature = if let Some(pos) = signature.find("returns") {
        signature[..pos].trim()
    } else {
        signature.trim()
    };
    signature.replace(' ', "")
}

/// The name part of a signature (everything before the parameter list)
pub fn name_of(signature: &str) -> &str {
    match signature.find('(') {
        Some(pos) => &signature[..pos],
        None => signature,
    }
}

/// Extract the parameter type names from a signature's parenthesized list
///
/// Splits on top-level commas only, so tuple parameters like
/// `"F((uint256,address),bytes32)"` come back as two entries.
pub fn param_types(signature: &str) -> Result<Vec<String>, CodecError> {
    let normalized = normalize(signature);
    let open = normalized
        .find('(')
        .ok_or_else(|| CodecError::MalformedSignature(signature.to_string()))?;
    let close = normalized
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| CodecError::MalformedSignature(signature.to_string()))?;

    let inner = &normalized[open + 1..close];
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut types = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, ch) in inner.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| CodecError::MalformedSignature(signature.to_string()))?;
            }
            ',' if depth == 0 => {
                types.push(inner[start..index].to_string());
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CodecError::MalformedSignature(signature.to_string()));
    }
    types.push(inner[start..].to_string());

    if types.iter().any(|ty| ty.is_empty()) {
        return Err(CodecError::MalformedSignature(signature.to_string()));
    }
    Ok(types)
}
