//! Value and hex-string helpers

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;
use anyhow::{Context, Result};

/// Parse a decimal amount into its integer representation
///
/// `decimals` defaults to 18 in the common ether case; pass the token's own
/// precision otherwise.
pub fn parse_value(value: &str, decimals: u8) -> Result<U256> {
    let parsed = parse_units(value, decimals)
        .with_context(|| format!("cannot parse '{}' with {} decimals", value, decimals))?;
    Ok(parsed.get_absolute())
}

/// Format an integer amount as a decimal string
pub fn format_value(value: U256, decimals: u8) -> Result<String> {
    format_units(value, decimals)
        .with_context(|| format!("cannot format {} with {} decimals", value, decimals))
}

/// Render a value as a minimal `0x`-prefixed hex string
pub fn hexstring(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Left-pad the digits of a hex string to `width` characters
pub fn hexstring_pad(hexstring: &str, width: usize) -> String {
    let digits = hexstring
        .strip_prefix("0x")
        .or_else(|| hexstring.strip_prefix("0X"))
        .unwrap_or(hexstring);
    if digits.len() >= width {
        return format!("0x{}", digits);
    }
    format!("0x{}{}", "0".repeat(width - digits.len()), digits)
}
