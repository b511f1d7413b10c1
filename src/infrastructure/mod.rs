//! Infrastructure layer: alloy-based Ethereum provider implementations

pub mod ethereum;
