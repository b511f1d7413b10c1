//! sigil: a typed convenience layer over an Ethereum JSON-RPC node
//!
//! Contract deployment and invocation wrappers, ABI encode/decode helpers, a
//! selector-keyed custom-error decoding registry, a topic-keyed event
//! decoding registry, and transaction/provider helper functions. Everything
//! network-facing is a thin pass-through to the configured alloy transport;
//! the value of the crate is in routing raw revert data and logs to typed
//! domain values.

pub mod client;
pub mod config;
pub mod contract;
pub mod domain;
pub mod infrastructure;
pub mod signer;
pub mod transaction;
pub mod utils;

pub use client::{CallError, EthClient};
pub use config::Config;
pub use contract::{CallOptions, Contract};
pub use domain::abi::{codec, signature, CodecError};
pub use domain::error::{
    decode_error, decode_error_data, decode_error_hex, ContractError, ErrorDescriptor,
    ErrorRegistry,
};
pub use domain::event::{
    ContractEvent, EventDescriptor, EventFilter, EventKind, EventPayload, EventRegistry, Events,
};
pub use infrastructure::ethereum::{
    create_provider, EthereumProvider, ProviderConfig, RpcFailure,
};
pub use signer::Signer;
pub use transaction::Transaction;
