//! Selector-keyed error registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::U256;

use super::{ContractError, DEFAULT_ERROR_SIG, PANIC_SIG};
use crate::domain::abi::{codec, signature, CodecError};

/// Builds a [`ContractError`] from arguments decoded against the
/// descriptor's declared types
pub type ErrorFactory = Arc<dyn Fn(Vec<DynSolValue>) -> ContractError + Send + Sync>;

/// Reads a [`ContractError`]'s fields back out in declared order, or `None`
/// if the value is not the variant this descriptor produces
pub type ErrorEncoder = Arc<dyn Fn(&ContractError) -> Option<Vec<DynSolValue>> + Send + Sync>;

/// A registered error signature with its decode/encode strategy
pub struct ErrorDescriptor {
    /// Normalized signature string (e.g. `"Error(string)"`)
    pub signature: String,
    /// 4-byte selector derived from the signature
    pub selector: [u8; 4],
    /// Argument types in declared order
    pub types: Vec<DynSolType>,
    /// Decoded arguments -> error value
    pub factory: ErrorFactory,
    /// Error value -> encodable arguments
    pub encode: ErrorEncoder,
}

impl fmt::Debug for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDescriptor")
            .field("signature", &self.signature)
            .field("selector", &format!("0x{}", hex::encode(self.selector)))
            .finish()
    }
}

/// Registry of error descriptors indexed by 4-byte selector
///
/// Populated during an initialization phase and handed to the client by
/// value; immutability after construction comes from ownership, no lock.
#[derive(Debug)]
pub struct ErrorRegistry {
    errors: HashMap<[u8; 4], ErrorDescriptor>,
}

impl ErrorRegistry {
    /// Create a registry pre-populated with the Solidity built-ins
    /// `Error(string)` and `Panic(uint256)`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register(
                DEFAULT_ERROR_SIG,
                Arc::new(|args| {
                    let reason = match args.into_iter().next() {
                        Some(DynSolValue::String(reason)) => reason,
                        _ => String::new(),
                    };
                    ContractError::Revert { reason }
                }),
                Arc::new(|error| match error {
                    ContractError::Revert { reason } => {
                        Some(vec![DynSolValue::String(reason.clone())])
                    }
                    _ => None,
                }),
            )
            .expect("built-in Error(string) registration");
        registry
            .register(
                PANIC_SIG,
                Arc::new(|args| {
                    let code = match args.into_iter().next() {
                        Some(DynSolValue::Uint(code, _)) => code,
                        _ => U256::ZERO,
                    };
                    ContractError::Panic { code }
                }),
                Arc::new(|error| match error {
                    ContractError::Panic { code } => Some(vec![DynSolValue::Uint(*code, 256)]),
                    _ => None,
                }),
            )
            .expect("built-in Panic(uint256) registration");
        registry
    }

    /// Create a registry with nothing registered, not even the built-ins
    pub fn empty() -> Self {
        Self { errors: HashMap::new() }
    }

    /// Register a decode/encode strategy for an error signature
    ///
    /// The selector is derived from the normalized signature and the
    /// argument types are parsed from its parenthesized list. If the
    /// selector is already present the call is a silent no-op: first
    /// registration wins.
    pub fn register(
        &mut self,
        sig: &str,
        factory: ErrorFactory,
        encode: ErrorEncoder,
    ) -> Result<(), CodecError> {
        let sig = signature::normalize(sig);
        let selector = signature::selector_of(&sig);
        if self.errors.contains_key(&selector) {
            return Ok(());
        }
        let types = codec::parse_types(&signature::param_types(&sig)?)?;
        self.errors.insert(
            selector,
            ErrorDescriptor { signature: sig, selector, types, factory, encode },
        );
        Ok(())
    }

    /// Register a signature with the generic strategy: decoding produces
    /// [`ContractError::Custom`] and encoding reads it back
    pub fn register_signature(&mut self, sig: &str) -> Result<(), CodecError> {
        let normalized = signature::normalize(sig);
        let name = signature::name_of(&normalized).to_string();
        let factory_sig = normalized.clone();
        let encoder_sig = normalized.clone();
        self.register(
            &normalized,
            Arc::new(move |args| ContractError::Custom {
                name: name.clone(),
                signature: factory_sig.clone(),
                args,
            }),
            Arc::new(move |error| match error {
                ContractError::Custom { signature: sig, args, .. } if *sig == encoder_sig => {
                    Some(args.clone())
                }
                _ => None,
            }),
        )
    }

    /// Look up a descriptor by selector
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&ErrorDescriptor> {
        self.errors.get(&selector)
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the registry has no descriptors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All registered selectors
    pub fn selectors(&self) -> impl Iterator<Item = &[u8; 4]> {
        self.errors.keys()
    }
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
