//! ABI domain: signature hashing and the alloy-dyn-abi parameter codec

pub mod codec;
pub mod signature;

/// Errors raised while parsing signatures or coding ABI data
///
/// These are programmer errors (wrong types, malformed bytes against a
/// declared type list); recognition failures never surface through here.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed signature '{0}'")]
    MalformedSignature(String),

    #[error("invalid abi type '{0}'")]
    InvalidType(String),

    #[error("invalid hex data: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("abi decoding failed: {0}")]
    Decode(#[source] alloy_dyn_abi::Error),

    #[error("cannot coerce value to {ty}: {source}")]
    Coerce {
        ty: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },

    #[error("argument count mismatch: expected {expected}, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("missing error signature")]
    MissingSignature,

    #[error("no descriptor registered for signature '{0}'")]
    UnregisteredSignature(String),

    #[error("value does not match registered signature '{0}'")]
    EncoderMismatch(String),
}
