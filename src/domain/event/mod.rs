//! Contract event domain: decoded log wrappers and the topic registry

mod registry;

pub use registry::{EventDescriptor, EventRegistry};

use alloy::rpc::types::{Filter, Log};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256};

use crate::domain::abi::CodecError;

/// The signature-specific payload of a decoded log
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    /// Event name (e.g. `"Transfer"`)
    pub name: String,
    /// Canonical signature (e.g. `"Transfer(address,address,uint256)"`)
    pub signature: String,
    /// Values recovered from the indexed topics, in declared order
    pub indexed: Vec<DynSolValue>,
    /// Values recovered from the data section, in declared order
    pub body: Vec<DynSolValue>,
}

/// How a log's leading topic resolved against the registry
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The topic matched a registered descriptor
    Decoded(EventPayload),
    /// No descriptor for the topic; the raw log is still available
    Unknown,
}

/// A raw log plus its decoded payload, when the topic is registered
#[derive(Debug, Clone, PartialEq)]
pub struct ContractEvent {
    log: Log,
    kind: EventKind,
}

impl ContractEvent {
    pub(crate) fn decoded(log: Log, payload: EventPayload) -> Self {
        Self { log, kind: EventKind::Decoded(payload) }
    }

    pub(crate) fn unknown(log: Log) -> Self {
        Self { log, kind: EventKind::Unknown }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The decoded payload, unless the topic was unregistered
    pub fn payload(&self) -> Option<&EventPayload> {
        match &self.kind {
            EventKind::Decoded(payload) => Some(payload),
            EventKind::Unknown => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.payload().map(|payload| payload.name.as_str())
    }

    pub fn signature(&self) -> Option<&str> {
        self.payload().map(|payload| payload.signature.as_str())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, EventKind::Unknown)
    }

    /// The raw log this event wraps
    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn address(&self) -> Address {
        self.log.address()
    }

    pub fn block_number(&self) -> Option<u64> {
        self.log.block_number
    }

    pub fn block_hash(&self) -> Option<B256> {
        self.log.block_hash
    }

    pub fn transaction_hash(&self) -> Option<B256> {
        self.log.transaction_hash
    }

    pub fn transaction_index(&self) -> Option<u64> {
        self.log.transaction_index
    }

    pub fn log_index(&self) -> Option<u64> {
        self.log.log_index
    }

    pub fn data(&self) -> &Bytes {
        &self.log.inner.data.data
    }

    pub fn topics(&self) -> &[B256] {
        self.log.topics()
    }
}

/// Filter for a bulk event query
///
/// `from_block` defaults to genesis; an empty topic list matches every
/// registered and unregistered event at the address/range.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub address: Option<Address>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    /// Leading-topic alternatives; each entry is a registered event topic
    pub topics: Vec<B256>,
}

impl EventFilter {
    pub(crate) fn to_filter(&self) -> Filter {
        let mut filter = Filter::new().from_block(self.from_block.unwrap_or(0));
        if let Some(to_block) = self.to_block {
            filter = filter.to_block(to_block);
        }
        if let Some(address) = self.address {
            filter = filter.address(address);
        }
        if !self.topics.is_empty() {
            filter = filter.event_signature(self.topics.clone());
        }
        filter
    }
}

/// A finite, non-restartable sequence of decoded events
///
/// The raw logs were fetched in one bulk call; each one is decoded lazily as
/// the iterator is consumed. Dropping the iterator is the only teardown.
pub struct Events<'a> {
    logs: std::vec::IntoIter<Log>,
    registry: &'a EventRegistry,
}

impl<'a> Events<'a> {
    pub(crate) fn new(logs: Vec<Log>, registry: &'a EventRegistry) -> Self {
        Self { logs: logs.into_iter(), registry }
    }

    /// Adapt the sequence to a `Stream` for async consumers
    pub fn into_stream(self) -> impl futures::Stream<Item = Result<ContractEvent, CodecError>> + 'a {
        futures::stream::iter(self)
    }
}

impl Iterator for Events<'_> {
    type Item = Result<ContractEvent, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.logs.next().map(|log| self.registry.decode(log))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.logs.size_hint()
    }
}
