//! Topic-keyed event registry and log decoding

use std::collections::HashMap;

use alloy::rpc::types::Log;
use alloy_dyn_abi::EventExt;
use alloy_json_abi::Event;
use alloy_primitives::B256;

use super::{ContractEvent, EventPayload};
use crate::domain::abi::CodecError;

/// A registered event fragment with its routing topic
#[derive(Debug, Clone)]
pub struct EventDescriptor {
    /// 32-byte leading topic derived from the canonical signature
    pub topic: B256,
    /// Canonical signature (no parameter names, no `indexed` markers)
    pub signature: String,
    /// Event name
    pub name: String,
    event: Event,
}

/// Registry of event descriptors indexed by 32-byte topic
///
/// Same lifecycle as the error registry: populated once during
/// initialization, first registration per topic wins.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: HashMap<B256, EventDescriptor>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a human-readable event fragment, e.g.
    /// `"event Transfer(address indexed from, address indexed to, uint256 value)"`
    ///
    /// The `indexed` markers decide which parameters decode from topics. If
    /// the topic is already registered the call is a silent no-op.
    pub fn register(&mut self, fragment: &str) -> Result<(), CodecError> {
        let fragment = fragment.trim();
        let fragment = fragment.strip_prefix("event ").unwrap_or(fragment);
        let event = Event::parse(fragment)
            .map_err(|_| CodecError::MalformedSignature(fragment.to_string()))?;
        let topic = event.selector();
        self.events.entry(topic).or_insert_with(|| EventDescriptor {
            topic,
            signature: event.signature(),
            name: event.name.clone(),
            event,
        });
        Ok(())
    }

    /// Look up a descriptor by leading topic
    pub fn lookup(&self, topic: B256) -> Option<&EventDescriptor> {
        self.events.get(&topic)
    }

    /// Decode a raw log
    ///
    /// An unregistered leading topic (or a log with no topics at all) yields
    /// an unknown event carrying the raw log; malformed data against a
    /// registered fragment is an error.
    pub fn decode(&self, log: Log) -> Result<ContractEvent, CodecError> {
        let Some(topic) = log.topics().first().copied() else {
            return Ok(ContractEvent::unknown(log));
        };
        let Some(descriptor) = self.events.get(&topic) else {
            return Ok(ContractEvent::unknown(log));
        };

        let decoded = descriptor
            .event
            .decode_log_parts(log.topics().iter().copied(), &log.inner.data.data)
            .map_err(CodecError::Decode)?;
        let payload = EventPayload {
            name: descriptor.name.clone(),
            signature: descriptor.signature.clone(),
            indexed: decoded.indexed,
            body: decoded.body,
        };
        Ok(ContractEvent::decoded(log, payload))
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the registry has no descriptors
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All registered topics
    pub fn topics(&self) -> impl Iterator<Item = &B256> {
        self.events.keys()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes, LogData, U256};
    use alloy_dyn_abi::DynSolValue;

    use super::*;
    use crate::domain::abi::signature;

    const TRANSFER: &str = "event Transfer(address indexed from, address indexed to, uint256 value)";

    fn address_topic(address: Address) -> B256 {
        let mut topic = [0u8; 32];
        topic[12..].copy_from_slice(address.as_slice());
        B256::from(topic)
    }

    fn transfer_log(from: Address, to: Address, value: U256) -> Log {
        let topic0 = signature::topic_of("Transfer(address,address,uint256)");
        Log {
            inner: alloy_primitives::Log {
                address: Address::from([0xAA; 20]),
                data: LogData::new_unchecked(
                    vec![topic0, address_topic(from), address_topic(to)],
                    Bytes::from(value.to_be_bytes::<32>().to_vec()),
                ),
            },
            block_number: Some(7),
            log_index: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_keys_by_canonical_topic() {
        let mut registry = EventRegistry::new();
        registry.register(TRANSFER).unwrap();

        let topic = signature::topic_of("Transfer(address,address,uint256)");
        let descriptor = registry.lookup(topic).unwrap();
        assert_eq!(descriptor.name, "Transfer");
        assert_eq!(descriptor.signature, "Transfer(address,address,uint256)");
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = EventRegistry::new();
        registry.register(TRANSFER).unwrap();
        // Same canonical signature, different parameter names.
        registry
            .register("event Transfer(address indexed a, address indexed b, uint256 c)")
            .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_malformed_fragment() {
        let mut registry = EventRegistry::new();
        assert!(registry.register("not an event").is_err());
    }

    #[test]
    fn test_decode_registered_log() {
        let mut registry = EventRegistry::new();
        registry.register(TRANSFER).unwrap();

        let from = Address::from([0x11; 20]);
        let to = Address::from([0x22; 20]);
        let event = registry.decode(transfer_log(from, to, U256::from(1000u64))).unwrap();

        assert_eq!(event.name(), Some("Transfer"));
        assert_eq!(event.block_number(), Some(7));
        let payload = event.payload().unwrap();
        assert_eq!(
            payload.indexed,
            vec![DynSolValue::Address(from), DynSolValue::Address(to)]
        );
        assert_eq!(payload.body, vec![DynSolValue::Uint(U256::from(1000u64), 256)]);
    }

    #[test]
    fn test_decode_unregistered_topic_is_unknown() {
        let registry = EventRegistry::new();
        let log = transfer_log(Address::ZERO, Address::ZERO, U256::ZERO);
        let event = registry.decode(log.clone()).unwrap();
        assert!(event.is_unknown());
        assert_eq!(event.log(), &log);
        assert_eq!(event.topics(), log.topics());
    }

    #[test]
    fn test_decode_log_without_topics_is_unknown() {
        let mut registry = EventRegistry::new();
        registry.register(TRANSFER).unwrap();
        let log = Log {
            inner: alloy_primitives::Log {
                address: Address::ZERO,
                data: LogData::new_unchecked(vec![], Bytes::new()),
            },
            ..Default::default()
        };
        assert!(registry.decode(log).unwrap().is_unknown());
    }
}
