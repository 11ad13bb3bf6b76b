//! Model chain traversal.
//!
//! Starting immediately after a located marker, the chain is a sequence of
//! self-describing blocks: a two-word header (model id, data length) and
//! `length` data words. The walker reads header after header, advancing by
//! `length + 2`, until the reserved end-of-chain id or a terminal
//! condition. Each discovered model is streamed to the caller's sink as it
//! is read.

use crate::error::TransportError;
use crate::transport::RegisterTransport;
use crate::types::{ModelHeader, RegisterAddress, UnitId, END_OF_CHAIN, HEADER_WORDS};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default ceiling on models per walk.
///
/// The chain is terminated by the device, not by a declared count, so a
/// misbehaving device could otherwise keep the walk going forever. Far
/// larger than any real register map.
pub const DEFAULT_MAX_MODELS: usize = 256;

/// One element of the discovered chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredModel {
    /// Register address of the model header.
    pub address: RegisterAddress,
    /// Model type identifier.
    pub model: u16,
    /// Data words following the header.
    pub length: u16,
}

impl DiscoveredModel {
    /// Whether this record is the end-of-chain sentinel.
    pub const fn is_end_of_chain(&self) -> bool {
        self.model == END_OF_CHAIN
    }
}

/// Why a walk stopped.
#[derive(Debug)]
pub enum WalkOutcome {
    /// The reserved end-of-chain id was reached.
    EndOfChain,
    /// The configured model ceiling was hit before the chain ended.
    TooLong { limit: usize },
    /// A header's length would advance the cursor out of the 16-bit
    /// register space.
    AddressOverflow {
        address: RegisterAddress,
        length: u16,
    },
    /// A header read failed at the transport level.
    Failed(TransportError),
}

/// The (possibly partial) chain discovered by one walk.
#[derive(Debug)]
pub struct ChainWalk {
    /// Models in discovery order, the end sentinel included when reached.
    pub models: Vec<DiscoveredModel>,
    pub outcome: WalkOutcome,
}

impl ChainWalk {
    /// Whether the chain was walked to its terminator.
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, WalkOutcome::EndOfChain)
    }

    /// Number of data models, excluding the end sentinel.
    pub fn data_models(&self) -> usize {
        self.models
            .iter()
            .filter(|m| !m.is_end_of_chain())
            .count()
    }
}

/// Walk the model chain starting at `start` (the located marker + 2).
///
/// The sequence is produced lazily against live device state: every
/// element is one fresh header read, emitted to the result, the sink and
/// the log before termination is evaluated. `max_models` of `None`
/// disables the ceiling.
pub async fn walk_chain<T, F>(
    transport: &mut T,
    unit: UnitId,
    start: RegisterAddress,
    max_models: Option<usize>,
    mut sink: F,
) -> ChainWalk
where
    T: RegisterTransport + ?Sized,
    F: FnMut(&DiscoveredModel),
{
    let mut models: Vec<DiscoveredModel> = Vec::new();
    let mut cursor = start;

    loop {
        let words = match transport.read_registers(unit, cursor, HEADER_WORDS).await {
            Ok(words) => words,
            Err(e) => {
                warn!("header read at {} failed: {}", cursor, e);
                return ChainWalk {
                    models,
                    outcome: WalkOutcome::Failed(e),
                };
            }
        };
        if words.len() < 2 {
            return ChainWalk {
                models,
                outcome: WalkOutcome::Failed(TransportError::MalformedResponse(format!(
                    "header read at {} returned {} words",
                    cursor,
                    words.len()
                ))),
            };
        }

        let header = ModelHeader::from_words([words[0], words[1]]);
        let discovered = DiscoveredModel {
            address: cursor,
            model: header.model,
            length: header.length,
        };
        info!("- Model: {}, Len: {}", header.model, header.length);
        models.push(discovered);
        sink(&discovered);

        if header.is_end_of_chain() {
            return ChainWalk {
                models,
                outcome: WalkOutcome::EndOfChain,
            };
        }

        if let Some(limit) = max_models {
            if models.len() >= limit {
                warn!("chain exceeded {} models without terminating", limit);
                return ChainWalk {
                    models,
                    outcome: WalkOutcome::TooLong { limit },
                };
            }
        }

        cursor = match cursor.advance(header.span_words()) {
            Some(next) => next,
            None => {
                warn!(
                    "model at {} with length {} leaves the register space",
                    cursor, header.length
                );
                return ChainWalk {
                    models,
                    outcome: WalkOutcome::AddressOverflow {
                        address: cursor,
                        length: header.length,
                    },
                };
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeDevice;

    fn unit() -> UnitId {
        UnitId::new(1).unwrap()
    }

    fn addr(a: u16) -> RegisterAddress {
        RegisterAddress::new(a)
    }

    #[tokio::test]
    async fn test_walk_scripted_chain() {
        // (model 1, len 10) at A, (model 2, len 3) at A+12, end at A+17.
        let mut device = FakeDevice::new()
            .load(40002, &[1, 10])
            .load(40014, &[2, 3])
            .load(40019, &[END_OF_CHAIN, 0]);

        let walk = walk_chain(&mut device, unit(), addr(40002), None, |_| {}).await;

        assert!(walk.is_complete());
        assert_eq!(walk.models.len(), 3);
        assert_eq!(walk.data_models(), 2);
        assert_eq!(walk.models[0].address, addr(40002));
        assert_eq!(walk.models[1].address, addr(40014));
        assert_eq!(walk.models[2].address, addr(40019));
        // Exactly one header read per model, none after the terminator.
        assert_eq!(device.reads, vec![(40002, 2), (40014, 2), (40019, 2)]);
    }

    #[tokio::test]
    async fn test_zero_length_model_is_adjacent() {
        let mut device = FakeDevice::new()
            .load(100, &[5, 0])
            .load(102, &[END_OF_CHAIN, 0]);

        let walk = walk_chain(&mut device, unit(), addr(100), None, |_| {}).await;

        assert!(walk.is_complete());
        assert_eq!(device.reads, vec![(100, 2), (102, 2)]);
    }

    #[tokio::test]
    async fn test_terminator_only_chain() {
        let mut device = FakeDevice::new().load(50002, &[END_OF_CHAIN, 0]);

        let walk = walk_chain(&mut device, unit(), addr(50002), None, |_| {}).await;

        assert!(walk.is_complete());
        assert_eq!(walk.models.len(), 1);
        assert_eq!(walk.data_models(), 0);
        assert_eq!(walk.models[0].model, END_OF_CHAIN);
        assert_eq!(walk.models[0].length, 0);
    }

    #[tokio::test]
    async fn test_transport_error_keeps_partial_chain() {
        let mut device = FakeDevice::new().load(40002, &[1, 10]).fail_on_read(1);

        let walk = walk_chain(&mut device, unit(), addr(40002), None, |_| {}).await;

        assert!(matches!(walk.outcome, WalkOutcome::Failed(_)));
        assert_eq!(walk.models.len(), 1);
        assert_eq!(walk.models[0].model, 1);
    }

    #[tokio::test]
    async fn test_model_ceiling() {
        // Unmapped registers read as zero: an endless chain of
        // (model 0, len 0) headers two registers apart.
        let mut device = FakeDevice::new();

        let walk = walk_chain(&mut device, unit(), addr(0), Some(4), |_| {}).await;

        assert!(matches!(walk.outcome, WalkOutcome::TooLong { limit: 4 }));
        assert_eq!(walk.models.len(), 4);
        assert_eq!(device.reads.len(), 4);
    }

    #[tokio::test]
    async fn test_address_overflow_detected() {
        let mut device = FakeDevice::new().load(65000, &[1, 40000]);

        let walk = walk_chain(&mut device, unit(), addr(65000), None, |_| {}).await;

        assert!(matches!(
            walk.outcome,
            WalkOutcome::AddressOverflow { length: 40000, .. }
        ));
        assert_eq!(walk.models.len(), 1);
        assert_eq!(device.reads.len(), 1);
    }

    #[tokio::test]
    async fn test_sink_sees_every_model() {
        let mut device = FakeDevice::new()
            .load(10, &[7, 2])
            .load(14, &[END_OF_CHAIN, 0]);

        let mut streamed = Vec::new();
        let walk = walk_chain(&mut device, unit(), addr(10), None, |m| streamed.push(*m)).await;

        assert_eq!(streamed, walk.models);
    }
}
