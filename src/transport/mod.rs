//! Register-read transport abstraction.
//!
//! The discovery core only ever needs one capability: read `count`
//! contiguous holding registers from a unit. The `RegisterTransport` trait
//! is that seam; `ModbusTcpClient` is the one real implementation.

pub mod tcp;

pub use tcp::ModbusTcpClient;

use crate::error::TransportResult;
use crate::types::{RegisterAddress, UnitId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A synchronous-in-spirit register-read channel.
///
/// Implementations carry the connection state; one request is in flight at
/// a time, which is why reads take `&mut self`. The core never writes to
/// a device.
#[async_trait]
pub trait RegisterTransport: Send {
    /// Read `count` contiguous registers starting at `start` from `unit`.
    async fn read_registers(
        &mut self,
        unit: UnitId,
        start: RegisterAddress,
        count: u16,
    ) -> TransportResult<Vec<u16>>;
}

/// Transport mode selector.
///
/// Only `tcp` is implemented; `rtu` is recognized on the command line so a
/// misconfigured invocation gets a clear early exit instead of a parse
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Modbus TCP (connection-oriented).
    Tcp,
    /// Modbus RTU over a serial line (not implemented).
    Rtu,
}

impl Default for TransportMode {
    fn default() -> Self {
        Self::Tcp
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Rtu => write!(f, "rtu"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "rtu" | "serial" => Ok(Self::Rtu),
            _ => Err(format!("unknown transport mode: {}", s)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory transport for exercising the discovery core.

    use super::*;
    use crate::error::TransportError;
    use std::collections::HashMap;

    /// A fake device backed by a sparse register image.
    ///
    /// Unmapped registers read as zero, which conveniently never matches
    /// the marker. Every read is recorded so tests can assert on probe
    /// order and short-circuiting.
    pub struct FakeDevice {
        registers: HashMap<u16, u16>,
        fail_at: Option<usize>,
        /// Read log: `(start, count)` per issued request.
        pub reads: Vec<(u16, u16)>,
    }

    impl FakeDevice {
        pub fn new() -> Self {
            Self {
                registers: HashMap::new(),
                fail_at: None,
                reads: Vec::new(),
            }
        }

        /// Load consecutive words into the register image at `start`.
        pub fn load(mut self, start: u16, words: &[u16]) -> Self {
            for (offset, &word) in words.iter().enumerate() {
                self.registers.insert(start + offset as u16, word);
            }
            self
        }

        /// Make the nth read (0-based) fail with a timeout.
        pub fn fail_on_read(mut self, index: usize) -> Self {
            self.fail_at = Some(index);
            self
        }
    }

    #[async_trait]
    impl RegisterTransport for FakeDevice {
        async fn read_registers(
            &mut self,
            _unit: UnitId,
            start: RegisterAddress,
            count: u16,
        ) -> TransportResult<Vec<u16>> {
            let index = self.reads.len();
            self.reads.push((start.as_u16(), count));

            if self.fail_at == Some(index) {
                return Err(TransportError::Timeout);
            }

            Ok((0..count)
                .map(|offset| {
                    self.registers
                        .get(&start.as_u16().wrapping_add(offset))
                        .copied()
                        .unwrap_or(0)
                })
                .collect())
        }
    }
}
