//! Register-space primitives for SunSpec discovery.
//!
//! The `RegisterAddress` newtype wraps an index into the 16-bit Modbus
//! holding-register space. `ModelHeader` is the two-word self-describing
//! header that prefixes every SunSpec model block.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The "SunS" marker packed big-endian into two 16-bit words.
///
/// A device exposing a SunSpec register map places this value immediately
/// before its model chain at one of the well-known base addresses.
pub const SUNSPEC_MARKER: [u16; 2] = [0x5375, 0x6E53];

/// Number of registers occupied by the marker.
pub const MARKER_WORDS: u16 = 2;

/// Number of registers occupied by a model header (model id + length).
pub const HEADER_WORDS: u16 = 2;

/// Reserved model identifier marking the end of the chain.
pub const END_OF_CHAIN: u16 = 0xFFFF;

/// An index into a device's holding-register space.
///
/// Every value of the underlying `u16` is addressable, so construction is
/// infallible; arithmetic that could leave the register space is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterAddress(u16);

impl RegisterAddress {
    /// Create a register address.
    #[inline]
    pub const fn new(address: u16) -> Self {
        Self(address)
    }

    /// Get the raw register index.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Advance by a word count, returning `None` if the result would fall
    /// outside the 16-bit register space.
    #[inline]
    pub fn advance(self, words: u32) -> Option<Self> {
        u16::try_from(u32::from(self.0) + words).ok().map(Self)
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for RegisterAddress {
    fn from(address: u16) -> Self {
        Self(address)
    }
}

impl From<RegisterAddress> for u16 {
    fn from(address: RegisterAddress) -> Self {
        address.0
    }
}

/// A Modbus unit (slave) identifier.
///
/// Zero is the broadcast id and cannot answer a read, so it is rejected
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u8);

impl UnitId {
    /// Minimum valid unit id.
    pub const MIN: u8 = 1;
    /// Maximum valid unit id.
    pub const MAX: u8 = 255;

    /// Create a unit id, returning `None` for the broadcast id (0).
    #[inline]
    pub const fn new(id: u8) -> Option<Self> {
        if id >= Self::MIN {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Get the raw unit id.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for UnitId {
    type Error = UnitIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(UnitIdError::Broadcast)
    }
}

impl FromStr for UnitId {
    type Err = UnitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s
            .trim()
            .parse()
            .map_err(|_| UnitIdError::InvalidFormat(s.to_string()))?;
        Self::new(raw).ok_or(UnitIdError::Broadcast)
    }
}

/// Error type for unit id parsing and validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UnitIdError {
    #[error("unit id 0 is the broadcast address and cannot be scanned")]
    Broadcast,
    #[error("invalid unit id: {0} (expected 1-255)")]
    InvalidFormat(String),
}

/// The two-word header prefixing every model block in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    /// Model type identifier; `0xFFFF` terminates the chain.
    pub model: u16,
    /// Number of data words following the header, exclusive of the header.
    pub length: u16,
}

impl ModelHeader {
    /// Build a header from the two registers read at a chain cursor.
    #[inline]
    pub const fn from_words(words: [u16; 2]) -> Self {
        Self {
            model: words[0],
            length: words[1],
        }
    }

    /// Whether this header is the reserved end-of-chain sentinel.
    #[inline]
    pub const fn is_end_of_chain(&self) -> bool {
        self.model == END_OF_CHAIN
    }

    /// Total register span of the block, header included.
    ///
    /// Widened to `u32` because `length + 2` can exceed `u16::MAX`.
    #[inline]
    pub const fn span_words(&self) -> u32 {
        self.length as u32 + HEADER_WORDS as u32
    }
}

impl fmt::Display for ModelHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end_of_chain() {
            write!(f, "end-of-chain (len {})", self.length)
        } else {
            write!(f, "model {} (len {})", self.model, self.length)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_words() {
        // "SunS" big-endian: 'S'=0x53 'u'=0x75 'n'=0x6E 'S'=0x53
        assert_eq!(SUNSPEC_MARKER, [21365, 28243]);
    }

    #[test]
    fn test_address_advance() {
        let addr = RegisterAddress::new(40002);
        assert_eq!(addr.advance(12), Some(RegisterAddress::new(40014)));
        assert_eq!(addr.advance(0), Some(addr));
    }

    #[test]
    fn test_address_advance_overflow() {
        let addr = RegisterAddress::new(65530);
        assert_eq!(addr.advance(5), Some(RegisterAddress::new(65535)));
        assert_eq!(addr.advance(6), None);
        assert_eq!(RegisterAddress::new(0).advance(70000), None);
    }

    #[test]
    fn test_unit_id_validation() {
        assert!(UnitId::new(0).is_none());
        assert!(UnitId::new(1).is_some());
        assert!(UnitId::new(255).is_some());
    }

    #[test]
    fn test_unit_id_parsing() {
        assert_eq!("1".parse::<UnitId>().unwrap().as_u8(), 1);
        assert_eq!(" 126 ".parse::<UnitId>().unwrap().as_u8(), 126);
        assert!("0".parse::<UnitId>().is_err());
        assert!("300".parse::<UnitId>().is_err());
        assert!("abc".parse::<UnitId>().is_err());
    }

    #[test]
    fn test_model_header() {
        let header = ModelHeader::from_words([1, 66]);
        assert!(!header.is_end_of_chain());
        assert_eq!(header.span_words(), 68);

        let end = ModelHeader::from_words([END_OF_CHAIN, 0]);
        assert!(end.is_end_of_chain());
        assert_eq!(end.span_words(), 2);
    }

    #[test]
    fn test_model_header_span_widens() {
        let header = ModelHeader::from_words([2, u16::MAX]);
        assert_eq!(header.span_words(), 65537);
    }
}
