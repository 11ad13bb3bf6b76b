//! Marker location across the well-known base addresses.
//!
//! A SunSpec device places the "SunS" signature at one of three
//! conventional offsets in its holding-register space. The locator probes
//! them in priority order and stops at the first exact match.

use crate::error::ScanError;
use crate::transport::RegisterTransport;
use crate::types::{RegisterAddress, UnitId, MARKER_WORDS, SUNSPEC_MARKER};
use tracing::{debug, info, warn};

/// Candidate base addresses, in priority order. First match wins.
pub const BASE_ADDRESSES: [RegisterAddress; 3] = [
    RegisterAddress::new(40000),
    RegisterAddress::new(50000),
    RegisterAddress::new(0),
];

/// Probe the candidate base addresses for the SunSpec marker.
///
/// Both marker words must match exactly. A candidate without the marker is
/// skipped (fail-open, try the next one); a transport error on any probe
/// aborts the whole search immediately (fail-fast) — retry policy belongs
/// to the transport or the caller.
pub async fn locate_marker<T>(
    transport: &mut T,
    unit: UnitId,
) -> Result<RegisterAddress, ScanError>
where
    T: RegisterTransport + ?Sized,
{
    for base in BASE_ADDRESSES {
        let words = transport.read_registers(unit, base, MARKER_WORDS).await?;

        if words == SUNSPEC_MARKER {
            info!("SunSpec marker found at {}", base);
            return Ok(base);
        }
        debug!("no marker at {}", base);
    }

    warn!("SunSpec marker not found at any known base address");
    Err(ScanError::MarkerNotFound)
}
