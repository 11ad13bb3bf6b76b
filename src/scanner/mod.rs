//! Scanner module - orchestrates marker location and chain traversal.
//!
//! `run_scan` is the top-level entry: dispatch on the transport mode,
//! acquire the connection, locate the marker, walk the chain. Every
//! failure along the way is folded into the returned record's status and
//! logged; scan-level failures never propagate as process errors.

pub mod locate;
pub mod walk;

pub use locate::{locate_marker, BASE_ADDRESSES};
pub use walk::{walk_chain, ChainWalk, DiscoveredModel, WalkOutcome, DEFAULT_MAX_MODELS};

use crate::error::ScanError;
use crate::transport::{ModbusTcpClient, RegisterTransport, TransportMode};
use crate::types::{DeviceTarget, RegisterAddress, ScanId, UnitId, MARKER_WORDS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Resolved options for one scan.
///
/// Validated once at the CLI boundary; the core never sees raw strings.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mode: TransportMode,
    pub target: DeviceTarget,
    pub unit: UnitId,
    /// Per-request response timeout.
    pub timeout: Duration,
    /// Ceiling on models per walk; `None` disables the bound.
    pub max_models: Option<usize>,
}

/// Terminal condition of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanStatus {
    /// The chain was walked to its terminator.
    Complete,
    /// No candidate base address carried the marker.
    MarkerNotFound,
    /// The configured transport mode is not implemented; no I/O was
    /// attempted.
    UnsupportedMode { mode: String },
    /// Connecting or reading failed at the transport level.
    TransportFailed { detail: String },
    /// The model ceiling was hit before the chain terminated.
    ChainTooLong { limit: usize },
    /// A model length drove the cursor out of the register space.
    AddressOverflow { address: u16, length: u16 },
}

impl ScanStatus {
    /// Whether the scan ran to a complete chain.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::MarkerNotFound => write!(f, "marker not found"),
            Self::UnsupportedMode { mode } => write!(f, "unsupported mode '{}'", mode),
            Self::TransportFailed { detail } => write!(f, "transport failed: {}", detail),
            Self::ChainTooLong { limit } => {
                write!(f, "chain exceeded {} models", limit)
            }
            Self::AddressOverflow { address, length } => write!(
                f,
                "model at {} with length {} leaves the register space",
                address, length
            ),
        }
    }
}

/// A completed scan, ready to render or persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceScan {
    /// Unique identifier for this scan.
    pub id: ScanId,
    /// When the scan was started.
    pub started_at: DateTime<Utc>,
    /// When the scan completed.
    pub completed_at: DateTime<Utc>,
    /// Target as given on the command line.
    pub target: String,
    /// Resolved IP address.
    pub ip_address: String,
    /// Device TCP port.
    pub port: u16,
    /// Modbus unit id addressed.
    pub unit: u8,
    /// Transport mode used.
    pub mode: String,
    /// Base address where the marker was found, if any.
    pub marker_address: Option<u16>,
    /// Discovered models, end sentinel included when reached.
    pub models: Vec<DiscoveredModel>,
    /// Total scan duration in milliseconds.
    pub duration_ms: u64,
    /// Terminal condition.
    pub status: ScanStatus,
}

impl DeviceScan {
    fn begin(options: &ScanOptions) -> Self {
        Self {
            id: ScanId::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            target: options.target.original.clone(),
            ip_address: options.target.ip.to_string(),
            port: options.target.port,
            unit: options.unit.as_u8(),
            mode: options.mode.to_string(),
            marker_address: None,
            models: Vec::new(),
            duration_ms: 0,
            status: ScanStatus::Complete,
        }
    }

    fn finalize(
        mut self,
        marker: Option<RegisterAddress>,
        models: Vec<DiscoveredModel>,
        status: ScanStatus,
        elapsed: Duration,
    ) -> Self {
        self.completed_at = Utc::now();
        self.duration_ms = elapsed.as_millis() as u64;
        self.marker_address = marker.map(RegisterAddress::as_u16);
        self.models = models;
        self.status = status;
        self
    }

    /// Number of data models, excluding the end sentinel.
    pub fn data_model_count(&self) -> usize {
        self.models.iter().filter(|m| !m.is_end_of_chain()).count()
    }

    /// One-line summary for history listings.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}:{}) unit {} - {} models, {} [{:.2}s]",
            self.target,
            self.ip_address,
            self.port,
            self.unit,
            self.data_model_count(),
            self.status,
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Result of the transport-generic discovery flow.
#[derive(Debug)]
pub struct Discovery {
    pub marker_address: Option<RegisterAddress>,
    pub models: Vec<DiscoveredModel>,
    pub status: ScanStatus,
}

/// Locate the marker and walk the model chain over any transport.
///
/// The chain starts two registers past the marker, which the marker
/// itself occupies.
pub async fn discover<T, F>(
    transport: &mut T,
    unit: UnitId,
    max_models: Option<usize>,
    sink: F,
) -> Discovery
where
    T: RegisterTransport + ?Sized,
    F: FnMut(&DiscoveredModel),
{
    let base = match locate_marker(transport, unit).await {
        Ok(base) => base,
        Err(ScanError::MarkerNotFound) => {
            return Discovery {
                marker_address: None,
                models: Vec::new(),
                status: ScanStatus::MarkerNotFound,
            };
        }
        Err(ScanError::Transport(e)) => {
            error!("marker probe failed: {}", e);
            return Discovery {
                marker_address: None,
                models: Vec::new(),
                status: ScanStatus::TransportFailed {
                    detail: e.to_string(),
                },
            };
        }
    };

    let Some(start) = base.advance(u32::from(MARKER_WORDS)) else {
        return Discovery {
            marker_address: Some(base),
            models: Vec::new(),
            status: ScanStatus::AddressOverflow {
                address: base.as_u16(),
                length: 0,
            },
        };
    };

    let chain = walk_chain(transport, unit, start, max_models, sink).await;
    let status = match chain.outcome {
        WalkOutcome::EndOfChain => ScanStatus::Complete,
        WalkOutcome::TooLong { limit } => ScanStatus::ChainTooLong { limit },
        WalkOutcome::AddressOverflow { address, length } => ScanStatus::AddressOverflow {
            address: address.as_u16(),
            length,
        },
        WalkOutcome::Failed(e) => {
            error!("chain walk aborted: {}", e);
            ScanStatus::TransportFailed {
                detail: e.to_string(),
            }
        }
    };

    Discovery {
        marker_address: Some(base),
        models: chain.models,
        status,
    }
}

/// Run one complete scan per the resolved options.
///
/// Infallible by design: every failure becomes a logged status on the
/// returned record. The transport connection is owned by this call alone
/// and dropped on every path.
pub async fn run_scan<F>(options: &ScanOptions, sink: F) -> DeviceScan
where
    F: FnMut(&DiscoveredModel),
{
    let started = Instant::now();
    let record = DeviceScan::begin(options);

    match options.mode {
        TransportMode::Tcp => {}
        mode => {
            warn!("only tcp mode is implemented (requested: {})", mode);
            return record.finalize(
                None,
                Vec::new(),
                ScanStatus::UnsupportedMode {
                    mode: mode.to_string(),
                },
                started.elapsed(),
            );
        }
    }

    info!("connecting to {}", options.target);
    let mut client =
        match ModbusTcpClient::connect(options.target.socket_addr(), options.timeout).await {
            Ok(client) => client,
            Err(e) => {
                error!("connection failed: {}", e);
                return record.finalize(
                    None,
                    Vec::new(),
                    ScanStatus::TransportFailed {
                        detail: e.to_string(),
                    },
                    started.elapsed(),
                );
            }
        };
    info!("connected");

    let discovery = discover(&mut client, options.unit, options.max_models, sink).await;

    record.finalize(
        discovery.marker_address,
        discovery.models,
        discovery.status,
        started.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeDevice;
    use crate::types::{END_OF_CHAIN, SUNSPEC_MARKER};
    use std::net::{IpAddr, Ipv4Addr};

    fn unit() -> UnitId {
        UnitId::new(1).unwrap()
    }

    #[tokio::test]
    async fn test_discover_end_to_end() {
        // Marker at 50000 only; the chain at 50002 is a bare terminator.
        let mut device = FakeDevice::new()
            .load(50000, &SUNSPEC_MARKER)
            .load(50002, &[END_OF_CHAIN, 0]);

        let discovery = discover(&mut device, unit(), Some(DEFAULT_MAX_MODELS), |_| {}).await;

        assert_eq!(discovery.status, ScanStatus::Complete);
        assert_eq!(discovery.marker_address, Some(RegisterAddress::new(50000)));
        assert_eq!(discovery.models.len(), 1);
        assert_eq!(discovery.models[0].address, RegisterAddress::new(50002));
        assert_eq!(discovery.models[0].model, END_OF_CHAIN);
        assert_eq!(discovery.models[0].length, 0);
        assert_eq!(
            device.reads,
            vec![(40000, 2), (50000, 2), (50002, 2)]
        );
    }

    #[tokio::test]
    async fn test_discover_marker_not_found() {
        let mut device = FakeDevice::new();

        let discovery = discover(&mut device, unit(), None, |_| {}).await;

        assert_eq!(discovery.status, ScanStatus::MarkerNotFound);
        assert_eq!(discovery.marker_address, None);
        assert!(discovery.models.is_empty());
        // All three candidates probed, no chain walk attempted.
        assert_eq!(device.reads.len(), 3);
    }

    #[tokio::test]
    async fn test_discover_walk_failure_keeps_partial_chain() {
        let mut device = FakeDevice::new()
            .load(40000, &SUNSPEC_MARKER)
            .load(40002, &[101, 50])
            .fail_on_read(2);

        let discovery = discover(&mut device, unit(), None, |_| {}).await;

        assert!(matches!(
            discovery.status,
            ScanStatus::TransportFailed { .. }
        ));
        assert_eq!(discovery.marker_address, Some(RegisterAddress::new(40000)));
        assert_eq!(discovery.models.len(), 1);
        assert_eq!(discovery.models[0].model, 101);
    }

    fn rtu_options() -> ScanOptions {
        ScanOptions {
            mode: TransportMode::Rtu,
            target: DeviceTarget::new("127.0.0.1", IpAddr::V4(Ipv4Addr::LOCALHOST), 502),
            unit: unit(),
            timeout: Duration::from_secs(3),
            max_models: Some(DEFAULT_MAX_MODELS),
        }
    }

    #[tokio::test]
    async fn test_run_scan_unsupported_mode() {
        let scan = run_scan(&rtu_options(), |_| {}).await;

        assert_eq!(
            scan.status,
            ScanStatus::UnsupportedMode {
                mode: "rtu".to_string()
            }
        );
        assert!(scan.models.is_empty());
        assert_eq!(scan.marker_address, None);
    }

    #[test]
    fn test_scan_status_display() {
        assert_eq!(ScanStatus::Complete.to_string(), "complete");
        assert_eq!(ScanStatus::MarkerNotFound.to_string(), "marker not found");
        assert!(ScanStatus::ChainTooLong { limit: 256 }
            .to_string()
            .contains("256"));
    }

    #[test]
    fn test_device_scan_serialization() {
        let options = rtu_options();
        let scan = DeviceScan::begin(&options).finalize(
            Some(RegisterAddress::new(40000)),
            vec![DiscoveredModel {
                address: RegisterAddress::new(40002),
                model: 1,
                length: 66,
            }],
            ScanStatus::Complete,
            Duration::from_millis(120),
        );

        let json = serde_json::to_string(&scan).unwrap();
        let parsed: DeviceScan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.marker_address, Some(40000));
        assert_eq!(parsed.models, scan.models);
        assert_eq!(parsed.status, ScanStatus::Complete);
    }

    #[test]
    fn test_data_model_count_excludes_sentinel() {
        let options = rtu_options();
        let scan = DeviceScan::begin(&options).finalize(
            Some(RegisterAddress::new(40000)),
            vec![
                DiscoveredModel {
                    address: RegisterAddress::new(40002),
                    model: 1,
                    length: 66,
                },
                DiscoveredModel {
                    address: RegisterAddress::new(40070),
                    model: END_OF_CHAIN,
                    length: 0,
                },
            ],
            ScanStatus::Complete,
            Duration::from_millis(80),
        );

        assert_eq!(scan.data_model_count(), 1);
    }
}
