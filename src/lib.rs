//! # sunscan - A SunSpec Register Map Discovery Scanner
//!
//! sunscan probes a Modbus TCP device for the SunSpec "SunS" marker at the
//! well-known base addresses (40000, 50000, 0), then walks the chain of
//! self-describing model blocks that follows it, reporting every model id
//! and length until the end-of-chain sentinel.
//!
//! ## Features
//!
//! - **Zero prior knowledge**: discovers the register layout from the
//!   device itself
//! - **Bounded traversal**: a configurable model ceiling guards against
//!   devices whose chains never terminate
//! - **Scan History**: every scan is persisted and can be listed and
//!   exported later
//! - **Multiple Output Formats**: plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sunscan::scanner::discover;
//! use sunscan::transport::ModbusTcpClient;
//! use sunscan::types::UnitId;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let addr = "192.168.1.50:502".parse().unwrap();
//!     let mut client = ModbusTcpClient::connect(addr, Duration::from_secs(3))
//!         .await
//!         .unwrap();
//!
//!     let unit = UnitId::new(1).unwrap();
//!     let discovery = discover(&mut client, unit, Some(256), |model| {
//!         println!("model {} at {}", model.model, model.address);
//!     })
//!     .await;
//!
//!     println!("scan finished: {}", discovery.status);
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`types`] - Core type definitions with newtype patterns for type safety
//! - [`transport`] - The register-read seam and the Modbus TCP client
//! - [`scanner`] - Marker location, chain traversal, and orchestration
//! - [`config`] - Settings and application paths
//! - [`storage`] - Scan result persistence
//! - [`error`] - Comprehensive error types
//! - [`output`] - Output formatting utilities

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError, TransportError};
pub use scanner::{DeviceScan, DiscoveredModel, ScanOptions, ScanStatus};
pub use transport::{ModbusTcpClient, RegisterTransport, TransportMode};
pub use types::{DeviceTarget, RegisterAddress, ScanId, TargetSpec, UnitId};
