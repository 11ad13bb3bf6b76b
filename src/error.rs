//! Error types for sunscan.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer has its own
//! enum; scan-level failures never escape the orchestrator as process
//! errors, they are folded into the scan outcome and logged.

use std::path::PathBuf;
use thiserror::Error;

/// Transport-level failures while talking to a device.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("connection refused")]
    ConnectionRefused,

    #[error("request timed out")]
    Timeout,

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("device exception: {} (function {function:#04x}, code {code})", exception_name(*.code))]
    DeviceException { function: u8, code: u8 },

    #[error("read of {count} registers exceeds the protocol limit of {limit}")]
    ReadTooLarge { count: u16, limit: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Human-readable names for the standard Modbus exception codes.
pub fn exception_name(code: u8) -> &'static str {
    match code {
        1 => "illegal function",
        2 => "illegal data address",
        3 => "illegal data value",
        4 => "server device failure",
        5 => "acknowledge",
        6 => "server device busy",
        8 => "memory parity error",
        10 => "gateway path unavailable",
        11 => "gateway target failed to respond",
        _ => "unknown exception",
    }
}

/// Failures of the discovery core.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("SunSpec marker not found at any known base address")]
    MarkerNotFound,
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Configuration loading and path errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine application directories")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scan store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage directory error: {0}")]
    Directory(String),

    #[error("failed to save scan: {0}")]
    SaveFailed(String),

    #[error("failed to load scan: {0}")]
    LoadFailed(String),

    #[error("scan not found: {0}")]
    ScanNotFound(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Top-level CLI errors.
///
/// These terminate the process with a non-zero status; scan-level failures
/// intentionally do not pass through here.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid target: {0}")]
    Target(#[from] crate::types::TargetError),

    #[error("invalid scan ID: {0}")]
    ScanId(#[from] crate::types::ScanIdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI command handlers.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_names() {
        assert_eq!(exception_name(2), "illegal data address");
        assert_eq!(exception_name(99), "unknown exception");
    }

    #[test]
    fn test_device_exception_display() {
        let err = TransportError::DeviceException {
            function: 0x03,
            code: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("illegal data address"));
        assert!(msg.contains("code 2"));
    }
}
