//! Device target parsing and resolution.
//!
//! A scan addresses exactly one device, given as an IP address or hostname
//! with an optional `:port` suffix. Hostnames are resolved through the
//! system resolver configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A device target resolved to a concrete IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
    /// The TCP port the device listens on.
    pub port: u16,
}

impl DeviceTarget {
    /// Create a resolved device target.
    pub fn new(original: impl Into<String>, ip: IpAddr, port: u16) -> Self {
        Self {
            original: original.into(),
            ip,
            port,
        }
    }

    /// The socket address to connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}:{}", self.ip, self.port)
        } else {
            write!(f, "{} ({}:{})", self.original, self.ip, self.port)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("invalid port in target: {0}")]
    InvalidPort(String),
    #[error("DNS resolution failed for '{0}': {1}")]
    ResolutionFailed(String, String),
    #[error("hostname '{0}' did not resolve to any address")]
    NoAddresses(String),
}

/// An unresolved target specification.
///
/// Accepts `HOST`, `HOST:PORT`, `IP`, `IP:PORT` and bracketed IPv6 forms
/// (`[::1]:502`). The port, when absent, is supplied by the caller's
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    host: String,
    port: Option<u16>,
}

impl TargetSpec {
    /// Parse a target specification string.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TargetError::InvalidFormat(input.to_string()));
        }

        // Bare IPv6 addresses contain colons; only treat the input as
        // HOST:PORT when it is not itself a valid address.
        if input.parse::<IpAddr>().is_ok() {
            return Ok(Self {
                host: input.to_string(),
                port: None,
            });
        }

        if let Some(rest) = input.strip_prefix('[') {
            // [v6]:port or [v6]
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| TargetError::InvalidFormat(input.to_string()))?;
            host.parse::<IpAddr>()
                .map_err(|_| TargetError::InvalidFormat(input.to_string()))?;
            let port = match tail.strip_prefix(':') {
                Some(p) => Some(
                    p.parse::<u16>()
                        .map_err(|_| TargetError::InvalidPort(p.to_string()))?,
                ),
                None if tail.is_empty() => None,
                None => return Err(TargetError::InvalidFormat(input.to_string())),
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        match input.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| TargetError::InvalidPort(port.to_string()))?;
                Ok(Self {
                    host: host.to_string(),
                    port: Some(port),
                })
            }
            _ => Ok(Self {
                host: input.to_string(),
                port: None,
            }),
        }
    }

    /// The host portion of the specification.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, if one was given.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Resolve to a concrete target, using `default_port` when the
    /// specification did not carry one.
    pub async fn resolve(&self, default_port: u16) -> Result<DeviceTarget, TargetError> {
        let port = self.port.unwrap_or(default_port);

        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(DeviceTarget::new(&self.host, ip, port));
        }

        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let response = resolver
            .lookup_ip(self.host.as_str())
            .await
            .map_err(|e| TargetError::ResolutionFailed(self.host.clone(), e.to_string()))?;

        // Prefer IPv4 for field devices; fall back to whatever resolved.
        let ip = response
            .iter()
            .find(IpAddr::is_ipv4)
            .or_else(|| response.iter().next())
            .ok_or_else(|| TargetError::NoAddresses(self.host.clone()))?;

        Ok(DeviceTarget::new(&self.host, ip, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_parse_bare_ip() {
        let spec = TargetSpec::parse("192.168.1.50").unwrap();
        assert_eq!(spec.host(), "192.168.1.50");
        assert_eq!(spec.port(), None);
    }

    #[test]
    fn test_parse_ip_with_port() {
        let spec = TargetSpec::parse("192.168.1.50:1502").unwrap();
        assert_eq!(spec.host(), "192.168.1.50");
        assert_eq!(spec.port(), Some(1502));
    }

    #[test]
    fn test_parse_hostname_with_port() {
        let spec = TargetSpec::parse("inverter.local:502").unwrap();
        assert_eq!(spec.host(), "inverter.local");
        assert_eq!(spec.port(), Some(502));
    }

    #[test]
    fn test_parse_bare_ipv6() {
        let spec = TargetSpec::parse("fe80::1").unwrap();
        assert_eq!(spec.host(), "fe80::1");
        assert_eq!(spec.port(), None);
    }

    #[test]
    fn test_parse_bracketed_ipv6_with_port() {
        let spec = TargetSpec::parse("[fe80::1]:1502").unwrap();
        assert_eq!(spec.host(), "fe80::1");
        assert_eq!(spec.port(), Some(1502));
    }

    #[test]
    fn test_parse_invalid_port() {
        assert!(matches!(
            TargetSpec::parse("device:notaport"),
            Err(TargetError::InvalidPort(_))
        ));
        assert!(matches!(
            TargetSpec::parse("device:70000"),
            Err(TargetError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(TargetSpec::parse("").is_err());
        assert!(TargetSpec::parse("   ").is_err());
    }

    #[tokio::test]
    async fn test_resolve_literal_ip_uses_default_port() {
        let spec = TargetSpec::parse("127.0.0.1").unwrap();
        let target = spec.resolve(502).await.unwrap();
        assert_eq!(target.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(target.port, 502);
    }

    #[tokio::test]
    async fn test_resolve_explicit_port_wins() {
        let spec = TargetSpec::parse("127.0.0.1:1502").unwrap();
        let target = spec.resolve(502).await.unwrap();
        assert_eq!(target.port, 1502);
    }

    #[test]
    fn test_target_display() {
        let target = DeviceTarget::new("127.0.0.1", IpAddr::V4(Ipv4Addr::LOCALHOST), 502);
        assert_eq!(target.to_string(), "127.0.0.1:502");

        let named = DeviceTarget::new("inverter.local", IpAddr::V4(Ipv4Addr::LOCALHOST), 502);
        assert_eq!(named.to_string(), "inverter.local (127.0.0.1:502)");
    }
}
