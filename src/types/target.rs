//! Target resolution.
//!
//! A target is a hostname or an IP literal supplied by the operator. The
//! [`Resolve`] trait turns one into the concrete addresses that get scanned;
//! [`SystemResolver`] is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A concrete address produced by resolving a target.
///
/// Displays IPv4 addresses in dotted form and IPv6 addresses bracketed
/// (`[::1]`) so the rendering can be joined with `:PORT` directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedAddress {
    /// The original input (hostname or IP string).
    pub target: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ResolvedAddress {
    /// Create a new resolved address.
    pub fn new(target: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            target: target.into(),
            ip,
        }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}", ip),
            IpAddr::V6(ip) => write!(f, "[{}]", ip),
        }
    }
}

/// Error type for target resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: '{0}'")]
    InvalidFormat(String),
    #[error("failed to resolve '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for '{0}'")]
    NoAddressesFound(String),
}

/// Maps a target string to the addresses it names.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolve a single target.
    async fn resolve(&self, target: &str) -> Result<Vec<ResolvedAddress>, TargetError>;
}

/// Parse an IP literal, accepting bracketed IPv6 (`[::1]`).
pub fn parse_ip_literal(target: &str) -> Option<IpAddr> {
    let target = target.trim();
    let unbracketed = target
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(target);
    unbracketed.parse().ok()
}

/// Resolver backed by the system's DNS configuration and hosts file.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    /// Build a resolver from the system configuration, falling back to the
    /// default upstream servers when none is available.
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "no system resolver configuration, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, target: &str) -> Result<Vec<ResolvedAddress>, TargetError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(TargetError::InvalidFormat(target.to_string()));
        }

        if let Some(ip) = parse_ip_literal(target) {
            return Ok(vec![ResolvedAddress::new(target, ip)]);
        }

        let response = self
            .resolver
            .lookup_ip(target)
            .await
            .map_err(|e| TargetError::DnsResolutionFailed(target.to_string(), e.to_string()))?;

        let mut addresses: Vec<ResolvedAddress> = Vec::new();
        for ip in response.iter() {
            if !addresses.iter().any(|a| a.ip == ip) {
                addresses.push(ResolvedAddress::new(target, ip));
            }
        }

        if addresses.is_empty() {
            return Err(TargetError::NoAddressesFound(target.to_string()));
        }

        tracing::debug!(host = target, count = addresses.len(), "resolved target");
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_display_v4() {
        let addr = ResolvedAddress::new("host", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(addr.to_string(), "192.168.1.1");
    }

    #[test]
    fn test_display_v6_is_bracketed() {
        let addr = ResolvedAddress::new("::1", IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(addr.to_string(), "[::1]");
        assert_eq!(format!("{}:{}", addr, 22), "[::1]:22");
    }

    #[test]
    fn test_parse_ip_literal() {
        assert_eq!(
            parse_ip_literal("10.0.0.1"),
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
        );
        assert_eq!(parse_ip_literal("[::1]"), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(parse_ip_literal("::1"), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(parse_ip_literal("example.com"), None);
    }

    #[tokio::test]
    async fn test_resolve_literal_without_lookup() {
        let resolver = SystemResolver::new();
        let addrs = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(addrs[0].target, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_resolve_blank_target() {
        let resolver = SystemResolver::new();
        let result = resolver.resolve("   ").await;
        assert!(matches!(result, Err(TargetError::InvalidFormat(_))));
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_localhost() {
        let resolver = SystemResolver::new();
        let addrs = resolver.resolve("localhost").await.unwrap();
        assert!(addrs.iter().all(|a| a.ip.is_loopback()));
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_reserved_name_fails() {
        let resolver = SystemResolver::new();
        let result = resolver.resolve("nonexistent.invalid").await;
        assert!(result.is_err());
    }
}
