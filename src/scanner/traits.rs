//! Scanner trait abstraction and the values that flow through the pool.
//!
//! [`ScanTask`] travels over the work queue, [`ScanResult`] over the result
//! queue. [`Connector`] is the seam between the pool and the network.

use crate::types::{Port, ResolvedAddress};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Status of a scanned port.
///
/// Any failed connect collapses to `Closed`: refused, timed out and
/// unreachable are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// The TCP handshake completed before the timeout.
    Open,
    /// The connect attempt failed or timed out.
    Closed,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A single unit of work: one connect attempt to `address:port`.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub address: Arc<ResolvedAddress>,
    pub port: Port,
    pub timeout: Duration,
}

impl ScanTask {
    /// Socket address to connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address.ip, self.port.as_u16())
    }
}

/// Outcome of one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub address: Arc<ResolvedAddress>,
    pub port: Port,
    pub status: PortStatus,
}

impl ScanResult {
    /// Build the result for a completed task.
    pub fn from_task(task: ScanTask, status: PortStatus) -> Self {
        Self {
            address: task.address,
            port: task.port,
            status,
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} is {}", self.address, self.port, self.status)
    }
}

/// Performs a single bounded connect attempt.
///
/// Implementations must never fail: every error becomes
/// [`PortStatus::Closed`] so that each task yields exactly one result.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempt a connection to `addr`, giving up after `timeout`.
    async fn connect(&self, addr: SocketAddr, timeout: Duration) -> PortStatus;
}

#[async_trait]
impl<C: Connector + ?Sized> Connector for Arc<C> {
    async fn connect(&self, addr: SocketAddr, timeout: Duration) -> PortStatus {
        (**self).connect(addr, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    fn task(ip: IpAddr, port: u16) -> ScanTask {
        ScanTask {
            address: Arc::new(ResolvedAddress::new("t", ip)),
            port: Port::new(port).unwrap(),
            timeout: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_port_status_display() {
        assert_eq!(PortStatus::Open.to_string(), "open");
        assert_eq!(PortStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn test_result_display() {
        let result = ScanResult::from_task(
            task(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            PortStatus::Open,
        );
        assert!(result.is_open());
        assert_eq!(result.to_string(), "127.0.0.1:8080 is open");

        let result = ScanResult::from_task(
            task(IpAddr::V6(Ipv6Addr::LOCALHOST), 22),
            PortStatus::Closed,
        );
        assert!(!result.is_open());
        assert_eq!(result.to_string(), "[::1]:22 is closed");
    }

    #[test]
    fn test_task_socket_addr() {
        let t = task(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        assert_eq!(t.socket_addr().to_string(), "[::1]:443");
    }

    #[test]
    fn test_result_serializes_status_lowercase() {
        let result = ScanResult::from_task(
            task(IpAddr::V4(Ipv4Addr::LOCALHOST), 80),
            PortStatus::Closed,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "closed");
        assert_eq!(json["port"], 80);
        assert_eq!(json["address"]["ip"], "127.0.0.1");
    }
}
