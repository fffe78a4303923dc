//! TCP Connect Scanner implementation.
//!
//! Performs standard TCP connect scans using the operating system's
//! socket API. The connection is dropped as soon as the handshake
//! completes; no data is exchanged.

use crate::scanner::traits::{Connector, PortStatus};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP connect prober.
///
/// Does not require elevated privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddr, limit: Duration) -> PortStatus {
        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                PortStatus::Open
            }
            Ok(Err(e)) => {
                tracing::trace!(%addr, error = %e, "connect failed");
                PortStatus::Closed
            }
            Err(_) => {
                tracing::trace!(%addr, "connect timed out");
                PortStatus::Closed
            }
        }
    }
}
