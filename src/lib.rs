//! # portsweep - A Concurrent TCP Connect Port Scanner
//!
//! portsweep determines which TCP ports accept connections on one or more
//! hosts, using a bounded pool of workers so that socket usage stays fixed no
//! matter how many ports are requested.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portsweep::output::{OutputFormat, Reporter};
//! use portsweep::scanner::{Scan, ScanConfig, TcpConnector};
//! use portsweep::types::SystemResolver;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScanConfig::new(["localhost"])
//!         .with_ports(["1-1024", "common"])
//!         .with_timeout(Duration::from_millis(500));
//!
//!     let mut reporter = Reporter::stdio(false, OutputFormat::Plain);
//!     let summary = Scan::new(config, SystemResolver::new(), TcpConnector::new())
//!         .run(&mut reporter)
//!         .await
//!         .unwrap();
//!
//!     println!("{} open", summary.open);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, port spec expansion and target resolution
//! - [`scanner`] - Scheduler, worker pool and the scan engine
//! - [`output`] - Result aggregation and reporting
//! - [`config`] - Settings file handling
//! - [`cli`] - Command-line arguments
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, ScanError};
pub use scanner::{PortStatus, Scan, ScanConfig, ScanResult, ScanSummary, ScanTask};
pub use types::{Port, PortSet, ResolvedAddress};
