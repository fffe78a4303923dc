//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-target and per-token
//! errors ([`TargetError`](crate::types::TargetError),
//! [`PortError`](crate::types::PortError)) are recoverable and live next to
//! their types; the enums here end a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a scan before or while it runs.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no valid targets to scan")]
    NoTargets,

    #[error("no valid ports to scan")]
    NoPorts,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for scan operations.
pub type ScanOutcome<T> = Result<T, ScanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
