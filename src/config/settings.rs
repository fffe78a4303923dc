//! Application settings.
//!
//! Defaults for scan options, optionally overridden by a JSON settings file
//! located via `--config` or the XDG configuration directory.

use crate::error::{ConfigError, ConfigResult};
use crate::output::OutputFormat;
use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_PORTS, DEFAULT_TIMEOUT_MS};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Location of the default settings file (`~/.config/portsweep/settings.json`
/// on Linux).
pub fn default_settings_path() -> ConfigResult<PathBuf> {
    let project =
        ProjectDirs::from("com", "portsweep", "portsweep").ok_or(ConfigError::DirectoryNotFound)?;
    Ok(project.config_dir().join(SETTINGS_FILE))
}

/// Scan defaults applied when a flag is not given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port spec tokens.
    pub ports: Vec<String>,
    /// Connect timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum concurrency.
    pub concurrency: usize,
    /// Report closed ports as well.
    pub verbose: bool,
    /// Connect attempts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.iter().map(|p| p.to_string()).collect(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
            rate_limit: 0,
            format: OutputFormat::Plain,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location is used when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match default_settings_path() {
            Ok(path) if path.is_file() => Self::load_from(&path),
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                tracing::debug!(error = %e, "using built-in settings");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}
