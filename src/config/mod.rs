//! Configuration management for portsweep.
//!
//! Provides XDG-compliant settings storage for scan defaults.

mod settings;

pub use settings::{default_settings_path, Settings, SETTINGS_FILE};
