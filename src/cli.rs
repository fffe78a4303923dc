//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags left
//! unset fall back to the loaded [`Settings`].

use crate::config::Settings;
use crate::output::OutputFormat;
use crate::scanner::ScanConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// A concurrent TCP connect port scanner.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version)]
#[command(about = "Find open TCP ports across one or more hosts", long_about = None)]
#[command(after_help = "Examples:\n  \
    portsweep -t example.com -p 80,443\n  \
    portsweep -t 192.168.1.1 -p 1-1000 -T 500 -j 50\n  \
    portsweep -t localhost -p common")]
pub struct Args {
    /// Targets to scan: hostnames or IP addresses (comma separated)
    #[arg(short, long, value_name = "TARGETS", value_delimiter = ',', required = true)]
    pub targets: Vec<String>,

    /// Ports to scan: numbers, ranges (1-1024), "common" or "all" (comma separated)
    /// [default: 80,443]
    #[arg(short, long, value_name = "PORTS", value_delimiter = ',')]
    pub ports: Vec<String>,

    /// Connection timeout in milliseconds [default: 1000]
    #[arg(short = 'T', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Maximum number of concurrent connection attempts [default: 100]
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Verbose mode (show closed ports)
    #[arg(short, long)]
    pub verbose: bool,

    /// Maximum connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate", value_name = "PER_SEC")]
    pub rate_limit: Option<u32>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to a JSON settings file
    #[arg(long, value_name = "PATH", env = "PORTSWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Build the scan configuration, filling unset flags from `settings`.
    pub fn into_config(self, settings: &Settings) -> ScanConfig {
        let ports = if self.ports.is_empty() {
            settings.ports.clone()
        } else {
            self.ports
        };

        ScanConfig::new(self.targets)
            .with_ports(ports)
            .with_timeout(Duration::from_millis(
                self.timeout.unwrap_or(settings.timeout_ms),
            ))
            .with_concurrency(self.concurrency.unwrap_or(settings.concurrency))
            .with_verbose(self.verbose || settings.verbose)
            .with_rate_limit(self.rate_limit.unwrap_or(settings.rate_limit))
            .with_format(self.output.unwrap_or(settings.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("portsweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let config = parse(&["-t", "localhost"]).into_config(&Settings::default());
        assert_eq!(config.targets, vec!["localhost"]);
        assert_eq!(config.ports, vec!["80", "443"]);
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.concurrency, 100);
        assert!(!config.verbose);
        assert_eq!(config.format, OutputFormat::Plain);
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            timeout_ms: 5000,
            verbose: true,
            ..Settings::default()
        };
        let config = parse(&[
            "-t", "a.example,b.example",
            "-p", "1-1000,common",
            "-p", "8080",
            "-T", "500",
            "-j", "50",
            "-o", "json",
        ])
        .into_config(&settings);

        assert_eq!(config.targets, vec!["a.example", "b.example"]);
        assert_eq!(config.ports, vec!["1-1000", "common", "8080"]);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.concurrency, 50);
        assert!(config.verbose);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_targets_required() {
        assert!(Args::try_parse_from(["portsweep", "-p", "80"]).is_err());
    }
}
