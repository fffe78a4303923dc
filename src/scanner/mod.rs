//! Scanner module - the concurrent scan engine.
//!
//! A scan resolves its targets, expands its port tokens, then runs three
//! stages connected by two bounded queues:
//!
//! - the [`Scheduler`] publishes one [`ScanTask`] per (address, port),
//! - the [`WorkerPool`] turns each task into exactly one [`ScanResult`],
//! - the [`Reporter`] consumes results in completion order.

pub mod pool;
pub mod rate_limiter;
pub mod scheduler;
pub mod tcp;
pub mod traits;

pub use pool::{worker_count, WorkQueue, WorkerPool};
pub use rate_limiter::RateLimiter;
pub use scheduler::Scheduler;
pub use tcp::TcpConnector;
pub use traits::{Connector, PortStatus, ScanResult, ScanTask};

use crate::error::{ScanError, ScanOutcome};
use crate::output::{OutputFormat, Reporter};
use crate::types::{PortSet, Resolve, ResolvedAddress};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default port tokens.
pub const DEFAULT_PORTS: [&str; 2] = ["80", "443"];
/// Default connect timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
/// Default maximum concurrency.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Configuration for a scan, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Targets in the order given.
    pub targets: Vec<String>,
    /// Port spec tokens in the order given.
    pub ports: Vec<String>,
    /// Per-attempt connect timeout.
    pub timeout: Duration,
    /// Maximum concurrent connect attempts requested.
    pub concurrency: usize,
    /// Also report closed ports.
    pub verbose: bool,
    /// Connect attempts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Result output format.
    pub format: OutputFormat,
}

impl ScanConfig {
    /// Create a configuration with default settings for the given targets.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ports: DEFAULT_PORTS.iter().map(|p| p.to_string()).collect(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
            rate_limit: 0,
            format: OutputFormat::Plain,
        }
    }

    /// Set the port spec tokens.
    pub fn with_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the rate limit (attempts per second, 0 for unlimited).
    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Check values the engine cannot run with.
    pub fn validate(&self) -> ScanOutcome<()> {
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "timeout must be greater than 0 ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shape of a scan once targets are resolved and ports expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlan {
    pub addresses: usize,
    pub ports: usize,
    pub timeout: Duration,
    pub workers: usize,
}

impl ScanPlan {
    /// Number of tasks the plan schedules.
    pub fn total(&self) -> usize {
        self.addresses * self.ports
    }
}

/// Outcome of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Resolved addresses scanned.
    pub addresses: usize,
    /// Ports scanned per address.
    pub ports: usize,
    /// Tasks published to the work queue.
    pub scheduled: usize,
    /// Results received.
    pub completed: usize,
    /// Results reporting an open port.
    pub open: usize,
    /// The scan was cancelled before every task ran.
    pub interrupted: bool,
}

/// A configured scan, ready to run.
pub struct Scan<R, C> {
    config: ScanConfig,
    resolver: R,
    connector: Arc<C>,
    cancel: CancellationToken,
}

impl<R: Resolve, C: Connector + 'static> Scan<R, C> {
    pub fn new(config: ScanConfig, resolver: R, connector: C) -> Self {
        Self {
            config,
            resolver,
            connector: Arc::new(connector),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve every target, reporting failures and continuing.
    pub async fn resolve_targets<O: Write, E: Write>(
        &self,
        reporter: &mut Reporter<O, E>,
    ) -> ScanOutcome<Vec<ResolvedAddress>> {
        let mut addresses = Vec::new();
        for target in &self.config.targets {
            match self.resolver.resolve(target).await {
                Ok(resolved) => addresses.extend(resolved),
                Err(e) => {
                    tracing::debug!(host = %target, error = %e, "target skipped");
                    reporter.resolution_failed(&e)?;
                }
            }
        }

        if addresses.is_empty() {
            return Err(ScanError::NoTargets);
        }
        Ok(addresses)
    }

    /// Expand the port tokens, reporting skipped tokens.
    pub fn expand_ports<O: Write, E: Write>(
        &self,
        reporter: &mut Reporter<O, E>,
    ) -> ScanOutcome<PortSet> {
        let (ports, rejected) = PortSet::expand(self.config.ports.as_slice());
        for e in &rejected {
            reporter.port_skipped(e)?;
        }

        if ports.is_empty() {
            return Err(ScanError::NoPorts);
        }
        Ok(ports)
    }

    /// Run the scan to completion (or cancellation), streaming results
    /// through `reporter`.
    ///
    /// Fails before any task is scheduled when no target resolves or no port
    /// token is valid.
    pub async fn run<O: Write, E: Write>(
        self,
        reporter: &mut Reporter<O, E>,
    ) -> ScanOutcome<ScanSummary> {
        self.config.validate()?;

        let addresses = self.resolve_targets(reporter).await?;
        let ports = self.expand_ports(reporter)?;

        let pool = WorkerPool::new(self.config.concurrency, Arc::clone(&self.connector))
            .with_rate_limiter(RateLimiter::new(self.config.rate_limit));

        let plan = ScanPlan {
            addresses: addresses.len(),
            ports: ports.len(),
            timeout: self.config.timeout,
            workers: pool.size(),
        };
        reporter.begin(&plan)?;
        tracing::debug!(?plan, "scan starting");

        let scheduler = Scheduler::new(addresses, ports, self.config.timeout);
        let queue_capacity = self.config.concurrency;
        let (work_tx, work_rx) = mpsc::channel(queue_capacity);
        let (result_tx, mut result_rx) = mpsc::channel(queue_capacity);

        let producer = scheduler.spawn(work_tx, self.cancel.clone());
        let closer = pool.spawn(WorkQueue::new(work_rx), result_tx, self.cancel.clone());

        while let Some(result) = result_rx.recv().await {
            if let Err(e) = reporter.record(&result) {
                // Dropping the receiver makes the workers, then the
                // scheduler, stop on their next send.
                drop(result_rx);
                self.cancel.cancel();
                return Err(e.into());
            }
        }

        if let Err(e) = closer.await {
            tracing::warn!(error = %e, "worker pool closer failed");
        }
        let scheduled = producer.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "scheduler failed");
            reporter.completed()
        });

        let summary = ScanSummary {
            addresses: plan.addresses,
            ports: plan.ports,
            scheduled,
            completed: reporter.completed(),
            open: reporter.open(),
            interrupted: reporter.completed() < plan.total(),
        };
        reporter.finish(&summary)?;
        Ok(summary)
    }
}
