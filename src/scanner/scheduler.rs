//! Work scheduling.
//!
//! The scheduler walks the cross product of resolved addresses and ports
//! (addresses outer, ports inner) and feeds it into the bounded work queue.
//! Tasks are generated lazily, so a full queue blocks the producer instead of
//! the whole product being held in memory.

use crate::scanner::traits::ScanTask;
use crate::types::{PortSet, ResolvedAddress};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Producer side of the work queue.
#[derive(Debug, Clone)]
pub struct Scheduler {
    addresses: Vec<Arc<ResolvedAddress>>,
    ports: Arc<PortSet>,
    timeout: Duration,
}

impl Scheduler {
    pub fn new(addresses: Vec<ResolvedAddress>, ports: PortSet, timeout: Duration) -> Self {
        Self {
            addresses: addresses.into_iter().map(Arc::new).collect(),
            ports: Arc::new(ports),
            timeout,
        }
    }

    /// Total number of tasks this scheduler will publish.
    pub fn total(&self) -> usize {
        self.addresses.len() * self.ports.len()
    }

    /// Tasks in publication order.
    pub fn tasks(&self) -> impl Iterator<Item = ScanTask> + '_ {
        self.addresses.iter().flat_map(move |address| {
            self.ports.iter().map(move |&port| ScanTask {
                address: Arc::clone(address),
                port,
                timeout: self.timeout,
            })
        })
    }

    /// Publish every task onto `queue`, then close it by dropping the sender.
    ///
    /// Stops early when `cancel` fires or when no worker is left to receive.
    /// The returned handle yields the number of tasks published.
    pub fn spawn(self, queue: mpsc::Sender<ScanTask>, cancel: CancellationToken) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut published = 0usize;

            for task in self.tasks() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(published, "scheduler cancelled");
                        break;
                    }
                    sent = queue.send(task) => {
                        if sent.is_err() {
                            tracing::debug!(published, "work queue closed by workers");
                            break;
                        }
                        published += 1;
                    }
                }
            }

            tracing::debug!(published, "scheduler finished");
            published
        })
    }
}
