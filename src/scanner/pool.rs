//! Worker pool.
//!
//! A fixed number of workers pull tasks from the shared work queue, perform
//! one connect attempt each and push one result per task. The pool's closer
//! joins every worker before the last result sender is dropped, which is what
//! closes the result queue for the aggregator.

use crate::scanner::rate_limiter::RateLimiter;
use crate::scanner::traits::{Connector, ScanResult, ScanTask};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on workers relative to available hardware parallelism.
pub const WORKERS_PER_CPU: usize = 2;

/// Number of workers for a requested concurrency.
///
/// Connect scans are bounded by socket and context-switch overhead rather
/// than CPU, so the request is capped at a multiple of the available cores.
pub fn worker_count(concurrency: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    concurrency.clamp(1, cpus * WORKERS_PER_CPU)
}

/// Consumer side of the work queue, shared by every worker.
///
/// Holding the receiver behind a mutex makes each dequeue exclusive, so a
/// task is owned by at most one worker.
#[derive(Clone)]
pub struct WorkQueue {
    rx: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
}

impl WorkQueue {
    pub fn new(rx: mpsc::Receiver<ScanTask>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next task, or `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<ScanTask> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

/// A fixed-size pool of connect workers.
pub struct WorkerPool<C> {
    size: usize,
    connector: Arc<C>,
    limiter: Option<RateLimiter>,
}

impl<C: Connector + 'static> WorkerPool<C> {
    /// Create a pool sized by [`worker_count`].
    pub fn new(concurrency: usize, connector: Arc<C>) -> Self {
        Self {
            size: worker_count(concurrency),
            connector,
            limiter: None,
        }
    }

    /// Pace connect attempts through a shared rate limiter.
    pub fn with_rate_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Number of workers this pool runs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Start the workers and the closer.
    ///
    /// `results` is owned by the closer, which drops it only after every
    /// worker has exited. The returned handle completes at that point.
    pub fn spawn(
        self,
        queue: WorkQueue,
        results: mpsc::Sender<ScanResult>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let workers: Vec<JoinHandle<()>> = (0..self.size)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    results: results.clone(),
                    connector: Arc::clone(&self.connector),
                    limiter: self.limiter.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(queue);

        tracing::debug!(workers = workers.len(), "worker pool started");

        tokio::spawn(async move {
            for (id, joined) in join_all(workers).await.into_iter().enumerate() {
                if let Err(e) = joined {
                    tracing::warn!(worker = id, error = %e, "worker exited abnormally");
                }
            }
            drop(results);
            tracing::debug!("worker pool drained, result queue closed");
        })
    }
}

struct Worker<C> {
    id: usize,
    queue: WorkQueue,
    results: mpsc::Sender<ScanResult>,
    connector: Arc<C>,
    limiter: Option<RateLimiter>,
    cancel: CancellationToken,
}

impl<C: Connector> Worker<C> {
    async fn run(self) {
        let mut handled = 0usize;

        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = self.queue.next() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            if let Some(limiter) = &self.limiter {
                limiter.wait().await;
            }

            let status = self
                .connector
                .connect(task.socket_addr(), task.timeout)
                .await;

            handled += 1;
            if self
                .results
                .send(ScanResult::from_task(task, status))
                .await
                .is_err()
            {
                tracing::debug!(worker = self.id, "result queue closed, stopping");
                break;
            }
        }

        tracing::debug!(worker = self.id, handled, "worker done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::traits::PortStatus;
    use crate::types::{Port, ResolvedAddress};
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts concurrent connects; ports divisible by 7 are open.
    #[derive(Default)]
    struct CountingConnector {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, addr: SocketAddr, _timeout: Duration) -> PortStatus {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if addr.port() % 7 == 0 {
                PortStatus::Open
            } else {
                PortStatus::Closed
            }
        }
    }

    fn task(port: u16) -> ScanTask {
        ScanTask {
            address: Arc::new(ResolvedAddress::new(
                "local",
                IpAddr::V4(Ipv4Addr::LOCALHOST),
            )),
            port: Port::new(port).unwrap(),
            timeout: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_worker_count_caps() {
        let cap = std::thread::available_parallelism().unwrap().get() * WORKERS_PER_CPU;
        assert_eq!(worker_count(0), 1);
        assert_eq!(worker_count(1), 1);
        assert_eq!(worker_count(100_000), cap);
        assert_eq!(worker_count(cap), cap);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_task_yields_one_result() {
        let connector = Arc::new(CountingConnector::default());
        let pool = WorkerPool::new(8, Arc::clone(&connector));
        let size = pool.size();

        let (work_tx, work_rx) = mpsc::channel(8);
        let (result_tx, mut result_rx) = mpsc::channel(8);
        let closer = pool.spawn(WorkQueue::new(work_rx), result_tx, CancellationToken::new());

        tokio::spawn(async move {
            for port in 1..=200 {
                work_tx.send(task(port)).await.unwrap();
            }
        });

        let mut ports = Vec::new();
        while let Some(result) = result_rx.recv().await {
            assert_eq!(result.is_open(), result.port.as_u16() % 7 == 0);
            ports.push(result.port.as_u16());
        }
        closer.await.unwrap();

        ports.sort_unstable();
        assert_eq!(ports, (1..=200).collect::<Vec<u16>>());
        assert_eq!(connector.calls.load(Ordering::SeqCst), 200);
        assert!(connector.peak.load(Ordering::SeqCst) <= size);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_result_queue_closes_only_after_workers_exit() {
        let connector = Arc::new(CountingConnector::default());
        let pool = WorkerPool::new(4, connector);

        let (work_tx, work_rx) = mpsc::channel(4);
        let (result_tx, mut result_rx) = mpsc::channel(4);
        let closer = pool.spawn(WorkQueue::new(work_rx), result_tx, CancellationToken::new());

        work_tx.send(task(7)).await.unwrap();
        let first = result_rx.recv().await.unwrap();
        assert!(first.is_open());

        // Queue still open: workers are idle, result queue must stay open.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!closer.is_finished());

        drop(work_tx);
        assert!(result_rx.recv().await.is_none());
        closer.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_stops_dequeuing() {
        let connector = Arc::new(CountingConnector::default());
        let pool = WorkerPool::new(2, Arc::clone(&connector));
        let cancel = CancellationToken::new();

        let (work_tx, work_rx) = mpsc::channel(16);
        let (result_tx, mut result_rx) = mpsc::channel(16);
        cancel.cancel();
        let closer = pool.spawn(WorkQueue::new(work_rx), result_tx, cancel);

        for port in 1..=10 {
            // Fails once every worker has dropped its queue handle.
            let _ = work_tx.send(task(port)).await;
        }

        assert!(result_rx.recv().await.is_none());
        closer.await.unwrap();
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_pool_completes() {
        let connector = Arc::new(CountingConnector::default());
        let pool = WorkerPool::new(2, connector).with_rate_limiter(RateLimiter::new(1000));

        let (work_tx, work_rx) = mpsc::channel(2);
        let (result_tx, mut result_rx) = mpsc::channel(2);
        let closer = pool.spawn(WorkQueue::new(work_rx), result_tx, CancellationToken::new());

        tokio::spawn(async move {
            for port in 1..=5 {
                work_tx.send(task(port)).await.unwrap();
            }
        });

        let mut count = 0;
        while result_rx.recv().await.is_some() {
            count += 1;
        }
        closer.await.unwrap();
        assert_eq!(count, 5);
    }
}
