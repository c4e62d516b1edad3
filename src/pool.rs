//! Fixed-size worker pool draining a single job queue.
//!
//! The queue is a rendezvous: it holds no jobs of its own. A waiting worker
//! announces itself with a one-shot slot, and [`JobSink::submit`] only
//! returns once it has put the job into such a slot. A fast producer (the
//! watcher expanding a large directory) therefore cannot get ahead of the
//! workers by even one job.
//!
//! Closing works like closing a channel: once [`JobSink::close`] is called no
//! new jobs are accepted, jobs already handed off are still processed, and
//! workers exit instead of waiting for more.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::conversion::{Converter, Job, OutcomeStatus};

/// A worker's offer to take exactly one job.
type Slot = oneshot::Sender<Job>;

/// Returned by [`JobSink::submit`] once the queue has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("job queue is closed")]
pub struct QueueClosed;

/// Producer handle for the job queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct JobSink {
    slots: Arc<Mutex<mpsc::UnboundedReceiver<Slot>>>,
    closed: CancellationToken,
}

/// Consumer handle for the job queue. Cheap to clone; every clone competes
/// for the same jobs.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    slots: mpsc::UnboundedSender<Slot>,
    closed: CancellationToken,
}

/// Create a job queue. Used by [`run_pool`]; exposed so producers can be
/// exercised against a plain receiver.
pub fn job_channel() -> (JobSink, JobReceiver) {
    let (slots_tx, slots_rx) = mpsc::unbounded_channel();
    let closed = CancellationToken::new();
    let sink = JobSink {
        slots: Arc::new(Mutex::new(slots_rx)),
        closed: closed.clone(),
    };
    let receiver = JobReceiver {
        slots: slots_tx,
        closed,
    };
    (sink, receiver)
}

impl JobSink {
    /// Hand a path to a worker, waiting until one is ready to take it.
    pub async fn submit(&self, path: impl Into<PathBuf>) -> Result<(), QueueClosed> {
        let mut job = Job::new(path);

        // Producers line up here, so jobs are handed off in submit order.
        let mut slots = tokio::select! {
            biased;

            _ = self.closed.cancelled() => return Err(QueueClosed),
            slots = self.slots.lock() => slots,
        };

        loop {
            let slot = tokio::select! {
                biased;

                _ = self.closed.cancelled() => return Err(QueueClosed),
                slot = slots.recv() => slot.ok_or(QueueClosed)?,
            };

            match slot.send(job) {
                Ok(()) => return Ok(()),
                // That receiver stopped waiting; offer the job to the next.
                Err(returned) => job = returned,
            }
        }
    }

    /// Stop accepting jobs. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the queue has been closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

impl JobReceiver {
    /// Wait for the next job.
    ///
    /// Returns `None` once the queue is closed or every [`JobSink`] is gone.
    /// A job that was handed off before the close is still returned.
    pub async fn recv(&self) -> Option<Job> {
        if self.closed.is_cancelled() {
            return None;
        }

        let (slot, mut taken) = oneshot::channel();
        self.slots.send(slot).ok()?;

        tokio::select! {
            biased;

            job = &mut taken => job.ok(),
            _ = self.closed.cancelled() => {
                // Refuse further handoffs but keep one that already landed.
                taken.close();
                taken.try_recv().ok()
            }
        }
    }
}

/// Per-status job counts, reported after drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub compliant: usize,
    pub transcoded: usize,
    pub failed: usize,
}

impl PoolStats {
    pub fn total(&self) -> usize {
        self.compliant + self.transcoded + self.failed
    }
}

#[derive(Debug, Default)]
struct Counters {
    compliant: AtomicUsize,
    transcoded: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            compliant: self.compliant.load(Ordering::Relaxed),
            transcoded: self.transcoded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Owner handle for the running workers.
pub struct PoolHandle {
    sink: JobSink,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

/// Start `converter.config().workers` workers sharing one queue.
///
/// Must be called from within a tokio runtime.
pub fn run_pool(converter: Arc<Converter>) -> (JobSink, PoolHandle) {
    let (sink, jobs) = job_channel();
    let counters = Arc::new(Counters::default());
    let worker_count = converter.config().workers.max(1);

    let workers = (0..worker_count)
        .map(|worker_id| {
            tokio::spawn(worker_loop(
                worker_id,
                jobs.clone(),
                converter.clone(),
                counters.clone(),
            ))
        })
        .collect();

    info!("Started {} conversion workers", worker_count);

    let handle = PoolHandle {
        sink: sink.clone(),
        workers,
        counters,
    };
    (sink, handle)
}

impl PoolHandle {
    /// Close the queue and wait for every worker to finish its current and
    /// remaining queued jobs.
    pub async fn drain(self) -> PoolStats {
        self.sink.close();
        drop(self.sink);

        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("Worker task panicked: {}", e);
            }
        }

        let stats = self.counters.snapshot();
        info!(
            compliant = stats.compliant,
            transcoded = stats.transcoded,
            failed = stats.failed,
            "All workers drained"
        );
        stats
    }
}

async fn worker_loop(
    worker_id: usize,
    jobs: JobReceiver,
    converter: Arc<Converter>,
    counters: Arc<Counters>,
) {
    while let Some(job) = jobs.recv().await {
        tracing::debug!(worker_id, job_id = %job.id, "Picked up {:?}", job.path);
        let outcome = converter.process(&job).await;

        match &outcome.status {
            OutcomeStatus::Compliant(action) => {
                counters.compliant.fetch_add(1, Ordering::Relaxed);
                info!(job_id = %job.id, "{:?} already compliant ({:?})", job.path, action);
            }
            OutcomeStatus::Transcoded => {
                counters.transcoded.fetch_add(1, Ordering::Relaxed);
            }
            OutcomeStatus::Failed(reason) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(job_id = %job.id, "Error converting {:?}: {}", job.path, reason);
            }
        }
    }

    tracing::debug!(worker_id, "Worker exiting");
}
