//! Worker Pool
//!
//! One pool per executor policy. A pool owns `worker_count` slots; each slot is an
//! ordered channel drained by at most one worker task. Operations are routed to the
//! slot `partition_id % worker_count`, so every operation of a partition goes through
//! the same channel and the same worker, one at a time, in submission order.
//! `worker_count` never exceeds the partition count, since no partition routes past it.
//!
//! ## Lifecycle
//! - Workers are spawned on the first submission routed to their slot.
//! - Slots below `core_size` keep their worker for the pool's lifetime. The others
//!   retire after `keep_alive` without work and are respawned on demand.
//! - `shutdown` closes every slot; workers drain what is already queued, then exit.

use super::handle::Job;
use crate::config::{ExecutorConfig, ExecutorType};
use crate::error::{ClusterError, Result};

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};

/// Point-in-time view of a pool, for logs and the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub name: String,
    pub executor_type: String,
    pub worker_count: usize,
    pub core_size: usize,
    pub live_workers: usize,
    pub backlog: usize,
    pub completed: u64,
}

pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
}

struct PoolShared {
    config: ExecutorConfig,
    /// Sender side of each slot's channel; `None` while no worker serves the slot.
    slots: Vec<Mutex<Option<UnboundedSender<Job>>>>,
    core_size: usize,
    capacity: usize,
    /// Accepted but not yet started operations, across all slots.
    backlog: AtomicUsize,
    live_workers: AtomicUsize,
    completed: AtomicU64,
    shutdown: AtomicBool,
    runtime: Handle,
}

impl WorkerPool {
    pub(crate) fn new(config: ExecutorConfig, partition_count: u32, runtime: Handle) -> Self {
        let max = (config.max_pool_size() as usize).min(partition_count.max(1) as usize);
        let worker_count = match config.executor_type() {
            ExecutorType::Parallel | ExecutorType::BlockingParallel => max,
            ExecutorType::Queued => 1,
        };

        if config.core_pool_size() > config.max_pool_size() {
            tracing::warn!(
                "Executor '{}': corePoolSize {} exceeds maxPoolSize {}, capping",
                config.name(),
                config.core_pool_size(),
                config.max_pool_size()
            );
        }
        let core_size = (config.core_pool_size() as usize).min(worker_count);

        tracing::info!(
            "Creating {} pool '{}' ({} workers, {} core, capacity {})",
            config.executor_type(),
            config.name(),
            worker_count,
            core_size,
            config.capacity()
        );

        Self {
            shared: Arc::new(PoolShared {
                slots: (0..worker_count).map(|_| Mutex::new(None)).collect(),
                core_size,
                capacity: config.capacity() as usize,
                backlog: AtomicUsize::new(0),
                live_workers: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                shutdown: AtomicBool::new(false),
                config,
                runtime,
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.shared.config.name()
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.shared.slots.len()
    }

    /// The slot every operation of `partition_id` is routed to.
    pub(crate) fn route(&self, partition_id: u32) -> usize {
        partition_id as usize % self.worker_count()
    }

    /// Enqueues a job on its partition's slot. Never runs it inline and never blocks.
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let shared = &self.shared;
        if shared.shutdown.load(Ordering::SeqCst) {
            return Err(shared.rejected("executor is shut down"));
        }

        shared
            .backlog
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |queued| {
                (queued < shared.capacity).then_some(queued + 1)
            })
            .map_err(|_| {
                tracing::warn!(
                    "Executor '{}' at capacity ({}), rejecting operation for partition {}",
                    shared.config.name(),
                    shared.capacity,
                    job.partition_id()
                );
                shared.rejected(format!("queue is at capacity ({})", shared.capacity))
            })?;

        let index = self.route(job.partition_id());
        let mut slot = shared.lock_slot(index);

        // Re-checked under the slot lock so nothing is queued after shutdown closed it.
        if shared.shutdown.load(Ordering::SeqCst) {
            shared.backlog.fetch_sub(1, Ordering::SeqCst);
            return Err(shared.rejected("executor is shut down"));
        }

        let job = match slot.as_ref() {
            Some(tx) => match tx.send(job) {
                Ok(()) => return Ok(()),
                Err(SendError(job)) => job,
            },
            None => job,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(tx);
        drop(slot);

        shared.spawn_worker(index, job, rx);
        Ok(())
    }

    /// Stops accepting work. Already queued operations still run.
    pub(crate) fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        for index in 0..self.worker_count() {
            self.shared.lock_slot(index).take();
        }
        tracing::info!("Executor '{}' shut down", self.name());
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let shared = &self.shared;
        PoolStats {
            name: shared.config.name().to_string(),
            executor_type: shared.config.executor_type().to_string(),
            worker_count: shared.slots.len(),
            core_size: shared.core_size,
            live_workers: shared.live_workers.load(Ordering::SeqCst),
            backlog: shared.backlog.load(Ordering::SeqCst),
            completed: shared.completed.load(Ordering::SeqCst),
        }
    }
}

impl PoolShared {
    fn rejected(&self, reason: impl Into<String>) -> ClusterError {
        ClusterError::Rejected {
            executor: self.config.name().to_string(),
            reason: reason.into(),
        }
    }

    fn lock_slot(&self, index: usize) -> MutexGuard<'_, Option<UnboundedSender<Job>>> {
        self.slots[index]
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn spawn_worker(self: &Arc<Self>, index: usize, first: Job, rx: UnboundedReceiver<Job>) {
        let shared = self.clone();
        self.runtime.spawn(async move {
            shared.worker_loop(index, first, rx).await;
        });
    }

    async fn worker_loop(&self, index: usize, first: Job, mut rx: UnboundedReceiver<Job>) {
        self.live_workers.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Worker {} of '{}' started", index, self.config.name());

        let core = index < self.core_size;
        let mut next = Some(first);

        while let Some(job) = next {
            self.execute(job).await;

            next = if core {
                rx.recv().await
            } else {
                match tokio::time::timeout(self.config.keep_alive(), rx.recv()).await {
                    Ok(job) => job,
                    Err(_) => self.retire(index, &mut rx),
                }
            };
        }

        self.live_workers.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Worker {} of '{}' stopped", index, self.config.name());
    }

    /// Called when a non-core worker idled past keep-alive. Closes the slot unless a
    /// job slipped in, which is returned instead.
    fn retire(&self, index: usize, rx: &mut UnboundedReceiver<Job>) -> Option<Job> {
        let mut slot = self.lock_slot(index);
        match rx.try_recv() {
            Ok(job) => Some(job),
            Err(_) => {
                *slot = None;
                tracing::debug!(
                    "Worker {} of '{}' idle for {:?}, retiring",
                    index,
                    self.config.name(),
                    self.config.keep_alive()
                );
                None
            }
        }
    }

    async fn execute(&self, job: Job) {
        self.backlog.fetch_sub(1, Ordering::SeqCst);

        let Some(job) = job.begin() else {
            return;
        };

        match self.config.executor_type() {
            ExecutorType::BlockingParallel => {
                if let Err(e) = tokio::task::spawn_blocking(move || job.run()).await {
                    tracing::error!("Blocking worker of '{}' failed: {}", self.config.name(), e);
                }
            }
            ExecutorType::Parallel | ExecutorType::Queued => job.run(),
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
