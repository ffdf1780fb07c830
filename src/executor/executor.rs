//! Partition Operation Executor
//!
//! Runs operations against the containers of this member, one partition at a time.
//!
//! ## Responsibilities
//! - **Dispatch**: routing every operation to the worker owning its partition in the
//!   pool of the requested policy (pools are created on first use).
//! - **Primary path**: running the operation against the owner container and, on
//!   success, handing its backup to the [`BackupReplicator`] from the same worker so
//!   backups leave in apply order.
//! - **Backup path**: decoding incoming backup frames and applying them to the backup
//!   container of the given replica.

use super::handle::{Job, OperationHandle};
use super::pool::{PoolStats, WorkerPool};
use crate::config::ExecutorConfigs;
use crate::error::{ClusterError, Result};
use crate::operation::{Operation, OperationContext, OperationRegistry};
use crate::queue::registry::ContainerRegistry;
use crate::queue::types::ReplicaRole;
use crate::replication::{BackupReplicator, ReplicationHealth};

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Policy used for client-facing queue operations.
pub const QUEUE_POLICY: &str = "queue";
/// Policy used for backups arriving from partition owners.
pub const QUEUE_BACKUP_POLICY: &str = "queue-backup";

pub struct PartitionOperationExecutor {
    configs: ExecutorConfigs,
    /// Lazily created pools. Structure: `policy name -> pool`.
    pools: DashMap<String, Arc<WorkerPool>>,
    containers: Arc<ContainerRegistry>,
    registry: Arc<OperationRegistry>,
    replicator: Arc<BackupReplicator>,
    runtime: Handle,
    shut_down: AtomicBool,
}

impl PartitionOperationExecutor {
    /// Must be called from within a Tokio runtime; workers are spawned onto it.
    pub fn new(
        configs: ExecutorConfigs,
        containers: Arc<ContainerRegistry>,
        registry: Arc<OperationRegistry>,
        replicator: Arc<BackupReplicator>,
    ) -> Arc<Self> {
        tracing::info!(
            "Starting partition operation executor (policies: {:?})",
            configs.names()
        );

        Arc::new(Self {
            configs,
            pools: DashMap::new(),
            containers,
            registry,
            replicator,
            runtime: Handle::current(),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn containers(&self) -> &Arc<ContainerRegistry> {
        &self.containers
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    pub fn health(&self) -> &Arc<ReplicationHealth> {
        self.replicator.health()
    }

    /// The partition a container name is bound to.
    pub fn partition_for(&self, name: &str) -> u32 {
        self.replicator.partition_table().partition_for(name)
    }

    /// Submits a primary operation on `partition_id` under `policy`.
    ///
    /// Fails with `Rejected` if the pool is at capacity or shut down. Otherwise the
    /// returned handle resolves once the operation ran on the owner container.
    pub fn submit(&self, policy: &str, partition_id: u32, op: Box<dyn Operation>) -> Result<OperationHandle> {
        let pool = self.pool(policy)?;
        tracing::trace!("Submitting {:?} to '{}' on partition {}", op, policy, partition_id);

        let containers = self.containers.clone();
        let replicator = self.replicator.clone();
        let (job, handle) = Job::new(
            partition_id,
            Box::new(move || {
                let ctx = OperationContext::new(partition_id, ReplicaRole::Owner, &containers);
                let response = op.run(&ctx)?;
                if let Some(backup) = op.backup_operation(&response) {
                    replicator.replicate(partition_id, backup);
                }
                Ok(response)
            }),
        );

        pool.submit(job)?;
        Ok(handle)
    }

    /// Accepts a backup frame for `partition_id` held here as replica `replica_index`.
    ///
    /// Undecodable frames and non-backup operation types fail with `Decode` before
    /// anything is queued. Apply failures resolve the handle with the error and are
    /// recorded in [`ReplicationHealth`].
    pub fn receive_backup(&self, partition_id: u32, replica_index: u8, frame: Bytes) -> Result<OperationHandle> {
        let health = self.replicator.health().clone();

        let op = self.registry.decode_backup(frame).map_err(|e| {
            health.record_apply_failure(partition_id, replica_index, e.clone());
            e
        })?;

        let pool = self.pool(QUEUE_BACKUP_POLICY)?;
        tracing::trace!(
            "Applying backup {:?} on partition {} as replica {}",
            op,
            partition_id,
            replica_index
        );

        let containers = self.containers.clone();
        let (job, handle) = Job::new(
            partition_id,
            Box::new(move || {
                let ctx = OperationContext::new(partition_id, ReplicaRole::Backup(replica_index), &containers);
                op.run(&ctx).map_err(|e| {
                    health.record_apply_failure(partition_id, replica_index, e.clone());
                    e
                })
            }),
        );

        pool.submit(job)?;
        Ok(handle)
    }

    fn pool(&self, policy: &str) -> Result<Arc<WorkerPool>> {
        let shut_down = || ClusterError::Rejected {
            executor: policy.to_string(),
            reason: "executor is shut down".to_string(),
        };
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(shut_down());
        }

        if let Some(pool) = self.pools.get(policy) {
            return Ok(pool.clone());
        }

        let pool = self
            .pools
            .entry(policy.to_string())
            .or_insert_with(|| {
                Arc::new(WorkerPool::new(
                    self.configs.resolve(policy),
                    self.replicator.partition_table().partition_count(),
                    self.runtime.clone(),
                ))
            })
            .clone();

        // A concurrent `shutdown` may have swept `pools` before this insert landed.
        if self.shut_down.load(Ordering::SeqCst) {
            pool.shutdown();
            return Err(shut_down());
        }
        Ok(pool)
    }

    /// Stops accepting operations on every pool. Queued operations still run.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        for pool in self.pools.iter() {
            pool.shutdown();
        }
        tracing::info!("Partition operation executor shut down");
    }

    pub fn pool_stats(&self, policy: &str) -> Option<PoolStats> {
        self.pools.get(policy).map(|pool| pool.stats())
    }

    pub fn all_pool_stats(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self.pools.iter().map(|pool| pool.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}
