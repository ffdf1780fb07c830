//! Backup Replicator
//!
//! Takes the backup produced by a successful primary operation, encodes it once and
//! queues it for every backup holder of the partition.
//!
//! ## Ordering
//! Each target address has one link: an ordered channel drained by one task that
//! sends frames one at a time. `replicate` is called from the worker that applied the
//! primary operation, so frames for a partition enter each link in apply order.

use super::health::ReplicationHealth;
use super::transport::ReplicaTransport;
use crate::operation::{BoxedBackup, OperationRegistry};
use crate::partition::{PartitionTable, ReplicaTarget};

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

struct BackupMessage {
    partition_id: u32,
    target: ReplicaTarget,
    frame: Bytes,
}

pub struct BackupReplicator {
    table: Arc<dyn PartitionTable>,
    transport: Arc<dyn ReplicaTransport>,
    health: Arc<ReplicationHealth>,
    /// One ordered link per target address.
    links: DashMap<String, UnboundedSender<BackupMessage>>,
    runtime: Handle,
}

impl BackupReplicator {
    /// Must be called from within a Tokio runtime; links are spawned onto it.
    pub fn new(table: Arc<dyn PartitionTable>, transport: Arc<dyn ReplicaTransport>) -> Arc<Self> {
        Arc::new(Self {
            table,
            transport,
            health: Arc::new(ReplicationHealth::new()),
            links: DashMap::new(),
            runtime: Handle::current(),
        })
    }

    pub fn health(&self) -> &Arc<ReplicationHealth> {
        &self.health
    }

    pub fn partition_table(&self) -> &Arc<dyn PartitionTable> {
        &self.table
    }

    /// Queues `backup` for every backup holder of the partition. Never blocks and
    /// never fails the caller; delivery problems go to [`ReplicationHealth`].
    pub fn replicate(&self, partition_id: u32, backup: BoxedBackup) {
        let targets = self.table.backup_targets(partition_id);
        if targets.is_empty() {
            return;
        }

        let operation = backup.as_operation();
        let frame = OperationRegistry::encode(operation);
        tracing::trace!(
            "Replicating {:?} on partition {} to {} replica(s)",
            operation,
            partition_id,
            targets.len()
        );

        for target in targets {
            self.enqueue(BackupMessage {
                partition_id,
                target,
                frame: frame.clone(),
            });
        }
    }

    fn enqueue(&self, message: BackupMessage) {
        self.health.backup_enqueued();

        let link = self
            .links
            .entry(message.target.address.clone())
            .or_insert_with(|| self.spawn_link(&message.target.address))
            .clone();

        if let Err(mpsc::error::SendError(message)) = link.send(message) {
            // The link task is gone (runtime shutting down).
            self.links.remove(&message.target.address);
            self.health.record_send_failure(
                message.partition_id,
                message.target.replica_index,
                &message.target.address,
                crate::error::ClusterError::Transport("replication link closed".to_string()),
            );
        }
    }

    fn spawn_link(&self, address: &str) -> UnboundedSender<BackupMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<BackupMessage>();
        let transport = self.transport.clone();
        let health = self.health.clone();
        let address = address.to_string();

        tracing::info!("Opening replication link to {}", address);
        self.runtime.spawn(async move {
            while let Some(message) = rx.recv().await {
                match transport
                    .send_backup(&message.target, message.partition_id, message.frame)
                    .await
                {
                    Ok(()) => health.backup_delivered(),
                    Err(e) => health.record_send_failure(
                        message.partition_id,
                        message.target.replica_index,
                        &message.target.address,
                        e,
                    ),
                }
            }
            tracing::debug!("Replication link to {} closed", address);
        });

        tx
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
