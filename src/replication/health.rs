//! Replication Health
//!
//! Backup propagation never fails the primary operation. Instead every send and
//! apply failure lands here, where the membership/replication layer can read it as a
//! lag or failure signal for the affected partition and replica.

use crate::error::ClusterError;

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// How many recent failures are kept for inspection.
const RECENT_FAILURES: usize = 256;

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Which side of replication failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The owner could not deliver a backup frame (or the replica rejected it).
    Send,
    /// A backup frame reached this member but could not be applied.
    Apply,
}

#[derive(Debug, Clone)]
pub struct ReplicationFailure {
    pub kind: FailureKind,
    pub partition_id: u32,
    pub replica_index: u8,
    /// Address of the replica for send failures; empty for local apply failures.
    pub address: String,
    pub error: ClusterError,
    pub at_ms: u64,
}

#[derive(Default)]
pub struct ReplicationHealth {
    /// Backups handed to the transport but not yet acknowledged.
    pending: AtomicUsize,
    delivered: AtomicU64,
    send_failures: AtomicU64,
    apply_failures: AtomicU64,
    /// Failure counts per `(partition, replica_index)`.
    per_replica: DashMap<(u32, u8), u64>,
    recent: Mutex<VecDeque<ReplicationFailure>>,
}

impl ReplicationHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn backup_enqueued(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn backup_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Records a failed delivery of an enqueued backup.
    pub(crate) fn record_send_failure(
        &self,
        partition_id: u32,
        replica_index: u8,
        address: &str,
        error: ClusterError,
    ) {
        tracing::warn!(
            "Backup for partition {} to replica {} ({}) failed: {}",
            partition_id,
            replica_index,
            address,
            error
        );
        self.send_failures.fetch_add(1, Ordering::SeqCst);
        self.record(ReplicationFailure {
            kind: FailureKind::Send,
            partition_id,
            replica_index,
            address: address.to_string(),
            error,
            at_ms: now_ms(),
        });
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Records a backup that arrived here but could not be applied.
    pub(crate) fn record_apply_failure(&self, partition_id: u32, replica_index: u8, error: ClusterError) {
        tracing::warn!(
            "Applying backup for partition {} as replica {} failed: {}",
            partition_id,
            replica_index,
            error
        );
        self.apply_failures.fetch_add(1, Ordering::SeqCst);
        self.record(ReplicationFailure {
            kind: FailureKind::Apply,
            partition_id,
            replica_index,
            address: String::new(),
            error,
            at_ms: now_ms(),
        });
    }

    fn record(&self, failure: ReplicationFailure) {
        *self
            .per_replica
            .entry((failure.partition_id, failure.replica_index))
            .or_insert(0) += 1;

        let mut recent = self
            .recent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if recent.len() == RECENT_FAILURES {
            recent.pop_front();
        }
        recent.push_back(failure);
    }

    pub fn pending_backups(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn send_failure_count(&self) -> u64 {
        self.send_failures.load(Ordering::SeqCst)
    }

    pub fn apply_failure_count(&self) -> u64 {
        self.apply_failures.load(Ordering::SeqCst)
    }

    pub fn failures_for(&self, partition_id: u32, replica_index: u8) -> u64 {
        self.per_replica
            .get(&(partition_id, replica_index))
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn recent_failures(&self) -> Vec<ReplicationFailure> {
        self.recent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Waits until no backup is in flight or the timeout passes. Returns whether the
    /// replicator drained.
    pub async fn wait_idle(&self, timeout: std::time::Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.pending_backups() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        true
    }
}
