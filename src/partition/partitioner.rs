use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTITION_COUNT: u32 = 271;

/// A backup holder of a partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReplicaTarget {
    /// 1 for the first backup, 2 for the second, ...
    pub replica_index: u8,
    /// Transport address of the member (e.g. `127.0.0.1:6001`).
    pub address: String,
}

/// Partition lookup used by the executor and the queue proxy.
pub trait PartitionTable: Send + Sync {
    fn partition_count(&self) -> u32;

    /// Maps a key (a queue name) to its partition.
    fn partition_for(&self, key: &str) -> u32 {
        stable_hash(key) % self.partition_count()
    }

    /// Backup holders of a partition, in replica order.
    fn backup_targets(&self, partition_id: u32) -> Vec<ReplicaTarget>;
}

/// FNV-1a. Unlike `DefaultHasher`, the result is the same on every member and every
/// build, so all members agree on key placement.
pub(crate) fn stable_hash(key: &str) -> u32 {
    key.bytes().fold(0x811c_9dc5u32, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(0x0100_0193)
    })
}

/// This member owns every partition; the same peers back up all of them.
pub struct StaticPartitionTable {
    num_partitions: u32,
    backups: Vec<String>,
    backup_count: usize,
}

impl StaticPartitionTable {
    pub fn new(num_partitions: u32, backups: Vec<String>) -> Self {
        let backup_count = backups.len();
        Self {
            num_partitions: num_partitions.max(1),
            backups,
            backup_count,
        }
    }

    /// A table without backups.
    pub fn standalone(num_partitions: u32) -> Self {
        Self::new(num_partitions, Vec::new())
    }

    /// Limits how many of the configured peers are used as backups.
    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count.min(self.backups.len()).min(u8::MAX as usize);
        self
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }
}

impl PartitionTable for StaticPartitionTable {
    fn partition_count(&self) -> u32 {
        self.num_partitions
    }

    fn backup_targets(&self, _partition_id: u32) -> Vec<ReplicaTarget> {
        self.backups
            .iter()
            .take(self.backup_count)
            .enumerate()
            .map(|(index, address)| ReplicaTarget {
                replica_index: (index + 1) as u8,
                address: address.clone(),
            })
            .collect()
    }
}
