use serde::{Deserialize, Serialize};
use std::fmt;

/// Which copy of a partition's state a container belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReplicaRole {
    /// The partition owner; runs primary operations.
    Owner,
    /// The n-th backup replica (n starts at 1); runs backup operations only.
    Backup(u8),
}

impl ReplicaRole {
    pub fn is_backup(&self) -> bool {
        matches!(self, ReplicaRole::Backup(_))
    }
}

impl fmt::Display for ReplicaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaRole::Owner => f.write_str("owner"),
            ReplicaRole::Backup(index) => write!(f, "backup-{}", index),
        }
    }
}

/// Identity of one container: (partition, queue name, replica role).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey {
    pub partition_id: u32,
    pub name: String,
    pub role: ReplicaRole,
}

impl ContainerKey {
    pub fn new(partition_id: u32, name: impl Into<String>, role: ReplicaRole) -> Self {
        Self {
            partition_id,
            name: name.into(),
            role,
        }
    }
}

/// Per-queue settings shared by every container of that queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueDescriptor {
    /// Upper bound on elements accepted by primary offers; `None` is unbounded.
    pub max_size: Option<usize>,
}
