//! Container Registry
//!
//! Resolves `(partition, queue name, replica role)` to the container holding that
//! state on this member. Containers are created on first access. Owners only resolve
//! declared queue names; a backup for an unknown name declares it with default
//! settings, unless the name was destroyed here or the partition was evacuated.

use super::container::{QueueContainer, QueueItem};
use super::types::{ContainerKey, QueueDescriptor, ReplicaRole};
use crate::error::{ClusterError, Result};

use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Mutex};

/// Shared handle to one container. The mutex is never contended while the executor's
/// one-worker-per-partition routing holds.
pub type ContainerRef = Arc<Mutex<QueueContainer>>;

pub struct ContainerRegistry {
    /// Declared queues and their settings.
    queues: DashMap<String, QueueDescriptor>,
    /// Live containers. Structure: `ContainerKey -> container`.
    containers: DashMap<ContainerKey, ContainerRef>,
    /// Names destroyed on this member; backups no longer declare them implicitly.
    destroyed: DashSet<String>,
    /// Partitions moved away from this member; backups for them are refused.
    evacuated: DashSet<u32>,
}

impl ContainerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Declares a queue. Re-declaring replaces its settings for containers created
    /// afterwards.
    pub fn create_queue(&self, name: &str, descriptor: QueueDescriptor) {
        self.destroyed.remove(name);
        if self
            .queues
            .insert(name.to_string(), descriptor.clone())
            .is_none()
        {
            tracing::info!("Created queue '{}' (max_size: {:?})", name, descriptor.max_size);
        }
    }

    /// Declares a queue with default settings if it is not declared yet.
    pub fn ensure_queue(&self, name: &str) {
        if !self.queues.contains_key(name) {
            self.create_queue(name, QueueDescriptor::default());
        }
    }

    pub fn has_queue(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    /// Removes the queue declaration and every container of it, on all partitions
    /// and roles.
    pub fn destroy_queue(&self, name: &str) -> usize {
        self.queues.remove(name);
        self.destroyed.insert(name.to_string());
        let before = self.containers.len();
        self.containers.retain(|key, _| key.name != name);
        let removed = before.saturating_sub(self.containers.len());
        tracing::info!("Destroyed queue '{}' ({} containers)", name, removed);
        removed
    }

    /// Drops every container of a partition, e.g. after it migrated away. Backups for
    /// it are refused until [`reinstate_partition`](Self::reinstate_partition).
    pub fn evacuate_partition(&self, partition_id: u32) -> usize {
        self.evacuated.insert(partition_id);
        let before = self.containers.len();
        self.containers
            .retain(|key, _| key.partition_id != partition_id);
        let removed = before.saturating_sub(self.containers.len());
        tracing::info!("Evacuated partition {} ({} containers)", partition_id, removed);
        removed
    }

    /// Accepts backups for a partition again after it was evacuated.
    pub fn reinstate_partition(&self, partition_id: u32) {
        if self.evacuated.remove(&partition_id).is_some() {
            tracing::info!("Reinstated partition {}", partition_id);
        }
    }

    /// Returns the container, creating it on first access.
    pub fn resolve(&self, partition_id: u32, name: &str, role: ReplicaRole) -> Result<ContainerRef> {
        let unresolved = || ClusterError::ContainerResolution {
            partition_id,
            name: name.to_string(),
            role,
        };

        if role.is_backup() && self.evacuated.contains(&partition_id) {
            return Err(unresolved());
        }

        let descriptor = match self.queues.get(name) {
            Some(descriptor) => descriptor.clone(),
            None if role.is_backup() && !self.destroyed.contains(name) => self
                .queues
                .entry(name.to_string())
                .or_insert_with(|| {
                    tracing::info!("Declared queue '{}' on first backup for partition {}", name, partition_id);
                    QueueDescriptor::default()
                })
                .clone(),
            None => return Err(unresolved()),
        };

        let key = ContainerKey::new(partition_id, name, role);
        let container = self
            .containers
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!("Creating container '{}' for partition {} ({})", name, partition_id, role);
                Arc::new(Mutex::new(QueueContainer::new(key, descriptor.max_size)))
            })
            .clone();

        Ok(container)
    }

    /// Looks up an existing container without creating one.
    pub fn get(&self, partition_id: u32, name: &str, role: ReplicaRole) -> Option<ContainerRef> {
        self.containers
            .get(&ContainerKey::new(partition_id, name, role))
            .map(|entry| entry.value().clone())
    }

    /// Copy of a container's elements, oldest first.
    pub fn snapshot(&self, partition_id: u32, name: &str, role: ReplicaRole) -> Option<Vec<QueueItem>> {
        self.get(partition_id, name, role).map(|container| {
            container
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .items()
        })
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self {
            queues: DashMap::new(),
            containers: DashMap::new(),
            destroyed: DashSet::new(),
            evacuated: DashSet::new(),
        }
    }
}
