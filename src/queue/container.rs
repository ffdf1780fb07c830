use super::types::{ContainerKey, ReplicaRole};
use crate::serialization::Data;

use std::collections::VecDeque;

/// One queue element. Null elements are allowed and preserved.
pub type QueueItem = Option<Data>;

/// State of one queue in one partition on one replica.
///
/// The container does no locking of its own: the executor guarantees a single
/// worker touches a partition at a time. Primary mutators enforce `max_size`;
/// `*_backup` mutators always apply, since the owner already admitted the change.
#[derive(Debug)]
pub struct QueueContainer {
    key: ContainerKey,
    items: VecDeque<QueueItem>,
    max_size: Option<usize>,
}

impl QueueContainer {
    pub fn new(key: ContainerKey, max_size: Option<usize>) -> Self {
        Self {
            key,
            items: VecDeque::new(),
            max_size,
        }
    }

    pub fn key(&self) -> &ContainerKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn partition_id(&self) -> u32 {
        self.key.partition_id
    }

    pub fn role(&self) -> ReplicaRole {
        self.key.role
    }

    fn has_room_for(&self, count: usize) -> bool {
        match self.max_size {
            Some(max) => self.items.len().saturating_add(count) <= max,
            None => true,
        }
    }

    /// Appends one element if the queue has room.
    pub fn offer(&mut self, item: QueueItem) -> bool {
        if !self.has_room_for(1) {
            tracing::debug!("Queue '{}' full, offer refused", self.key.name);
            return false;
        }
        self.items.push_back(item);
        true
    }

    pub fn offer_backup(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    /// Appends the whole batch, or nothing if it does not fit.
    pub fn add_all(&mut self, items: &[QueueItem]) -> bool {
        if !self.has_room_for(items.len()) {
            tracing::debug!(
                "Queue '{}' cannot take {} more elements",
                self.key.name,
                items.len()
            );
            return false;
        }
        self.items.extend(items.iter().cloned());
        true
    }

    pub fn add_all_backup(&mut self, items: &[QueueItem]) {
        self.items.extend(items.iter().cloned());
    }

    /// Removes the head. `None` means the queue was empty.
    pub fn poll(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    pub fn poll_backup(&mut self) {
        if self.items.pop_front().is_none() {
            tracing::warn!(
                "Backup poll on empty queue '{}' (partition {}, {})",
                self.key.name,
                self.key.partition_id,
                self.key.role
            );
        }
    }

    pub fn peek(&self) -> Option<&QueueItem> {
        self.items.front()
    }

    /// Removes everything, returning how many elements were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }
}
