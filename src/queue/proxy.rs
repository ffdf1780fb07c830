//! Queue Proxy
//!
//! Client-side view of one named queue. Every call becomes an operation submitted to
//! the executor under the `"queue"` policy on the partition the name hashes to, and
//! resolves once the owner container applied it.

use super::container::QueueItem;
use super::operations::{
    AddAllOperation, ClearOperation, OfferOperation, PeekOperation, PollOperation, SizeOperation,
};
use crate::error::{ClusterError, Result};
use crate::executor::{PartitionOperationExecutor, QUEUE_POLICY};
use crate::operation::{Operation, OperationResponse};

use std::sync::Arc;

#[derive(Clone)]
pub struct QueueProxy {
    name: String,
    partition_id: u32,
    executor: Arc<PartitionOperationExecutor>,
}

impl QueueProxy {
    /// Binds to `name`, declaring the queue with default settings if needed.
    pub fn new(name: impl Into<String>, executor: Arc<PartitionOperationExecutor>) -> Self {
        let name = name.into();
        executor.containers().ensure_queue(&name);
        let partition_id = executor.partition_for(&name);
        tracing::debug!("Queue proxy '{}' bound to partition {}", name, partition_id);

        Self {
            name,
            partition_id,
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    /// Appends one element. `false` if the queue is at its size bound.
    pub async fn offer(&self, item: QueueItem) -> Result<bool> {
        match self.invoke(OfferOperation::new(&self.name, item)).await? {
            OperationResponse::Accepted(accepted) => Ok(accepted),
            other => Err(unexpected("offer", other)),
        }
    }

    /// Appends all elements in order, or none if they would not fit.
    pub async fn add_all(&self, items: Vec<QueueItem>) -> Result<bool> {
        match self.invoke(AddAllOperation::new(&self.name, items)).await? {
            OperationResponse::Accepted(accepted) => Ok(accepted),
            other => Err(unexpected("add_all", other)),
        }
    }

    /// Removes the head. `None` if the queue is empty.
    pub async fn poll(&self) -> Result<Option<QueueItem>> {
        match self.invoke(PollOperation::new(&self.name)).await? {
            OperationResponse::Item(item) => Ok(item),
            other => Err(unexpected("poll", other)),
        }
    }

    pub async fn peek(&self) -> Result<Option<QueueItem>> {
        match self.invoke(PeekOperation::new(&self.name)).await? {
            OperationResponse::Item(item) => Ok(item),
            other => Err(unexpected("peek", other)),
        }
    }

    pub async fn size(&self) -> Result<usize> {
        match self.invoke(SizeOperation::new(&self.name)).await? {
            OperationResponse::Count(size) => Ok(size),
            other => Err(unexpected("size", other)),
        }
    }

    /// Removes every element and returns how many there were.
    pub async fn clear(&self) -> Result<usize> {
        match self.invoke(ClearOperation::new(&self.name)).await? {
            OperationResponse::Count(removed) => Ok(removed),
            other => Err(unexpected("clear", other)),
        }
    }

    async fn invoke(&self, op: impl Operation) -> Result<OperationResponse> {
        self.executor
            .submit(QUEUE_POLICY, self.partition_id, Box::new(op))?
            .await
    }
}

fn unexpected(call: &str, response: OperationResponse) -> ClusterError {
    ClusterError::OperationFailed(format!("unexpected response to {}: {:?}", call, response))
}
