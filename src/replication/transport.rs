//! Backup Transport
//!
//! Delivers encoded backup frames from a partition owner to its replicas and reports
//! success or failure back to the replicator.
//!
//! - **`LocalTransport`**: In-process delivery between executors (tests, single-host
//!   clusters).
//! - **`HttpTransport`**: `POST /internal/backup/{partition}/{replica}` with the raw
//!   frame as body.

use super::protocol::backup_path;
use crate::error::{ClusterError, Result};
use crate::executor::executor::PartitionOperationExecutor;
use crate::partition::ReplicaTarget;

use bytes::Bytes;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait ReplicaTransport: Send + Sync {
    /// Delivers one backup frame. Resolves once the replica acknowledged it.
    fn send_backup<'a>(
        &'a self,
        target: &'a ReplicaTarget,
        partition_id: u32,
        frame: Bytes,
    ) -> TransportFuture<'a>;
}

/// Hands frames directly to another executor in the same process.
#[derive(Default)]
pub struct LocalTransport {
    members: DashMap<String, Weak<PartitionOperationExecutor>>,
}

impl LocalTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `executor` reachable under `address`.
    pub fn register(&self, address: &str, executor: &Arc<PartitionOperationExecutor>) {
        self.members
            .insert(address.to_string(), Arc::downgrade(executor));
        tracing::debug!("Local transport member registered at {}", address);
    }

    pub fn unregister(&self, address: &str) {
        self.members.remove(address);
    }
}

impl ReplicaTransport for LocalTransport {
    fn send_backup<'a>(
        &'a self,
        target: &'a ReplicaTarget,
        partition_id: u32,
        frame: Bytes,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let member = self
                .members
                .get(&target.address)
                .and_then(|entry| entry.value().upgrade())
                .ok_or_else(|| {
                    ClusterError::Transport(format!("no member at {}", target.address))
                })?;

            let handle = member.receive_backup(partition_id, target.replica_index, frame)?;
            handle.await.map(|_| ())
        })
    }
}

/// Sends frames over HTTP with retry on connection failures.
///
/// Only attempts that never reached the replica are retried: a request that arrived
/// may have been applied, and backups are not deduplicated.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    attempts: usize,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(2000),
            attempts: 3,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    async fn post_with_retry(&self, url: String, frame: Bytes) -> anyhow::Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..self.attempts {
            let response = self
                .client
                .post(url.clone())
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(frame.clone())
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_connect() && attempt + 1 < self.attempts => {
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
                Err(e) => return Err(anyhow::anyhow!(e)),
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicaTransport for HttpTransport {
    fn send_backup<'a>(
        &'a self,
        target: &'a ReplicaTarget,
        partition_id: u32,
        frame: Bytes,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let url = format!(
                "http://{}{}",
                target.address,
                backup_path(partition_id, target.replica_index)
            );

            let response = self
                .post_with_retry(url, frame)
                .await
                .map_err(|e| ClusterError::Transport(format!("{}: {:#}", target.address, e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ClusterError::Transport(format!(
                    "{} answered {}: {}",
                    target.address, status, body
                )));
            }

            tracing::trace!(
                "Delivered backup for partition {} to {}",
                partition_id,
                target.address
            );
            Ok(())
        })
    }
}
