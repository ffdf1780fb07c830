//! Replication Module Tests
//!
//! Two or three in-process members connected by `LocalTransport` (or a transport that
//! always fails), driven through `QueueProxy` like a client would.
//!
//! ## Test Scopes
//! - **Convergence**: Backups end up identical to the owner, in order.
//! - **Partial failure**: Lost backups never affect the owner or the client.
//! - **Endpoint**: The HTTP handler for incoming frames.

#[cfg(test)]
mod tests {
    use crate::config::ExecutorConfigs;
    use crate::error::ClusterError;
    use crate::executor::PartitionOperationExecutor;
    use crate::operation::OperationRegistry;
    use crate::partition::{PartitionTable, ReplicaTarget, StaticPartitionTable, DEFAULT_PARTITION_COUNT};
    use crate::queue::operations::{register_queue_operations, AddAllBackupOperation};
    use crate::queue::proxy::QueueProxy;
    use crate::queue::registry::ContainerRegistry;
    use crate::queue::types::ReplicaRole;
    use crate::replication::handlers::handle_backup;
    use crate::replication::{
        BackupReplicator, FailureKind, LocalTransport, ReplicaTransport, TransportFuture,
    };
    use crate::serialization::Data;

    use axum::{extract::Path, http::StatusCode, Extension, Json};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Transport whose every delivery fails.
    #[derive(Default)]
    struct FailingTransport {
        attempts: AtomicUsize,
    }

    impl ReplicaTransport for FailingTransport {
        fn send_backup<'a>(
            &'a self,
            target: &'a ReplicaTarget,
            _partition_id: u32,
            _frame: Bytes,
        ) -> TransportFuture<'a> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Err(ClusterError::Transport(format!("{} unreachable", target.address)))
            })
        }
    }

    fn node(
        table: Arc<dyn PartitionTable>,
        transport: Arc<dyn ReplicaTransport>,
    ) -> Arc<PartitionOperationExecutor> {
        let registry = OperationRegistry::new();
        register_queue_operations(&registry);
        let replicator = BackupReplicator::new(table, transport);
        PartitionOperationExecutor::new(ExecutorConfigs::new(), ContainerRegistry::new(), registry, replicator)
    }

    fn table_with_backups(backups: &[&str]) -> Arc<dyn PartitionTable> {
        Arc::new(StaticPartitionTable::new(
            DEFAULT_PARTITION_COUNT,
            backups.iter().map(|b| b.to_string()).collect(),
        ))
    }

    fn standalone() -> Arc<dyn PartitionTable> {
        Arc::new(StaticPartitionTable::standalone(DEFAULT_PARTITION_COUNT))
    }

    fn data(value: &str) -> Option<Data> {
        Some(Data::from(value))
    }

    // ============================================================
    // TEST 1: Convergence over LocalTransport
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_backup_converges_with_owner() {
        // ARRANGE
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["node-b"]), transport.clone());
        let backup = node(standalone(), transport.clone());
        transport.register("node-b", &backup);
        backup.containers().ensure_queue("orders");

        let queue = QueueProxy::new("orders", owner.clone());
        let partition = queue.partition_id();

        // ACT
        for i in 0..50 {
            assert!(queue.offer(data(&format!("item-{}", i))).await.unwrap());
        }
        assert!(queue.add_all(vec![data("x"), None, data("z")]).await.unwrap());
        for _ in 0..10 {
            queue.poll().await.unwrap();
        }
        assert_eq!(queue.size().await.unwrap(), 43);

        // ASSERT
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        let owner_state = owner
            .containers()
            .snapshot(partition, "orders", ReplicaRole::Owner)
            .unwrap();
        let backup_state = backup
            .containers()
            .snapshot(partition, "orders", ReplicaRole::Backup(1))
            .unwrap();
        assert_eq!(owner_state.len(), 43);
        assert_eq!(owner_state, backup_state);
        assert_eq!(owner.health().send_failure_count(), 0);
        assert_eq!(owner.health().delivered_count(), 50 + 1 + 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_replicates_and_empty_ops_do_not() {
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["node-b"]), transport.clone());
        let backup = node(standalone(), transport.clone());
        transport.register("node-b", &backup);
        backup.containers().ensure_queue("q");
        let queue = QueueProxy::new("q", owner.clone());

        // Nothing to mirror: empty poll, empty clear, reads
        assert_eq!(queue.poll().await.unwrap(), None);
        assert_eq!(queue.clear().await.unwrap(), 0);
        queue.peek().await.unwrap();
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(owner.health().delivered_count(), 0);

        queue.add_all(vec![data("a"), data("b")]).await.unwrap();
        assert_eq!(queue.clear().await.unwrap(), 2);

        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(owner.health().delivered_count(), 2);
        assert_eq!(
            backup
                .containers()
                .snapshot(queue.partition_id(), "q", ReplicaRole::Backup(1)),
            Some(vec![])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_replica_gets_its_own_role() {
        // ARRANGE: two backups
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["node-b", "node-c"]), transport.clone());
        let second = node(standalone(), transport.clone());
        let third = node(standalone(), transport.clone());
        transport.register("node-b", &second);
        transport.register("node-c", &third);
        second.containers().ensure_queue("q");
        third.containers().ensure_queue("q");

        // ACT
        let queue = QueueProxy::new("q", owner.clone());
        queue.offer(data("a")).await.unwrap();
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);

        // ASSERT
        let p = queue.partition_id();
        assert_eq!(
            second.containers().snapshot(p, "q", ReplicaRole::Backup(1)),
            Some(vec![data("a")])
        );
        assert_eq!(
            third.containers().snapshot(p, "q", ReplicaRole::Backup(2)),
            Some(vec![data("a")])
        );
        assert_eq!(owner.health().delivered_count(), 2);
    }

    // ============================================================
    // TEST 2: Partial failure
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_backups_do_not_affect_owner() {
        // ARRANGE
        let transport = Arc::new(FailingTransport::default());
        let owner = node(table_with_backups(&["node-b", "node-c"]), transport.clone());
        let queue = QueueProxy::new("q", owner.clone());

        // ACT
        assert!(queue.offer(data("a")).await.unwrap());
        assert!(queue.add_all(vec![data("b"), None]).await.unwrap());
        assert_eq!(queue.poll().await.unwrap(), Some(data("a")));

        // ASSERT: client results and owner state as if replication succeeded
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(
            owner
                .containers()
                .snapshot(queue.partition_id(), "q", ReplicaRole::Owner),
            Some(vec![data("b"), None])
        );

        // Three backups, two targets each
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 6);
        assert_eq!(owner.health().send_failure_count(), 6);
        assert_eq!(owner.health().failures_for(queue.partition_id(), 1), 3);
        assert_eq!(owner.health().failures_for(queue.partition_id(), 2), 3);

        let failures = owner.health().recent_failures();
        assert_eq!(failures.len(), 6);
        assert!(failures.iter().all(|f| f.kind == FailureKind::Send));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unreachable_local_member_is_recorded() {
        // Backup address never registered with the transport
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["nowhere"]), transport);
        let queue = QueueProxy::new("q", owner.clone());

        assert!(queue.offer(data("a")).await.unwrap());

        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(owner.health().send_failure_count(), 1);
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_replica_converges_without_declaring_queue() {
        // ARRANGE: the replica never declared the queue
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["node-b"]), transport.clone());
        let backup = node(standalone(), transport.clone());
        transport.register("node-b", &backup);
        let queue = QueueProxy::new("orders", owner.clone());

        // ACT
        let batch = vec![data("a"), data("b"), None, data("d")];
        assert!(queue.add_all(batch.clone()).await.unwrap());

        // ASSERT
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(owner.health().send_failure_count(), 0);
        assert_eq!(backup.health().apply_failure_count(), 0);
        assert!(backup.containers().has_queue("orders"));
        assert_eq!(
            backup
                .containers()
                .snapshot(queue.partition_id(), "orders", ReplicaRole::Backup(1)),
            Some(batch)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_backup_for_destroyed_queue_fails_on_replica() {
        // ARRANGE: the replica destroyed the queue
        let transport = LocalTransport::new();
        let owner = node(table_with_backups(&["node-b"]), transport.clone());
        let backup = node(standalone(), transport.clone());
        transport.register("node-b", &backup);
        backup.containers().ensure_queue("q");
        backup.containers().destroy_queue("q");
        let queue = QueueProxy::new("q", owner.clone());

        // ACT
        assert!(queue.offer(data("a")).await.unwrap());

        // ASSERT: both sides record the failure; the owner is unaffected
        assert!(owner.health().wait_idle(Duration::from_secs(5)).await);
        assert_eq!(owner.health().send_failure_count(), 1);
        assert_eq!(backup.health().apply_failure_count(), 1);
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    // ============================================================
    // TEST 3: Backup endpoint
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_backup_handler_applies_frame() {
        // ARRANGE
        let executor = node(standalone(), LocalTransport::new());
        executor.containers().ensure_queue("q");
        let frame = OperationRegistry::encode(&AddAllBackupOperation::new(
            "q",
            vec![data("a"), None],
        ));

        // ACT
        let (status, Json(ack)) = handle_backup(Extension(executor.clone()), Path((9, 1)), frame).await;

        // ASSERT
        assert_eq!(status, StatusCode::OK);
        assert!(ack.applied);
        assert_eq!(ack.partition, 9);
        assert_eq!(
            executor.containers().snapshot(9, "q", ReplicaRole::Backup(1)),
            Some(vec![data("a"), None])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_backup_handler_rejects_garbage() {
        let executor = node(standalone(), LocalTransport::new());

        let (status, Json(ack)) = handle_backup(
            Extension(executor),
            Path((0, 1)),
            Bytes::from_static(b"not a frame"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!ack.applied);
        assert!(ack.error.unwrap().contains("decode error"));
    }
}
