//! Partition Module Tests
//!
//! ## Test Scopes
//! - **Placement**: Stable, well-spread name hashing.
//! - **Backups**: Replica order and the backup count limit.

#[cfg(test)]
mod tests {
    use crate::partition::partitioner::stable_hash;
    use crate::partition::{PartitionTable, StaticPartitionTable, DEFAULT_PARTITION_COUNT};

    // ============================================================
    // TEST 1: Key placement
    // ============================================================

    #[test]
    fn test_partition_deterministic() {
        let table = StaticPartitionTable::standalone(DEFAULT_PARTITION_COUNT);

        let p1 = table.partition_for("orders");
        let p2 = table.partition_for("orders");
        assert_eq!(p1, p2);
        assert!(p1 < DEFAULT_PARTITION_COUNT);
    }

    #[test]
    fn test_partition_hash_is_stable() {
        // FNV-1a reference values; a change here would move queues between partitions
        assert_eq!(stable_hash(""), 0x811c_9dc5);
        assert_eq!(stable_hash("a"), 0xe40c_292c);
    }

    #[test]
    fn test_partition_distribution() {
        let table = StaticPartitionTable::standalone(256);
        let mut used = std::collections::HashSet::new();

        for i in 0..10_000 {
            used.insert(table.partition_for(&format!("queue_{}", i)));
        }

        assert!(used.len() > 200, "only {} partitions used", used.len());
    }

    // ============================================================
    // TEST 2: Backup targets
    // ============================================================

    #[test]
    fn test_backup_targets_in_replica_order() {
        let table = StaticPartitionTable::new(
            16,
            vec!["10.0.0.2:6000".to_string(), "10.0.0.3:6000".to_string()],
        );

        let targets = table.backup_targets(5);

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].replica_index, 1);
        assert_eq!(targets[0].address, "10.0.0.2:6000");
        assert_eq!(targets[1].replica_index, 2);
    }

    #[test]
    fn test_backup_count_limits_targets() {
        let table = StaticPartitionTable::new(16, vec!["a".to_string(), "b".to_string()])
            .with_backup_count(1);

        assert_eq!(table.backup_targets(0).len(), 1);
        assert!(StaticPartitionTable::standalone(16).backup_targets(0).is_empty());
    }
}
