//! Partition Table Module
//!
//! Answers two questions for the executor: which partition a queue name lives in, and
//! which members hold backups of a partition. Ownership assignment and promotion are
//! decided elsewhere; this module only exposes the answer through [`PartitionTable`].

pub mod partitioner;

pub use partitioner::{PartitionTable, ReplicaTarget, StaticPartitionTable, DEFAULT_PARTITION_COUNT};

#[cfg(test)]
mod tests;
