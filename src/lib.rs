//! Partitioned Queue Cluster Library
//!
//! Core modules of a partitioned, replicated in-memory queue. The binary
//! (`main.rs`) wires them into a node serving HTTP.
//!
//! ## Architecture Modules
//! - **`serialization`**: Big-endian binary codec and the `Data` payload type.
//! - **`config`**: Executor pool policies (validating builder, wire form, JSON file).
//! - **`operation`**: The operation model and the wire-type registry used to decode
//!   frames received from other members.
//! - **`queue`**: Queue containers, the primary/backup queue operations and the client
//!   proxy.
//! - **`executor`**: Partition-affine worker pools that run operations in per-partition
//!   order.
//! - **`partition`**: Name-to-partition hashing and backup placement.
//! - **`replication`**: Ordered delivery of backup operations to replicas and their
//!   health signals.

pub mod config;
pub mod error;
pub mod executor;
pub mod operation;
pub mod partition;
pub mod queue;
pub mod replication;
pub mod serialization;
