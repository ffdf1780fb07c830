//! Partition Operation Executor Module
//!
//! Schedules operations onto named worker pools so that everything touching one
//! partition runs on one worker, in submission order, while different partitions run
//! concurrently.
//!
//! ## Architecture Overview
//! 1. **Submission**: A caller submits an operation under a policy name (`"queue"`,
//!    `"queue-backup"`, ...) with the partition it is bound to. Submission never runs
//!    the operation inline and never blocks: it either enqueues or rejects.
//! 2. **Routing**: The policy's pool picks the worker slot `partition_id % worker_count`.
//! 3. **Execution**: The worker runs the operation against the container for its
//!    partition and role. Parallel and Queued pools run it on the async runtime;
//!    BlockingParallel pools hand it to the blocking thread pool.
//! 4. **Replication**: A successful primary operation's backup is handed to the
//!    replicator from the worker, before the submitter is told about the result.
//!
//! ## Submodules
//! - **`executor`**: `PartitionOperationExecutor`, the primary and backup entry points.
//! - **`pool`**: Worker slots, routing, capacity and keep-alive.
//! - **`handle`**: Completion handles with cancellation.

pub mod executor;
pub mod handle;
pub mod pool;

pub use executor::{PartitionOperationExecutor, QUEUE_BACKUP_POLICY, QUEUE_POLICY};
pub use handle::OperationHandle;
pub use pool::PoolStats;
