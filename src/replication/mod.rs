//! Backup Replication
//!
//! Moves backup operations from a partition's owner to its backup holders.
//!
//! ## Flow
//! 1. A primary operation succeeds on the owner's worker and returns a backup.
//! 2. The [`BackupReplicator`] encodes it once and queues the frame on one ordered
//!    link per backup holder.
//! 3. The [`ReplicaTransport`] delivers the frame; the receiving executor decodes it
//!    and runs it on the partition's worker of the `queue-backup` pool.
//!
//! Failures on either side are recorded by [`ReplicationHealth`]; the primary
//! operation's result is never affected.
//!
//! ## Submodules
//! - **`replicator`**: Per-target ordered fan-out.
//! - **`transport`**: Delivery seam (`LocalTransport`, `HttpTransport`).
//! - **`health`**: Lag and failure signals.
//! - **`protocol`** / **`handlers`**: HTTP endpoint for incoming backup frames.

pub mod handlers;
pub mod health;
pub mod protocol;
pub mod replicator;
pub mod transport;

pub use health::{FailureKind, ReplicationFailure, ReplicationHealth};
pub use replicator::BackupReplicator;
pub use transport::{HttpTransport, LocalTransport, ReplicaTransport, TransportFuture};

#[cfg(test)]
mod tests;
