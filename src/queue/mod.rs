//! Partitioned Queue Module
//!
//! A named FIFO queue whose elements live in one container per (partition, replica).
//! The owner container takes client operations; each backup replica holds a container
//! that only backup operations touch.
//!
//! ## Submodules
//! - **`types`**: Replica roles, container keys and queue descriptors.
//! - **`container`**: The ordered element sequence and its mutations.
//! - **`registry`**: Resolves (partition, name, role) to a container on this member.
//! - **`operations`**: Primary and backup queue operations with their wire encoding.
//! - **`proxy`**: Client-side handle submitting operations through the executor.
//! - **`protocol`** / **`handlers`**: JSON HTTP endpoints over the proxy.

pub mod container;
pub mod handlers;
pub mod operations;
pub mod protocol;
pub mod proxy;
pub mod registry;
pub mod types;

pub use container::{QueueContainer, QueueItem};
pub use operations::register_queue_operations;
pub use proxy::QueueProxy;
pub use registry::{ContainerRef, ContainerRegistry};
pub use types::{ContainerKey, QueueDescriptor, ReplicaRole};
