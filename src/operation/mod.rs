//! Operation Model
//!
//! An operation is one state mutation (or query) against a container, packaged so it
//! can be shipped to another member and replayed there.
//!
//! ## Capabilities
//! Every operation can:
//! 1. **Encode** its fields (`write_to`), common header first, subtype fields after.
//! 2. **Name its wire type** (`wire_type`) so a receiver can find the matching decoder
//!    in the [`OperationRegistry`].
//! 3. **Run** against the container its context resolves (`run`).
//! 4. Optionally **produce a backup** (`backup_operation`) after a successful run on
//!    the owner. Only types marked [`BackupOperation`] can be handed out as backups,
//!    and backups never produce further backups.
//!
//! ## Submodules
//! - **`registry`**: Wire-type id to decoder mapping and the framed wire format.

pub mod registry;

pub use registry::{OperationRegistry, WIRE_VERSION};

use crate::error::Result;
use crate::queue::container::QueueContainer;
use crate::queue::registry::ContainerRegistry;
use crate::queue::types::ReplicaRole;
use crate::serialization::{Data, ObjectDataInput, ObjectDataOutput};

use std::fmt;

/// A serializable unit of work bound to a container by name.
pub trait Operation: Send + fmt::Debug + 'static {
    /// Stable identifier used for decode-side dispatch. Never reused across types.
    fn wire_type(&self) -> i32;

    fn container_name(&self) -> &str;

    /// Writes the operation body (header, then subtype fields). The wire type is not
    /// part of the body; framing adds it.
    fn write_to(&self, out: &mut ObjectDataOutput);

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse>;

    /// The backup mirroring what `run` just did on the owner, if anything changed.
    fn backup_operation(&self, _response: &OperationResponse) -> Option<BoxedBackup> {
        None
    }
}

/// Implemented by operation types that know their wire type statically and can be
/// read back from a frame body.
pub trait OperationType: Operation + Sized {
    const WIRE_TYPE: i32;
    const NAME: &'static str;

    fn read_from(input: &mut ObjectDataInput) -> Result<Self>;
}

/// Marker for operations meant to run on a backup replica: they only mutate the
/// local container and never fan out further.
pub trait BackupOperation: Operation {}

/// A type-erased operation that is known to be a [`BackupOperation`].
#[derive(Debug)]
pub struct BoxedBackup(Box<dyn Operation>);

impl BoxedBackup {
    pub fn new<T: BackupOperation>(op: T) -> Self {
        Self(Box::new(op))
    }

    pub fn as_operation(&self) -> &dyn Operation {
        self.0.as_ref()
    }

    pub fn into_operation(self) -> Box<dyn Operation> {
        self.0
    }
}

/// What an operation returns to whoever submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResponse {
    /// Completed with nothing to report (backups, mostly).
    Done,
    /// Whether a mutation was admitted (offer / add_all against a bounded queue).
    Accepted(bool),
    /// An element read from the queue: `None` if the queue was empty, `Some(None)` if
    /// the element itself is null.
    Item(Option<Option<Data>>),
    /// A count: current size, or number of removed elements.
    Count(usize),
}

/// Where an operation runs: which partition, which replica, and the containers
/// available there.
pub struct OperationContext<'a> {
    partition_id: u32,
    role: ReplicaRole,
    containers: &'a ContainerRegistry,
}

impl<'a> OperationContext<'a> {
    pub fn new(partition_id: u32, role: ReplicaRole, containers: &'a ContainerRegistry) -> Self {
        Self {
            partition_id,
            role,
            containers,
        }
    }

    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    pub fn role(&self) -> ReplicaRole {
        self.role
    }

    /// Runs `f` against the container named `name` for this partition and role.
    pub fn with_container<R>(&self, name: &str, f: impl FnOnce(&mut QueueContainer) -> R) -> Result<R> {
        let container = self.containers.resolve(self.partition_id, name, self.role)?;
        let mut guard = container
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(f(&mut guard))
    }
}
