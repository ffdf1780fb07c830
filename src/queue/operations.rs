//! Queue Operations
//!
//! The primary and backup operations of the distributed queue. Every operation starts
//! with the [`QueueOperation`] header (the queue name); subtype fields follow in the
//! order listed on each type.
//!
//! | id | operation      | backup of    |
//! |----|----------------|--------------|
//! | 1  | Offer          |              |
//! | 2  | OfferBackup    | Offer        |
//! | 3  | AddAll         |              |
//! | 4  | AddAllBackup   | AddAll       |
//! | 5  | Poll           |              |
//! | 6  | PollBackup     | Poll         |
//! | 7  | Clear          |              |
//! | 8  | ClearBackup    | Clear        |
//! | 9  | Size           |              |
//! | 10 | Peek           |              |

use super::container::QueueItem;
use crate::error::{ClusterError, Result};
use crate::operation::{
    BackupOperation, BoxedBackup, Operation, OperationContext, OperationRegistry, OperationResponse,
    OperationType,
};
use crate::serialization::{ObjectDataInput, ObjectDataOutput};

pub const OFFER: i32 = 1;
pub const OFFER_BACKUP: i32 = 2;
pub const ADD_ALL: i32 = 3;
pub const ADD_ALL_BACKUP: i32 = 4;
pub const POLL: i32 = 5;
pub const POLL_BACKUP: i32 = 6;
pub const CLEAR: i32 = 7;
pub const CLEAR_BACKUP: i32 = 8;
pub const SIZE: i32 = 9;
pub const PEEK: i32 = 10;

/// Registers every queue operation with a type registry.
pub fn register_queue_operations(registry: &OperationRegistry) {
    registry.register::<OfferOperation>();
    registry.register_backup::<OfferBackupOperation>();
    registry.register::<AddAllOperation>();
    registry.register_backup::<AddAllBackupOperation>();
    registry.register::<PollOperation>();
    registry.register_backup::<PollBackupOperation>();
    registry.register::<ClearOperation>();
    registry.register_backup::<ClearBackupOperation>();
    registry.register::<SizeOperation>();
    registry.register::<PeekOperation>();
}

/// Common header of all queue operations: the target queue name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOperation {
    name: String,
}

impl QueueOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_internal(&self, out: &mut ObjectDataOutput) {
        out.write_utf(&self.name);
    }

    pub fn read_internal(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            name: input.read_utf()?,
        })
    }
}

fn write_items(out: &mut ObjectDataOutput, items: &[QueueItem]) {
    out.write_len(items.len());
    for item in items {
        out.write_nullable_data(item.as_ref());
    }
}

/// Reads a counted batch. Fails (and yields nothing) unless all `count` entries read.
fn read_items(input: &mut ObjectDataInput) -> Result<Vec<QueueItem>> {
    let count = input.read_len()?;
    // Each entry is at least one byte; don't trust the count for preallocation.
    let mut items = Vec::with_capacity(count.min(input.remaining()));
    for index in 0..count {
        let item = input.read_nullable_data().map_err(|e| match e {
            ClusterError::Decode(reason) => {
                ClusterError::decode(format!("element {} of {}: {}", index, count, reason))
            }
            other => other,
        })?;
        items.push(item);
    }
    Ok(items)
}

// ============================================================
// OFFER
// ============================================================

/// Appends one element. Fields: nullable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOperation {
    base: QueueOperation,
    item: QueueItem,
}

impl OfferOperation {
    pub fn new(name: impl Into<String>, item: QueueItem) -> Self {
        Self {
            base: QueueOperation::new(name),
            item,
        }
    }
}

impl Operation for OfferOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
        out.write_nullable_data(self.item.as_ref());
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let accepted = ctx.with_container(self.base.name(), |c| c.offer(self.item.clone()))?;
        Ok(OperationResponse::Accepted(accepted))
    }

    fn backup_operation(&self, response: &OperationResponse) -> Option<BoxedBackup> {
        match response {
            OperationResponse::Accepted(true) => Some(BoxedBackup::new(OfferBackupOperation {
                base: self.base.clone(),
                item: self.item.clone(),
            })),
            _ => None,
        }
    }
}

impl OperationType for OfferOperation {
    const WIRE_TYPE: i32 = OFFER;
    const NAME: &'static str = "Offer";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        let base = QueueOperation::read_internal(input)?;
        let item = input.read_nullable_data()?;
        Ok(Self { base, item })
    }
}

/// Backup of [`OfferOperation`]. Fields: nullable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferBackupOperation {
    base: QueueOperation,
    item: QueueItem,
}

impl OfferBackupOperation {
    pub fn new(name: impl Into<String>, item: QueueItem) -> Self {
        Self {
            base: QueueOperation::new(name),
            item,
        }
    }
}

impl Operation for OfferBackupOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
        out.write_nullable_data(self.item.as_ref());
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        ctx.with_container(self.base.name(), |c| c.offer_backup(self.item.clone()))?;
        Ok(OperationResponse::Done)
    }
}

impl OperationType for OfferBackupOperation {
    const WIRE_TYPE: i32 = OFFER_BACKUP;
    const NAME: &'static str = "OfferBackup";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        let base = QueueOperation::read_internal(input)?;
        let item = input.read_nullable_data()?;
        Ok(Self { base, item })
    }
}

impl BackupOperation for OfferBackupOperation {}

// ============================================================
// ADD ALL
// ============================================================

/// Appends a batch, all or nothing. Fields: int32 count, nullable data × count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAllOperation {
    base: QueueOperation,
    items: Vec<QueueItem>,
}

impl AddAllOperation {
    pub fn new(name: impl Into<String>, items: Vec<QueueItem>) -> Self {
        Self {
            base: QueueOperation::new(name),
            items,
        }
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }
}

impl Operation for AddAllOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
        write_items(out, &self.items);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let accepted = ctx.with_container(self.base.name(), |c| c.add_all(&self.items))?;
        Ok(OperationResponse::Accepted(accepted))
    }

    fn backup_operation(&self, response: &OperationResponse) -> Option<BoxedBackup> {
        match response {
            OperationResponse::Accepted(true) if !self.items.is_empty() => {
                Some(BoxedBackup::new(AddAllBackupOperation {
                    base: self.base.clone(),
                    items: self.items.clone(),
                }))
            }
            _ => None,
        }
    }
}

impl OperationType for AddAllOperation {
    const WIRE_TYPE: i32 = ADD_ALL;
    const NAME: &'static str = "AddAll";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        let base = QueueOperation::read_internal(input)?;
        let items = read_items(input)?;
        Ok(Self { base, items })
    }
}

/// Replays a batch-add on a backup container, in order, nulls included.
/// Fields: int32 count, nullable data × count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAllBackupOperation {
    base: QueueOperation,
    items: Vec<QueueItem>,
}

impl AddAllBackupOperation {
    pub fn new(name: impl Into<String>, items: Vec<QueueItem>) -> Self {
        Self {
            base: QueueOperation::new(name),
            items,
        }
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }
}

impl Operation for AddAllBackupOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
        write_items(out, &self.items);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        ctx.with_container(self.base.name(), |c| c.add_all_backup(&self.items))?;
        Ok(OperationResponse::Done)
    }
}

impl OperationType for AddAllBackupOperation {
    const WIRE_TYPE: i32 = ADD_ALL_BACKUP;
    const NAME: &'static str = "AddAllBackup";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        let base = QueueOperation::read_internal(input)?;
        let items = read_items(input)?;
        Ok(Self { base, items })
    }
}

impl BackupOperation for AddAllBackupOperation {}

// ============================================================
// POLL
// ============================================================

/// Removes and returns the head element. No subtype fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOperation {
    base: QueueOperation,
}

impl PollOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for PollOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let item = ctx.with_container(self.base.name(), |c| c.poll())?;
        Ok(OperationResponse::Item(item))
    }

    fn backup_operation(&self, response: &OperationResponse) -> Option<BoxedBackup> {
        match response {
            OperationResponse::Item(Some(_)) => Some(BoxedBackup::new(PollBackupOperation {
                base: self.base.clone(),
            })),
            _ => None,
        }
    }
}

impl OperationType for PollOperation {
    const WIRE_TYPE: i32 = POLL;
    const NAME: &'static str = "Poll";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}

/// Backup of [`PollOperation`]: drops the head of the backup copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollBackupOperation {
    base: QueueOperation,
}

impl PollBackupOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for PollBackupOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        ctx.with_container(self.base.name(), |c| c.poll_backup())?;
        Ok(OperationResponse::Done)
    }
}

impl OperationType for PollBackupOperation {
    const WIRE_TYPE: i32 = POLL_BACKUP;
    const NAME: &'static str = "PollBackup";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}

impl BackupOperation for PollBackupOperation {}

// ============================================================
// CLEAR
// ============================================================

/// Removes every element, returning how many were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOperation {
    base: QueueOperation,
}

impl ClearOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for ClearOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let removed = ctx.with_container(self.base.name(), |c| c.clear())?;
        Ok(OperationResponse::Count(removed))
    }

    fn backup_operation(&self, response: &OperationResponse) -> Option<BoxedBackup> {
        match response {
            OperationResponse::Count(removed) if *removed > 0 => {
                Some(BoxedBackup::new(ClearBackupOperation {
                    base: self.base.clone(),
                }))
            }
            _ => None,
        }
    }
}

impl OperationType for ClearOperation {
    const WIRE_TYPE: i32 = CLEAR;
    const NAME: &'static str = "Clear";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearBackupOperation {
    base: QueueOperation,
}

impl ClearBackupOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for ClearBackupOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        ctx.with_container(self.base.name(), |c| c.clear())?;
        Ok(OperationResponse::Done)
    }
}

impl OperationType for ClearBackupOperation {
    const WIRE_TYPE: i32 = CLEAR_BACKUP;
    const NAME: &'static str = "ClearBackup";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}

impl BackupOperation for ClearBackupOperation {}

// ============================================================
// READ-ONLY
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeOperation {
    base: QueueOperation,
}

impl SizeOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for SizeOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let size = ctx.with_container(self.base.name(), |c| c.size())?;
        Ok(OperationResponse::Count(size))
    }
}

impl OperationType for SizeOperation {
    const WIRE_TYPE: i32 = SIZE;
    const NAME: &'static str = "Size";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekOperation {
    base: QueueOperation,
}

impl PeekOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: QueueOperation::new(name),
        }
    }
}

impl Operation for PeekOperation {
    fn wire_type(&self) -> i32 {
        Self::WIRE_TYPE
    }

    fn container_name(&self) -> &str {
        self.base.name()
    }

    fn write_to(&self, out: &mut ObjectDataOutput) {
        self.base.write_internal(out);
    }

    fn run(&self, ctx: &OperationContext<'_>) -> Result<OperationResponse> {
        let item = ctx.with_container(self.base.name(), |c| c.peek().cloned())?;
        Ok(OperationResponse::Item(item))
    }
}

impl OperationType for PeekOperation {
    const WIRE_TYPE: i32 = PEEK;
    const NAME: &'static str = "Peek";

    fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        Ok(Self {
            base: QueueOperation::read_internal(input)?,
        })
    }
}
