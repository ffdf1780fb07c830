//! Operation Type Registry
//!
//! Maps wire-type ids to decoder functions, so a received frame can be turned back
//! into a concrete operation without knowing its type up front.
//!
//! ## Frame Layout
//! ```text
//! byte   wire version (WIRE_VERSION)
//! int32  wire type id
//! ...    operation body (header, then subtype fields)
//! ```

use super::{BackupOperation, Operation, OperationType};
use crate::error::{ClusterError, Result};
use crate::serialization::{ObjectDataInput, ObjectDataOutput};

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// Current frame version. Bumped only when the framing itself changes.
pub const WIRE_VERSION: u8 = 1;

/// Type-erased decoder for one operation type.
pub type OperationDecoder =
    Arc<dyn Fn(&mut ObjectDataInput) -> Result<Box<dyn Operation>> + Send + Sync>;

struct Registration {
    name: &'static str,
    backup: bool,
    decoder: OperationDecoder,
}

/// Registry of every operation type this member can decode.
pub struct OperationRegistry {
    types: DashMap<i32, Registration>,
}

impl OperationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a primary-side operation type.
    pub fn register<T: OperationType>(&self) {
        self.insert::<T>(false);
    }

    /// Registers a backup operation type. Only these are accepted by
    /// [`decode_backup`](Self::decode_backup).
    pub fn register_backup<T: OperationType + BackupOperation>(&self) {
        self.insert::<T>(true);
    }

    fn insert<T: OperationType>(&self, backup: bool) {
        let decoder: OperationDecoder = Arc::new(|input: &mut ObjectDataInput| {
            T::read_from(input).map(|op| Box::new(op) as Box<dyn Operation>)
        });

        if let Some(previous) = self.types.insert(
            T::WIRE_TYPE,
            Registration {
                name: T::NAME,
                backup,
                decoder,
            },
        ) {
            tracing::warn!(
                "Wire type {} re-registered: {} replaces {}",
                T::WIRE_TYPE,
                T::NAME,
                previous.name
            );
        }

        tracing::info!("Registered operation type {} ({})", T::NAME, T::WIRE_TYPE);
    }

    /// Encodes an operation into a complete frame.
    pub fn encode(op: &dyn Operation) -> Bytes {
        let mut out = ObjectDataOutput::with_capacity(64);
        out.write_u8(WIRE_VERSION);
        out.write_i32(op.wire_type());
        op.write_to(&mut out);
        out.into_bytes()
    }

    /// Decodes a frame into an operation. The frame must be consumed exactly.
    pub fn decode(&self, frame: impl Into<Bytes>) -> Result<Box<dyn Operation>> {
        self.decode_frame(frame.into(), false)
    }

    /// Like [`decode`](Self::decode), but also rejects frames whose type is not a
    /// registered backup operation.
    pub fn decode_backup(&self, frame: impl Into<Bytes>) -> Result<Box<dyn Operation>> {
        self.decode_frame(frame.into(), true)
    }

    fn decode_frame(&self, frame: Bytes, require_backup: bool) -> Result<Box<dyn Operation>> {
        let mut input = ObjectDataInput::new(frame);

        let version = input.read_u8()?;
        if version != WIRE_VERSION {
            return Err(ClusterError::decode(format!(
                "unsupported wire version {} (expected {})",
                version, WIRE_VERSION
            )));
        }

        let wire_type = input.read_i32()?;
        // Clone the decoder out so no map shard lock is held while decoding.
        let (name, backup, decoder) = match self.types.get(&wire_type) {
            Some(entry) => (entry.name, entry.backup, entry.decoder.clone()),
            None => {
                return Err(ClusterError::decode(format!(
                    "unknown operation wire type {}",
                    wire_type
                )))
            }
        };

        if require_backup && !backup {
            return Err(ClusterError::decode(format!(
                "{} ({}) is not a backup operation",
                name, wire_type
            )));
        }

        let op = decoder(&mut input).map_err(|e| match e {
            ClusterError::Decode(reason) => ClusterError::decode(format!("{}: {}", name, reason)),
            other => other,
        })?;
        input.ensure_consumed()?;

        tracing::trace!("Decoded {} for container '{}'", name, op.container_name());
        Ok(op)
    }

    pub fn list_types(&self) -> Vec<(i32, &'static str)> {
        let mut types: Vec<(i32, &'static str)> = self
            .types
            .iter()
            .map(|entry| (*entry.key(), entry.value().name))
            .collect();
        types.sort();
        types
    }

    pub fn has_type(&self, wire_type: i32) -> bool {
        self.types.contains_key(&wire_type)
    }

    pub fn is_backup_type(&self, wire_type: i32) -> bool {
        self.types
            .get(&wire_type)
            .map(|entry| entry.backup)
            .unwrap_or(false)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self {
            types: DashMap::new(),
        }
    }
}
