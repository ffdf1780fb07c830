//! Binary Serialization Module
//!
//! The byte-level layer every cluster message is built on.
//!
//! ## Wire Conventions
//! - **Integers**: fixed-width signed 32-bit, big-endian.
//! - **Strings**: `int32` byte length followed by UTF-8 bytes.
//! - **Data**: `int32` byte length followed by the opaque payload.
//! - **Nullable data**: a presence byte (`0` or `1`), then the data if present.
//!
//! ## Submodules
//! - **`data`**: The opaque `Data` payload type.
//! - **`codec`**: `ObjectDataOutput` / `ObjectDataInput` stream helpers.

pub mod codec;
pub mod data;

pub use codec::{ObjectDataInput, ObjectDataOutput};
pub use data::Data;

#[cfg(test)]
mod tests;
