use super::data::Data;
use crate::error::{ClusterError, Result};

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Append-only binary writer.
///
/// Writes never fail; all length fields are checked against `i32::MAX` so a frame is
/// always decodable by a peer reading signed 32-bit lengths.
#[derive(Debug, Default)]
pub struct ObjectDataOutput {
    buf: BytesMut,
}

impl ObjectDataOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_utf(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.put_slice(value.as_bytes());
    }

    pub fn write_data(&mut self, data: &Data) {
        self.write_len(data.len());
        self.buf.put_slice(data.as_bytes());
    }

    pub fn write_nullable_data(&mut self, data: Option<&Data>) {
        match data {
            Some(data) => {
                self.write_bool(true);
                self.write_data(data);
            }
            None => self.write_bool(false),
        }
    }

    /// Writes a collection length. Collections are bounded by the signed 32-bit wire
    /// format; a longer one is a programming error, not a runtime condition.
    pub fn write_len(&mut self, len: usize) {
        let len = i32::try_from(len).unwrap_or_else(|_| panic!("length {len} exceeds i32::MAX"));
        self.buf.put_i32(len);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Bounds-checked binary reader over a received frame.
///
/// Every read checks the remaining length first; a short buffer yields
/// [`ClusterError::Decode`] instead of a panic.
#[derive(Debug)]
pub struct ObjectDataInput {
    buf: Bytes,
}

impl ObjectDataInput {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    fn require(&self, needed: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(ClusterError::decode(format!(
                "truncated {}: need {} bytes, {} left",
                what,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1, "byte")?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ClusterError::decode(format!("invalid presence flag {}", other))),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.require(4, "int32")?;
        Ok(self.buf.get_i32())
    }

    /// Reads a non-negative 32-bit length or element count.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| ClusterError::decode(format!("negative length {}", len)))
    }

    pub fn read_utf(&mut self) -> Result<String> {
        let len = self.read_len()?;
        self.require(len, "string")?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|e| ClusterError::decode(format!("invalid UTF-8: {}", e)))
    }

    pub fn read_data(&mut self) -> Result<Data> {
        let len = self.read_len()?;
        self.require(len, "data payload")?;
        Ok(Data::new(self.buf.split_to(len)))
    }

    pub fn read_nullable_data(&mut self) -> Result<Option<Data>> {
        if self.read_bool()? {
            Ok(Some(self.read_data()?))
        } else {
            Ok(None)
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Fails if anything is left unread; a frame must be consumed exactly.
    pub fn ensure_consumed(&self) -> Result<()> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(ClusterError::decode(format!("{} trailing bytes after frame", n))),
        }
    }
}
