use bytes::Bytes;
use std::fmt;

/// One serialized element, as the cluster sees it: an opaque run of bytes.
///
/// Cloning is cheap (reference counted), so the same `Data` can sit in an owner
/// container and in the backup operation replicating it without copying.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Data(Bytes);

impl Data {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if text.len() <= 32 => write!(f, "Data({:?})", text),
            _ => write!(f, "Data({} bytes)", self.0.len()),
        }
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}
