use std::fmt;
use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::modules::constants::MAX_NAMESPACE_FIELDS;
use crate::modules::errors::CodecError;
use crate::modules::variable_bytes::{read_variable_bytes, write_variable_bytes};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// An ordered sequence of byte fields, used as a track namespace or a
/// namespace prefix. Serialized as a varint field count followed by that
/// many length-prefixed fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Tuple {
    fields: Vec<Bytes>,
}

impl Tuple {
    pub fn new(fields: Vec<Bytes>) -> Self {
        Self { fields }
    }

    /// Splits a `/`-separated path into UTF-8 fields: `"a/b/c"` becomes
    /// `["a", "b", "c"]`.
    pub fn from_utf8_path(path: &str) -> Self {
        let fields = path
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| Bytes::copy_from_slice(part.as_bytes()))
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[Bytes] {
        &self.fields
    }

    pub fn add(&mut self, field: Bytes) {
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether `self` is a prefix of `other`, field by field.
    pub fn is_prefix_of(&self, other: &Tuple) -> bool {
        self.fields.len() <= other.fields.len()
            && self.fields.iter().zip(other.fields.iter()).all(|(a, b)| a == b)
    }

    pub(crate) fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let count = read_variable_integer(cur)? as usize;
        if count > MAX_NAMESPACE_FIELDS {
            return Err(CodecError::LengthExceedsMax {
                field: "namespace tuple",
                len: count,
                max: MAX_NAMESPACE_FIELDS,
            });
        }
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            fields.push(read_variable_bytes(cur)?);
        }
        Ok(Self { fields })
    }

    pub(crate) fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.fields.len() as u64));
        for field in &self.fields {
            buf.extend(write_variable_bytes(field));
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", String::from_utf8_lossy(field))?;
        }
        Ok(())
    }
}
