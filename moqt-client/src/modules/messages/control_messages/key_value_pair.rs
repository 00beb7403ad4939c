use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::modules::constants::MAX_KEY_VALUE_BYTES_LENGTH;
use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_bytes::{read_variable_bytes, write_variable_bytes};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Value of a typed key-value pair. An even type code carries a varint, an
/// odd type code carries a length-prefixed byte blob of at most 65535 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairValue {
    Varint(u64),
    Bytes(Bytes),
}

/// Typed extension parameter used by setup parameters, request parameters
/// and object extension headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    key: u64,
    value: PairValue,
}

impl KeyValuePair {
    pub fn try_new_varint(key: u64, value: u64) -> Result<Self, CodecError> {
        if key % 2 != 0 {
            return Err(CodecError::KeyValueFormatting { key });
        }
        Ok(Self {
            key,
            value: PairValue::Varint(value),
        })
    }

    pub fn try_new_bytes(key: u64, value: Bytes) -> Result<Self, CodecError> {
        if key % 2 == 0 {
            return Err(CodecError::KeyValueFormatting { key });
        }
        if value.len() > MAX_KEY_VALUE_BYTES_LENGTH {
            return Err(CodecError::LengthExceedsMax {
                field: "key-value pair value",
                len: value.len(),
                max: MAX_KEY_VALUE_BYTES_LENGTH,
            });
        }
        Ok(Self {
            key,
            value: PairValue::Bytes(value),
        })
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn value(&self) -> &PairValue {
        &self.value
    }

    pub fn as_varint(&self) -> Option<u64> {
        match self.value {
            PairValue::Varint(v) => Some(v),
            PairValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.value {
            PairValue::Varint(_) => None,
            PairValue::Bytes(b) => Some(b),
        }
    }
}

impl MOQTPayload for KeyValuePair {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let key = read_variable_integer(cur)?;
        if key % 2 == 0 {
            let value = read_variable_integer(cur)?;
            Ok(Self {
                key,
                value: PairValue::Varint(value),
            })
        } else {
            let value = read_variable_bytes(cur)?;
            if value.len() > MAX_KEY_VALUE_BYTES_LENGTH {
                return Err(CodecError::LengthExceedsMax {
                    field: "key-value pair value",
                    len: value.len(),
                    max: MAX_KEY_VALUE_BYTES_LENGTH,
                });
            }
            Ok(Self {
                key,
                value: PairValue::Bytes(value),
            })
        }
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.key));
        match &self.value {
            PairValue::Varint(value) => buf.extend(write_variable_integer(*value)),
            PairValue::Bytes(value) => buf.extend(write_variable_bytes(value)),
        }
    }
}
