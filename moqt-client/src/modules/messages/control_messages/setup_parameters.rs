use bytes::Bytes;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;

const PATH: u64 = 0x1;
const MAX_REQUEST_ID: u64 = 0x2;
const MAX_AUTH_TOKEN_CACHE_SIZE: u64 = 0x4;

/// Typed view over the key-value pairs carried by CLIENT_SETUP and
/// SERVER_SETUP. Unknown parameters are preserved as raw pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupParameter {
    Path(String),
    MaxRequestId(u64),
    MaxAuthTokenCacheSize(u64),
    Unknown(KeyValuePair),
}

impl SetupParameter {
    pub fn try_from_pair(pair: KeyValuePair) -> Result<Self, CodecError> {
        match pair.key() {
            PATH => {
                let bytes = pair
                    .as_bytes()
                    .ok_or(CodecError::KeyValueFormatting { key: PATH })?;
                let path = String::from_utf8(bytes.to_vec())
                    .map_err(|_| CodecError::InvalidUtf8("path parameter"))?;
                Ok(Self::Path(path))
            }
            MAX_REQUEST_ID => {
                let value = pair
                    .as_varint()
                    .ok_or(CodecError::KeyValueFormatting { key: MAX_REQUEST_ID })?;
                Ok(Self::MaxRequestId(value))
            }
            MAX_AUTH_TOKEN_CACHE_SIZE => {
                let value = pair.as_varint().ok_or(CodecError::KeyValueFormatting {
                    key: MAX_AUTH_TOKEN_CACHE_SIZE,
                })?;
                Ok(Self::MaxAuthTokenCacheSize(value))
            }
            _ => Ok(Self::Unknown(pair)),
        }
    }

    pub fn to_pair(&self) -> KeyValuePair {
        match self {
            Self::Path(path) => {
                KeyValuePair::try_new_bytes(PATH, Bytes::copy_from_slice(path.as_bytes()))
                    .expect("PATH is an odd type code")
            }
            Self::MaxRequestId(value) => KeyValuePair::try_new_varint(MAX_REQUEST_ID, *value)
                .expect("MAX_REQUEST_ID is an even type code"),
            Self::MaxAuthTokenCacheSize(value) => {
                KeyValuePair::try_new_varint(MAX_AUTH_TOKEN_CACHE_SIZE, *value)
                    .expect("MAX_AUTH_TOKEN_CACHE_SIZE is an even type code")
            }
            Self::Unknown(pair) => pair.clone(),
        }
    }
}
