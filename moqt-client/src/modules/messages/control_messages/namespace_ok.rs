use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Shared payload of PUBLISH_NAMESPACE_OK and SUBSCRIBE_ANNOUNCES_OK:
/// nothing but the request id being acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceOk {
    pub request_id: u64,
}

impl NamespaceOk {
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl MOQTPayload for NamespaceOk {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        Ok(Self { request_id })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
    }
}
