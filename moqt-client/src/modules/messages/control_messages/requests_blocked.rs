use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Sent when the endpoint would allocate a request id past the granted
/// ceiling; carries the ceiling it is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestsBlocked {
    pub maximum_request_id: u64,
}

impl RequestsBlocked {
    pub fn new(maximum_request_id: u64) -> Self {
        Self { maximum_request_id }
    }
}

impl MOQTPayload for RequestsBlocked {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let maximum_request_id = read_variable_integer(cur)?;
        Ok(Self { maximum_request_id })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.maximum_request_id));
    }
}
