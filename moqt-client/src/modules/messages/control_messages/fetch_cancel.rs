use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCancel {
    pub request_id: u64,
}

impl FetchCancel {
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl MOQTPayload for FetchCancel {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        Ok(Self { request_id })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
    }
}
