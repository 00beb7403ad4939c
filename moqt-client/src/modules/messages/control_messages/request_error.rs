use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_bytes::{read_reason_phrase, validate_reason_phrase, write_reason_phrase};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Shared payload of FETCH_ERROR, PUBLISH_NAMESPACE_ERROR and
/// SUBSCRIBE_ANNOUNCES_ERROR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub request_id: u64,
    pub error_code: u64,
    pub reason_phrase: String,
}

impl RequestError {
    pub fn try_new(
        request_id: u64,
        error_code: u64,
        reason_phrase: String,
    ) -> Result<Self, CodecError> {
        validate_reason_phrase(&reason_phrase)?;
        Ok(Self {
            request_id,
            error_code,
            reason_phrase,
        })
    }
}

impl MOQTPayload for RequestError {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let error_code = read_variable_integer(cur)?;
        let reason_phrase = read_reason_phrase(cur)?;
        Ok(Self {
            request_id,
            error_code,
            reason_phrase,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.error_code));
        buf.extend(write_reason_phrase(&self.reason_phrase));
    }
}
