use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::tuple::Tuple;
use crate::modules::variable_bytes::{read_reason_phrase, validate_reason_phrase, write_reason_phrase};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Sent by the subscriber side to cancel a namespace it was previously told
/// about.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishNamespaceCancel {
    pub track_namespace: Tuple,
    pub error_code: u64,
    pub reason_phrase: String,
}

impl PublishNamespaceCancel {
    pub fn try_new(
        track_namespace: Tuple,
        error_code: u64,
        reason_phrase: String,
    ) -> Result<Self, CodecError> {
        validate_reason_phrase(&reason_phrase)?;
        Ok(Self {
            track_namespace,
            error_code,
            reason_phrase,
        })
    }
}

impl MOQTPayload for PublishNamespaceCancel {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let track_namespace = Tuple::depacketize(cur)?;
        let error_code = read_variable_integer(cur)?;
        let reason_phrase = read_reason_phrase(cur)?;
        Ok(Self {
            track_namespace,
            error_code,
            reason_phrase,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        self.track_namespace.packetize(buf);
        buf.extend(write_variable_integer(self.error_code));
        buf.extend(write_reason_phrase(&self.reason_phrase));
    }
}
