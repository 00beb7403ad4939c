use std::io::Cursor;

use bytes::BytesMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_bytes::{read_reason_phrase, validate_reason_phrase, write_reason_phrase};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Status codes carried by SUBSCRIBE_DONE.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum SubscribeDoneCode {
    InternalError = 0x0,
    Unauthorized = 0x1,
    TrackEnded = 0x2,
    SubscriptionEnded = 0x3,
    GoingAway = 0x4,
    Expired = 0x5,
    TooFarBehind = 0x6,
}

/// Announces that a subscription has finished; `stream_count` tells the
/// subscriber how many data streams to expect in total before cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeDone {
    pub request_id: u64,
    pub status_code: u64,
    pub stream_count: u64,
    pub reason_phrase: String,
}

impl SubscribeDone {
    pub fn try_new(
        request_id: u64,
        status_code: SubscribeDoneCode,
        stream_count: u64,
        reason_phrase: String,
    ) -> Result<Self, CodecError> {
        validate_reason_phrase(&reason_phrase)?;
        Ok(Self {
            request_id,
            status_code: status_code.into(),
            stream_count,
            reason_phrase,
        })
    }
}

impl MOQTPayload for SubscribeDone {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let status_code = read_variable_integer(cur)?;
        let stream_count = read_variable_integer(cur)?;
        let reason_phrase = read_reason_phrase(cur)?;
        Ok(Self {
            request_id,
            status_code,
            stream_count,
            reason_phrase,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.status_code));
        buf.extend(write_variable_integer(self.stream_count));
        buf.extend(write_reason_phrase(&self.reason_phrase));
    }
}
