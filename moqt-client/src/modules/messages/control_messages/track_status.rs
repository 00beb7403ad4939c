use std::io::Cursor;

use bytes::BytesMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum TrackStatusCode {
    InProgress = 0x0,
    DoesNotExist = 0x1,
    NotYetBegun = 0x2,
    Finished = 0x3,
    RelayUnavailable = 0x4,
}

/// Answers a TRACK_STATUS_REQUEST.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatus {
    pub request_id: u64,
    pub status_code: u64,
    pub largest_location: Location,
    pub parameters: Vec<KeyValuePair>,
}

impl TrackStatus {
    pub fn new(
        request_id: u64,
        status_code: TrackStatusCode,
        largest_location: Location,
        parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            status_code: status_code.into(),
            largest_location,
            parameters,
        }
    }
}

impl MOQTPayload for TrackStatus {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let status_code = read_variable_integer(cur)?;
        let largest_location = Location::depacketize(cur)?;
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            status_code,
            largest_location,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.status_code));
        self.largest_location.packetize(buf);
        write_parameters(buf, &self.parameters);
    }
}
