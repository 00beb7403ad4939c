use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::track::FullTrackName;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Asks the peer for the current status of one of its tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatusRequest {
    pub request_id: u64,
    pub full_track_name: FullTrackName,
    pub parameters: Vec<KeyValuePair>,
}

impl TrackStatusRequest {
    pub fn new(
        request_id: u64,
        full_track_name: FullTrackName,
        parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            full_track_name,
            parameters,
        }
    }
}

impl MOQTPayload for TrackStatusRequest {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let full_track_name = FullTrackName::depacketize(cur)?;
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            full_track_name,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        self.full_track_name.packetize(buf);
        write_parameters(buf, &self.parameters);
    }
}
