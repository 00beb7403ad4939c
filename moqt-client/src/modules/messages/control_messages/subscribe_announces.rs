use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::tuple::Tuple;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Registers interest in every namespace the peer publishes under a prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeAnnounces {
    pub request_id: u64,
    pub track_namespace_prefix: Tuple,
    pub parameters: Vec<KeyValuePair>,
}

impl SubscribeAnnounces {
    pub fn new(
        request_id: u64,
        track_namespace_prefix: Tuple,
        parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            track_namespace_prefix,
            parameters,
        }
    }
}

impl MOQTPayload for SubscribeAnnounces {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let track_namespace_prefix = Tuple::depacketize(cur)?;
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            track_namespace_prefix,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        self.track_namespace_prefix.packetize(buf);
        write_parameters(buf, &self.parameters);
    }
}
