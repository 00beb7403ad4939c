use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_bytes::{read_variable_bytes, write_variable_bytes};

/// Asks the peer to migrate to a new session URI before this session is
/// torn down. An empty URI means "reconnect to the same endpoint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAway {
    pub new_session_uri: Bytes,
}

impl GoAway {
    pub fn new(new_session_uri: Bytes) -> Self {
        Self { new_session_uri }
    }
}

impl MOQTPayload for GoAway {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let new_session_uri = read_variable_bytes(cur)?;
        Ok(Self { new_session_uri })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_bytes(&self.new_session_uri));
    }
}
