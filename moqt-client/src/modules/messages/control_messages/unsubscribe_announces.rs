use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::tuple::Tuple;

/// Withdraws interest in a namespace prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribeAnnounces {
    pub track_namespace_prefix: Tuple,
}

impl UnsubscribeAnnounces {
    pub fn new(track_namespace_prefix: Tuple) -> Self {
        Self {
            track_namespace_prefix,
        }
    }
}

impl MOQTPayload for UnsubscribeAnnounces {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let track_namespace_prefix = Tuple::depacketize(cur)?;
        Ok(Self {
            track_namespace_prefix,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        self.track_namespace_prefix.packetize(buf);
    }
}
