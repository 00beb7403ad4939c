use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::tuple::Tuple;

/// Withdraws a previously published namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishNamespaceDone {
    pub track_namespace: Tuple,
}

impl PublishNamespaceDone {
    pub fn new(track_namespace: Tuple) -> Self {
        Self { track_namespace }
    }
}

impl MOQTPayload for PublishNamespaceDone {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let track_namespace = Tuple::depacketize(cur)?;
        Ok(Self { track_namespace })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        self.track_namespace.packetize(buf);
    }
}
