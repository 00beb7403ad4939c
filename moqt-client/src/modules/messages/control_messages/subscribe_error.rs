use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_bytes::{read_reason_phrase, validate_reason_phrase, write_reason_phrase};
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Unlike the other request errors, SUBSCRIBE_ERROR carries a track alias:
/// with error code RetryTrackAlias it proposes a replacement alias the
/// subscriber should retry with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeError {
    pub request_id: u64,
    pub error_code: u64,
    pub reason_phrase: String,
    pub track_alias: u64,
}

impl SubscribeError {
    pub fn try_new(
        request_id: u64,
        error_code: u64,
        reason_phrase: String,
        track_alias: u64,
    ) -> Result<Self, CodecError> {
        validate_reason_phrase(&reason_phrase)?;
        Ok(Self {
            request_id,
            error_code,
            reason_phrase,
            track_alias,
        })
    }
}

impl MOQTPayload for SubscribeError {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let error_code = read_variable_integer(cur)?;
        let reason_phrase = read_reason_phrase(cur)?;
        let track_alias = read_variable_integer(cur)?;
        Ok(Self {
            request_id,
            error_code,
            reason_phrase,
            track_alias,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.error_code));
        buf.extend(write_reason_phrase(&self.reason_phrase));
        buf.extend(write_variable_integer(self.track_alias));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::errors::SubscribeErrorCode;
    use crate::modules::messages::control_messages::subscribe_error::SubscribeError;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip() {
        let error = SubscribeError::try_new(
            0,
            SubscribeErrorCode::RetryTrackAlias.into(),
            "alias in use".to_string(),
            42,
        )
        .unwrap();

        let mut buf = BytesMut::new();
        error.packetize(&mut buf);

        let expected_bytes_array = [
            0, // Request ID (i)
            6, // Error Code (i): RetryTrackAlias
            12, // Reason Phrase Length (i)
            97, 108, 105, 97, 115, 32, 105, 110, 32, 117, 115,
            101, // Reason Phrase (..): "alias in use"
            42, // Track Alias (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(SubscribeError::depacketize(&mut cur).unwrap(), error);
    }
}
