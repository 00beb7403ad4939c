use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsubscribe {
    pub request_id: u64,
}

impl Unsubscribe {
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl MOQTPayload for Unsubscribe {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        Ok(Self { request_id })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::messages::control_messages::unsubscribe::Unsubscribe;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip() {
        let unsubscribe = Unsubscribe::new(4);

        let mut buf = BytesMut::new();
        unsubscribe.packetize(&mut buf);

        let expected_bytes_array = [
            4, // Request ID (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(Unsubscribe::depacketize(&mut cur).unwrap(), unsubscribe);
    }
}
