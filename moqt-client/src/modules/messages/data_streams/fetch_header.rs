use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::constants::FETCH_HEADER_TYPE;
use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Header opening a unidirectional fetch data stream:
/// `vi(0x05) vi(request_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchHeader {
    pub request_id: u64,
}

impl FetchHeader {
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl MOQTPayload for FetchHeader {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let type_value = read_variable_integer(cur)?;
        if type_value != FETCH_HEADER_TYPE {
            return Err(CodecError::InvalidType {
                field: "fetch header type",
                value: type_value,
            });
        }
        let request_id = read_variable_integer(cur)?;
        Ok(Self { request_id })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(FETCH_HEADER_TYPE));
        buf.extend(write_variable_integer(self.request_id));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::errors::CodecError;
    use crate::modules::messages::data_streams::fetch_header::FetchHeader;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip() {
        let header = FetchHeader::new(3);

        let mut buf = BytesMut::new();
        header.packetize(&mut buf);

        let expected_bytes_array = [
            0x05, // Stream Type (i): Fetch Header
            0x03, // Request ID (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(FetchHeader::depacketize(&mut cur).unwrap(), header);
    }

    #[test]
    fn rejects_wrong_stream_type() {
        let buf = [0x08u8, 0x03];
        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            FetchHeader::depacketize(&mut cur),
            Err(CodecError::InvalidType {
                field: "fetch header type",
                value: 0x08
            })
        );
    }
}
