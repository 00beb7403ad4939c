use std::io::Cursor;

use bytes::{Buf, Bytes, BytesMut};

use crate::modules::constants::MAX_REASON_PHRASE_LENGTH;
use crate::modules::errors::CodecError;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

// See https://datatracker.ietf.org/doc/html/draft-ietf-moq-transport#name-notational-conventions
//
// x (A): a field that is A bits long.
// x (b): a variable-length integer, followed by that many bytes.

pub(crate) fn read_fixed_bytes(cur: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, CodecError> {
    if cur.remaining() < length {
        return Err(CodecError::NotEnoughBytes {
            have: cur.remaining(),
            need: length,
        });
    }

    let value = Bytes::copy_from_slice(
        &cur.get_ref()[cur.position() as usize..cur.position() as usize + length],
    );
    cur.advance(length);

    Ok(value)
}

pub(crate) fn read_variable_bytes(cur: &mut Cursor<&[u8]>) -> Result<Bytes, CodecError> {
    let len = read_variable_integer(cur)? as usize;
    read_fixed_bytes(cur, len)
}

pub(crate) fn write_variable_bytes(value: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(value.len() + 2);
    buf.extend(write_variable_integer(value.len() as u64));
    buf.extend(value);

    buf
}

/// Reads a length-prefixed UTF-8 phrase of at most 1024 bytes.
pub(crate) fn read_reason_phrase(cur: &mut Cursor<&[u8]>) -> Result<String, CodecError> {
    let bytes = read_variable_bytes(cur)?;
    if bytes.len() > MAX_REASON_PHRASE_LENGTH {
        return Err(CodecError::LengthExceedsMax {
            field: "reason phrase",
            len: bytes.len(),
            max: MAX_REASON_PHRASE_LENGTH,
        });
    }
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8("reason phrase"))
}

pub(crate) fn write_reason_phrase(value: &str) -> BytesMut {
    write_variable_bytes(value.as_bytes())
}

/// Reason phrases are validated when a message is constructed so that
/// packetize can stay infallible.
pub(crate) fn validate_reason_phrase(value: &str) -> Result<(), CodecError> {
    if value.len() > MAX_REASON_PHRASE_LENGTH {
        return Err(CodecError::LengthExceedsMax {
            field: "reason phrase",
            len: value.len(),
            max: MAX_REASON_PHRASE_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::errors::CodecError;
    use crate::modules::variable_bytes::{
        read_reason_phrase, read_variable_bytes, write_reason_phrase, write_variable_bytes,
    };

    #[test]
    fn variable_bytes_round_trip() {
        let buf = write_variable_bytes(b"track_name");

        let expected_bytes_array = [
            10, // Length (i)
            116, 114, 97, 99, 107, 95, 110, 97, 109, 101, // Value(b): "track_name"
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        let decoded = read_variable_bytes(&mut cur).unwrap();
        assert_eq!(decoded.as_ref(), b"track_name");
    }

    #[test]
    fn variable_bytes_truncated() {
        let mut buf = write_variable_bytes(b"track_name");
        buf.truncate(4);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            read_variable_bytes(&mut cur),
            Err(CodecError::NotEnoughBytes { have: 3, need: 10 })
        );
    }

    #[test]
    fn reason_phrase_round_trip() {
        let buf = write_reason_phrase("subscription ended");

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(read_reason_phrase(&mut cur).unwrap(), "subscription ended");
    }

    #[test]
    fn reason_phrase_rejects_invalid_utf8() {
        let mut buf = BytesMut::new();
        buf.extend(write_variable_bytes(&[0xff, 0xfe, 0xfd]));

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            read_reason_phrase(&mut cur),
            Err(CodecError::InvalidUtf8("reason phrase"))
        );
    }

    #[test]
    fn reason_phrase_rejects_oversize() {
        let phrase = vec![b'a'; 1025];
        let buf = write_variable_bytes(&phrase);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            read_reason_phrase(&mut cur),
            Err(CodecError::LengthExceedsMax {
                field: "reason phrase",
                len: 1025,
                max: 1024
            })
        );
    }
}
