use std::io::Cursor;

use bytes::{Buf, BufMut, BytesMut};

use crate::modules::errors::CodecError;

// See https://datatracker.ietf.org/doc/html/rfc9000#name-variable-length-integer-enc

pub(crate) fn read_variable_integer(cur: &mut Cursor<&[u8]>) -> Result<u64, CodecError> {
    if cur.remaining() == 0 {
        return Err(CodecError::NotEnoughBytes { have: 0, need: 1 });
    }

    let first_byte = cur.get_u8();
    let rest_len = get_2msb_length_from_first_byte(first_byte) as usize - 1;

    if cur.remaining() < rest_len {
        return Err(CodecError::NotEnoughBytes {
            have: cur.remaining() + 1,
            need: rest_len + 1,
        });
    }

    let mut value: u64 = (first_byte & 0x3f).into();
    for _ in 0..rest_len {
        value = (value << 8) | cur.get_u8() as u64;
    }

    Ok(value)
}

/// Reads a variable-length integer from the front of `buf`, consuming the
/// bytes only when the read succeeds.
pub(crate) fn read_variable_integer_from_buffer(buf: &mut BytesMut) -> Result<u64, CodecError> {
    let mut cur = Cursor::new(&buf[..]);
    let ret = read_variable_integer(&mut cur);
    if ret.is_ok() {
        buf.advance(cur.position() as usize);
    }
    ret
}

fn get_2msb_length_from_first_byte(first_byte: u8) -> u8 {
    // 2MSB    Length
    // 00  ->  1
    // 01  ->  2
    // 10  ->  4
    // 11  ->  8
    1 << (first_byte >> 6)
}

pub(crate) fn write_variable_integer(value: u64) -> BytesMut {
    let mut buf = BytesMut::with_capacity(8);

    if value < 0x40 {
        buf.put_u8(value as u8)
    } else if value < 0x4000 {
        buf.put_u16(value as u16 | 0x4000)
    } else if value < 0x40000000 {
        buf.put_u32(value as u32 | 0x80000000)
    } else if value < 0x4000000000000000 {
        buf.put_u64(value | 0xc000000000000000)
    } else {
        unreachable!("invalid use of `write_variable_integer` with {}", value);
    }

    buf
}

pub(crate) fn read_u8(cur: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if cur.remaining() < 1 {
        return Err(CodecError::NotEnoughBytes {
            have: cur.remaining(),
            need: 1,
        });
    }
    Ok(cur.get_u8())
}

pub(crate) fn read_u16(cur: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if cur.remaining() < 2 {
        return Err(CodecError::NotEnoughBytes {
            have: cur.remaining(),
            need: 2,
        });
    }
    Ok(cur.get_u16())
}

#[cfg(test)]
mod decoder {
    use std::io::Cursor;

    use bytes::{Buf, BufMut, BytesMut};

    use crate::modules::errors::CodecError;
    use crate::modules::variable_integer::read_variable_integer;

    #[test]
    fn decode_single_byte() {
        let mut buf = BytesMut::with_capacity(0);
        buf.put_u8(0x05);
        buf.put_u32(0xdeadbeef);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur).unwrap();

        assert_eq!(decoded_value, 0x05);
        assert_eq!(cur.remaining(), 4);
    }

    #[test]
    fn decode_two_bytes() {
        let mut buf = BytesMut::with_capacity(0);
        buf.put_u16(0x7fec);
        buf.put_u8(0x05);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur).unwrap();

        assert_eq!(decoded_value, 0x3fec);
        assert_eq!(cur.remaining(), 1);
    }

    #[test]
    fn decode_four_bytes() {
        let mut buf = BytesMut::with_capacity(0);
        buf.put_u32(0xbaaaaaad);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur).unwrap();

        assert_eq!(decoded_value, 0x3aaaaaad);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn decode_eight_bytes() {
        let mut buf = BytesMut::with_capacity(0);
        buf.put_u64(0xdeadbeefbaaaaaad);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur).unwrap();

        assert_eq!(decoded_value, 0x1eadbeefbaaaaaad);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn decode_failed_by_empty_buffer() {
        let buf = BytesMut::with_capacity(0);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur);

        assert_eq!(
            decoded_value,
            Err(CodecError::NotEnoughBytes { have: 0, need: 1 })
        );
    }

    #[test]
    fn decode_failed_by_truncated_tail() {
        let mut buf = BytesMut::with_capacity(0);
        // First byte announces an eight byte integer, only four are present.
        buf.put_u32(0xdeadbeef);

        let mut cur = Cursor::new(&buf[..]);
        let decoded_value = read_variable_integer(&mut cur);

        assert_eq!(
            decoded_value,
            Err(CodecError::NotEnoughBytes { have: 4, need: 8 })
        );
    }

    #[test]
    fn buffer_is_untouched_on_failure() {
        use crate::modules::variable_integer::read_variable_integer_from_buffer;

        let mut buf = BytesMut::with_capacity(0);
        buf.put_u8(0xc0);

        assert!(read_variable_integer_from_buffer(&mut buf).is_err());
        assert_eq!(buf.len(), 1);
    }
}

#[cfg(test)]
mod encoder {
    use bytes::Buf;

    use crate::modules::variable_integer::write_variable_integer;

    #[test]
    fn encode_single_byte() {
        let mut buf = write_variable_integer(0x3f);
        assert_eq!(buf.get_u8(), 0x3f);
    }

    #[test]
    fn encode_two_bytes() {
        let mut buf = write_variable_integer(0x3fec);
        assert_eq!(buf.get_u16(), 0x7fec);
    }

    #[test]
    fn encode_four_bytes() {
        let mut buf = write_variable_integer(0x3aaaaaad);
        assert_eq!(buf.get_u32(), 0xbaaaaaad);
    }

    #[test]
    fn encode_eight_bytes() {
        let mut buf = write_variable_integer(0x1eadbeefbaaaaaad);
        assert_eq!(buf.get_u64(), 0xdeadbeefbaaaaaad);
    }
}
