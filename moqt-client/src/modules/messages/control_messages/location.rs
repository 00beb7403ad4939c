use std::io::Cursor;

use bytes::BytesMut;
use serde::Serialize;

use crate::modules::errors::CodecError;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Address of an object inside a track. Ordering is lexicographic on
/// `(group, object)`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    pub group: u64,
    pub object: u64,
}

impl Location {
    pub fn new(group: u64, object: u64) -> Self {
        Self { group, object }
    }

    /// The location immediately after `self` within the same group.
    pub fn next_object(self) -> Self {
        Self {
            group: self.group,
            object: self.object + 1,
        }
    }

    /// The first location of the next group.
    pub fn next_group(self) -> Self {
        Self {
            group: self.group + 1,
            object: 0,
        }
    }
}

impl MOQTPayload for Location {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let group = read_variable_integer(cur)?;
        let object = read_variable_integer(cur)?;
        Ok(Self { group, object })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.group));
        buf.extend(write_variable_integer(self.object));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Location::new(1, 0) > Location::new(0, 100));
        assert!(Location::new(1, 2) > Location::new(1, 1));
        assert_eq!(Location::new(3, 4), Location::new(3, 4));
    }

    #[test]
    fn round_trip() {
        let location = Location::new(5, 7);
        let mut buf = BytesMut::new();
        location.packetize(&mut buf);

        let expected_bytes_array = [
            5, // Group (i)
            7, // Object (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(Location::depacketize(&mut cur).unwrap(), location);
    }
}
