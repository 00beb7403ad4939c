use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::data_streams::object_status::ObjectStatus;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// One object on a subgroup data stream. Whether the extension-header block
/// is present is a property of the stream's header type, so serialization
/// takes it as a parameter.
///
/// A zero payload length switches the final field to a varint object
/// status; a non-empty payload implies status Normal.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgroupObject {
    pub object_id: u64,
    pub extension_headers: Option<Vec<KeyValuePair>>,
    pub object_status: Option<ObjectStatus>,
    pub payload: Option<Bytes>,
}

impl SubgroupObject {
    pub fn try_new(
        object_id: u64,
        extension_headers: Option<Vec<KeyValuePair>>,
        object_status: Option<ObjectStatus>,
        payload: Option<Bytes>,
    ) -> Result<Self, CodecError> {
        let has_payload = payload.as_ref().is_some_and(|p| !p.is_empty());
        if has_payload == object_status.is_some() {
            return Err(CodecError::InvalidType {
                field: "subgroup object status",
                value: object_status.map_or(u64::from(ObjectStatus::Normal), u64::from),
            });
        }
        Ok(Self {
            object_id,
            extension_headers,
            object_status,
            payload,
        })
    }

    pub(crate) fn deserialize(
        cur: &mut Cursor<&[u8]>,
        has_extensions: bool,
    ) -> Result<Self, CodecError> {
        let object_id = read_variable_integer(cur)?;
        let extension_headers = if has_extensions {
            Some(read_extension_headers(cur)?)
        } else {
            None
        };
        let payload_length = read_variable_integer(cur)? as usize;
        if payload_length == 0 {
            let status_value = read_variable_integer(cur)?;
            let object_status =
                ObjectStatus::try_from(status_value).map_err(|_| CodecError::InvalidType {
                    field: "object status",
                    value: status_value,
                })?;
            Ok(Self {
                object_id,
                extension_headers,
                object_status: Some(object_status),
                payload: None,
            })
        } else {
            let payload = crate::modules::variable_bytes::read_fixed_bytes(cur, payload_length)?;
            Ok(Self {
                object_id,
                extension_headers,
                object_status: None,
                payload: Some(payload),
            })
        }
    }

    pub(crate) fn serialize(&self, buf: &mut BytesMut, has_extensions: bool) {
        buf.extend(write_variable_integer(self.object_id));
        if has_extensions {
            write_extension_headers(buf, self.extension_headers.as_deref().unwrap_or(&[]));
        }
        match &self.payload {
            Some(payload) if !payload.is_empty() => {
                buf.extend(write_variable_integer(payload.len() as u64));
                buf.extend(payload);
            }
            _ => {
                buf.extend(write_variable_integer(0));
                buf.extend(write_variable_integer(
                    self.object_status
                        .map_or(u64::from(ObjectStatus::Normal), u64::from),
                ));
            }
        }
    }
}

/// Extension headers are framed as a varint byte length followed by that
/// many bytes of concatenated key-value pairs.
pub(crate) fn read_extension_headers(
    cur: &mut Cursor<&[u8]>,
) -> Result<Vec<KeyValuePair>, CodecError> {
    let total_length = read_variable_integer(cur)? as usize;
    let block = crate::modules::variable_bytes::read_fixed_bytes(cur, total_length)?;
    let mut block_cur = Cursor::new(block.as_ref());
    let mut headers = Vec::new();
    while (block_cur.position() as usize) < block.len() {
        headers.push(KeyValuePair::depacketize(&mut block_cur)?);
    }
    Ok(headers)
}

pub(crate) fn write_extension_headers(buf: &mut BytesMut, headers: &[KeyValuePair]) {
    let mut block = BytesMut::new();
    for header in headers {
        header.packetize(&mut block);
    }
    buf.extend(write_variable_integer(block.len() as u64));
    buf.extend(block);
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{Bytes, BytesMut};

    use crate::modules::errors::CodecError;
    use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
    use crate::modules::messages::data_streams::object_status::ObjectStatus;
    use crate::modules::messages::data_streams::subgroup_object::SubgroupObject;

    #[test]
    fn serialize_without_extensions() {
        let object = SubgroupObject::try_new(
            1,
            None,
            None,
            Some(Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF])),
        )
        .unwrap();

        let mut buf = BytesMut::new();
        object.serialize(&mut buf, false);

        let expected_bytes_array = [
            0x01, // Object ID (i)
            0x04, // Payload Length (i)
            0xDE, 0xAD, 0xBE, 0xEF, // Payload (..)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            SubgroupObject::deserialize(&mut cur, false).unwrap(),
            object
        );
    }

    #[test]
    fn serialize_with_extensions() {
        let object = SubgroupObject::try_new(
            5,
            Some(vec![
                KeyValuePair::try_new_varint(0x3c, 10).unwrap(),
                KeyValuePair::try_new_bytes(0x0b, Bytes::from_static(&[0x01, 0x02])).unwrap(),
            ]),
            None,
            Some(Bytes::from_static(&[0x11, 0x22, 0x33])),
        )
        .unwrap();

        let mut buf = BytesMut::new();
        object.serialize(&mut buf, true);

        let expected_bytes_array = [
            0x05, // Object ID (i)
            0x06, // Extension Headers Length (i)
            0x3c, 0x0a, // Extension: Key=0x3c, Value=10
            0x0b, 0x02, 0x01, 0x02, // Extension: Key=0x0b, Length=2, Value
            0x03, // Payload Length (i)
            0x11, 0x22, 0x33, // Payload (..)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(SubgroupObject::deserialize(&mut cur, true).unwrap(), object);
    }

    #[test]
    fn status_round_trip() {
        let object =
            SubgroupObject::try_new(3, None, Some(ObjectStatus::EndOfGroup), None).unwrap();

        let mut buf = BytesMut::new();
        object.serialize(&mut buf, false);

        let expected_bytes_array = [
            0x03, // Object ID (i)
            0x00, // Payload Length (i)
            0x03, // Object Status (i): EndOfGroup
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            SubgroupObject::deserialize(&mut cur, false).unwrap(),
            object
        );
    }

    #[test]
    fn payload_and_status_are_exclusive() {
        assert!(matches!(
            SubgroupObject::try_new(
                0,
                None,
                Some(ObjectStatus::EndOfGroup),
                Some(Bytes::from_static(b"x"))
            ),
            Err(CodecError::InvalidType { .. })
        ));
        assert!(matches!(
            SubgroupObject::try_new(0, None, None, None),
            Err(CodecError::InvalidType { .. })
        ));
    }

    #[test]
    fn deserialize_truncated_payload() {
        let object = SubgroupObject::try_new(1, None, None, Some(Bytes::from_static(b"abcdef")))
            .unwrap();
        let mut buf = BytesMut::new();
        object.serialize(&mut buf, false);
        buf.truncate(buf.len() - 2);

        let mut cur = Cursor::new(&buf[..]);
        assert!(matches!(
            SubgroupObject::deserialize(&mut cur, false),
            Err(CodecError::NotEnoughBytes { .. })
        ));
    }
}
