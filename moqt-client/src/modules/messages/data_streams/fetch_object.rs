use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::data_streams::object_status::ObjectStatus;
use crate::modules::messages::data_streams::subgroup_object::{
    read_extension_headers, write_extension_headers,
};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

/// One object on a fetch data stream. Fetch objects always carry the
/// extension-header block (possibly empty) and address themselves fully:
/// group, subgroup and object id plus the publisher priority.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchObject {
    pub group_id: u64,
    pub subgroup_id: u64,
    pub object_id: u64,
    pub publisher_priority: u8,
    pub extension_headers: Vec<KeyValuePair>,
    pub object_status: Option<ObjectStatus>,
    pub payload: Option<Bytes>,
}

impl FetchObject {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        group_id: u64,
        subgroup_id: u64,
        object_id: u64,
        publisher_priority: u8,
        extension_headers: Vec<KeyValuePair>,
        object_status: Option<ObjectStatus>,
        payload: Option<Bytes>,
    ) -> Result<Self, CodecError> {
        let has_payload = payload.as_ref().is_some_and(|p| !p.is_empty());
        if has_payload == object_status.is_some() {
            return Err(CodecError::InvalidType {
                field: "fetch object status",
                value: object_status.map_or(u64::from(ObjectStatus::Normal), u64::from),
            });
        }
        Ok(Self {
            group_id,
            subgroup_id,
            object_id,
            publisher_priority,
            extension_headers,
            object_status,
            payload,
        })
    }
}

impl MOQTPayload for FetchObject {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let group_id = read_variable_integer(cur)?;
        let subgroup_id = read_variable_integer(cur)?;
        let object_id = read_variable_integer(cur)?;
        let publisher_priority = read_u8(cur)?;
        let extension_headers = read_extension_headers(cur)?;
        let payload_length = read_variable_integer(cur)? as usize;
        let (object_status, payload) = if payload_length == 0 {
            let status_value = read_variable_integer(cur)?;
            let object_status =
                ObjectStatus::try_from(status_value).map_err(|_| CodecError::InvalidType {
                    field: "object status",
                    value: status_value,
                })?;
            (Some(object_status), None)
        } else {
            let payload = crate::modules::variable_bytes::read_fixed_bytes(cur, payload_length)?;
            (None, Some(payload))
        };
        Ok(Self {
            group_id,
            subgroup_id,
            object_id,
            publisher_priority,
            extension_headers,
            object_status,
            payload,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.group_id));
        buf.extend(write_variable_integer(self.subgroup_id));
        buf.extend(write_variable_integer(self.object_id));
        buf.extend(self.publisher_priority.to_be_bytes());
        write_extension_headers(buf, &self.extension_headers);
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

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{Bytes, BytesMut};

    use crate::modules::errors::CodecError;
    use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
    use crate::modules::messages::data_streams::fetch_object::FetchObject;
    use crate::modules::messages::data_streams::object_status::ObjectStatus;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip_with_payload() {
        let object = FetchObject::try_new(
            9,
            11,
            10,
            255,
            vec![
                KeyValuePair::try_new_varint(0, 10).unwrap(),
                KeyValuePair::try_new_bytes(1, Bytes::from_static(b"wololoo")).unwrap(),
            ],
            None,
            Some(Bytes::from_static(b"01239gjawkk92837aldmi")),
        )
        .unwrap();

        let mut buf = BytesMut::new();
        object.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(FetchObject::depacketize(&mut cur).unwrap(), object);
    }

    #[test]
    fn round_trip_with_status() {
        let object =
            FetchObject::try_new(10, 0, 5, 64, vec![], Some(ObjectStatus::EndOfTrack), None)
                .unwrap();

        let mut buf = BytesMut::new();
        object.packetize(&mut buf);

        let expected_bytes_array = [
            10, // Group ID (i)
            0,  // Subgroup ID (i)
            5,  // Object ID (i)
            64, // Publisher Priority (8)
            0,  // Extension Headers Length (i)
            0,  // Payload Length (i)
            4,  // Object Status (i): EndOfTrack
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(FetchObject::depacketize(&mut cur).unwrap(), object);
    }

    #[test]
    fn depacketize_unknown_status() {
        let object =
            FetchObject::try_new(0, 0, 0, 0, vec![], Some(ObjectStatus::DoesNotExist), None)
                .unwrap();
        let mut buf = BytesMut::new();
        object.packetize(&mut buf);
        let last = buf.len() - 1;
        buf[last] = 0x02;

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            FetchObject::depacketize(&mut cur),
            Err(CodecError::InvalidType {
                field: "object status",
                value: 2
            })
        );
    }
}
