use std::io::Cursor;

use bytes::{Buf, Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::data_streams::object_status::ObjectStatus;
use crate::modules::messages::data_streams::subgroup_object::{
    read_extension_headers, write_extension_headers,
};
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

/// Datagram frame types. Payload datagrams run the payload to the end of
/// the datagram; status datagrams carry a varint status instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum DatagramType {
    Object = 0x00,
    ObjectWithExtensions = 0x01,
    Status = 0x02,
    StatusWithExtensions = 0x03,
}

/// One object carried in a single (unreliable) datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DatagramObject {
    pub track_alias: u64,
    pub group_id: u64,
    pub object_id: u64,
    pub publisher_priority: u8,
    pub extension_headers: Option<Vec<KeyValuePair>>,
    pub object_status: Option<ObjectStatus>,
    pub payload: Option<Bytes>,
}

impl DatagramObject {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        track_alias: u64,
        group_id: u64,
        object_id: u64,
        publisher_priority: u8,
        extension_headers: Option<Vec<KeyValuePair>>,
        object_status: Option<ObjectStatus>,
        payload: Option<Bytes>,
    ) -> Result<Self, CodecError> {
        if payload.is_some() == object_status.is_some() {
            return Err(CodecError::InvalidType {
                field: "datagram object status",
                value: object_status.map_or(u64::from(ObjectStatus::Normal), u64::from),
            });
        }
        Ok(Self {
            track_alias,
            group_id,
            object_id,
            publisher_priority,
            extension_headers,
            object_status,
            payload,
        })
    }

    fn datagram_type(&self) -> DatagramType {
        match (self.payload.is_some(), self.extension_headers.is_some()) {
            (true, false) => DatagramType::Object,
            (true, true) => DatagramType::ObjectWithExtensions,
            (false, false) => DatagramType::Status,
            (false, true) => DatagramType::StatusWithExtensions,
        }
    }

    /// Parses a whole datagram; the payload variant consumes every
    /// remaining byte.
    pub(crate) fn depacketize(datagram: &[u8]) -> Result<Self, CodecError> {
        let mut cur = Cursor::new(datagram);
        let type_value = read_variable_integer(&mut cur)?;
        let datagram_type =
            DatagramType::try_from(type_value).map_err(|_| CodecError::InvalidType {
                field: "datagram type",
                value: type_value,
            })?;
        let track_alias = read_variable_integer(&mut cur)?;
        let group_id = read_variable_integer(&mut cur)?;
        let object_id = read_variable_integer(&mut cur)?;
        let publisher_priority = read_u8(&mut cur)?;
        let extension_headers = match datagram_type {
            DatagramType::ObjectWithExtensions | DatagramType::StatusWithExtensions => {
                Some(read_extension_headers(&mut cur)?)
            }
            _ => None,
        };
        let (object_status, payload) = match datagram_type {
            DatagramType::Object | DatagramType::ObjectWithExtensions => {
                let rest = Bytes::copy_from_slice(&datagram[cur.position() as usize..]);
                (None, Some(rest))
            }
            DatagramType::Status | DatagramType::StatusWithExtensions => {
                let status_value = read_variable_integer(&mut cur)?;
                let object_status =
                    ObjectStatus::try_from(status_value).map_err(|_| CodecError::InvalidType {
                        field: "object status",
                        value: status_value,
                    })?;
                if cur.remaining() != 0 {
                    return Err(CodecError::InvalidType {
                        field: "datagram trailing bytes",
                        value: cur.remaining() as u64,
                    });
                }
                (Some(object_status), None)
            }
        };
        Ok(Self {
            track_alias,
            group_id,
            object_id,
            publisher_priority,
            extension_headers,
            object_status,
            payload,
        })
    }

    pub(crate) fn packetize(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.extend(write_variable_integer(u64::from(self.datagram_type())));
        buf.extend(write_variable_integer(self.track_alias));
        buf.extend(write_variable_integer(self.group_id));
        buf.extend(write_variable_integer(self.object_id));
        buf.extend(self.publisher_priority.to_be_bytes());
        if let Some(extension_headers) = &self.extension_headers {
            write_extension_headers(&mut buf, extension_headers);
        }
        match (&self.payload, self.object_status) {
            (Some(payload), _) => buf.extend(payload),
            (None, status) => buf.extend(write_variable_integer(
                status.map_or(u64::from(ObjectStatus::Normal), u64::from),
            )),
        }
        buf
    }
}
