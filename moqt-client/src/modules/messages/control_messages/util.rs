use std::io::Cursor;

use bytes::{BufMut, BytesMut};

use crate::modules::constants::MAX_CONTROL_PAYLOAD_LENGTH;
use crate::modules::errors::CodecError;
use crate::modules::messages::control_message_type::ControlMessageType;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Frames a control payload: `varint(type) || u16(payload_length) || payload`.
pub(crate) fn create_full_message(
    message_type: ControlMessageType,
    payload: BytesMut,
) -> Result<BytesMut, CodecError> {
    if payload.len() > MAX_CONTROL_PAYLOAD_LENGTH {
        return Err(CodecError::LengthExceedsMax {
            field: "control message payload",
            len: payload.len(),
            max: MAX_CONTROL_PAYLOAD_LENGTH,
        });
    }
    let mut buf = BytesMut::with_capacity(payload.len() + 3);
    buf.extend(write_variable_integer(u8::from(message_type) as u64));
    buf.put_u16(payload.len() as u16);
    buf.extend(payload);
    Ok(buf)
}

/// Reads the framed type code of the next control message.
pub(crate) fn read_message_type(cur: &mut Cursor<&[u8]>) -> Result<ControlMessageType, CodecError> {
    let type_value = read_variable_integer(cur)?;
    let type_u8 = u8::try_from(type_value).map_err(|_| CodecError::Casting {
        field: "control message type",
    })?;
    ControlMessageType::try_from(type_u8).map_err(|_| CodecError::InvalidType {
        field: "control message type",
        value: type_value,
    })
}

/// Reads a varint parameter count followed by that many key-value pairs.
pub(crate) fn read_parameters(cur: &mut Cursor<&[u8]>) -> Result<Vec<KeyValuePair>, CodecError> {
    let count = read_variable_integer(cur)?;
    let mut parameters = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        parameters.push(KeyValuePair::depacketize(cur)?);
    }
    Ok(parameters)
}

pub(crate) fn write_parameters(buf: &mut BytesMut, parameters: &[KeyValuePair]) {
    buf.extend(write_variable_integer(parameters.len() as u64));
    for parameter in parameters {
        parameter.packetize(buf);
    }
}
