use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::group_order::GroupOrder;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeOk {
    pub request_id: u64,
    pub expires: u64,
    pub group_order: GroupOrder,
    /// `Some` iff the publisher already has content; carries its largest
    /// known location.
    pub largest_location: Option<Location>,
    pub subscribe_parameters: Vec<KeyValuePair>,
}

impl SubscribeOk {
    pub fn new(
        request_id: u64,
        expires: u64,
        group_order: GroupOrder,
        largest_location: Option<Location>,
        subscribe_parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            expires,
            group_order,
            largest_location,
            subscribe_parameters,
        }
    }
}

impl MOQTPayload for SubscribeOk {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let expires = read_variable_integer(cur)?;
        let group_order_u8 = read_u8(cur)?;
        let group_order =
            GroupOrder::try_from(group_order_u8).map_err(|_| CodecError::InvalidType {
                field: "group order",
                value: group_order_u8 as u64,
            })?;
        let content_exists = match read_u8(cur)? {
            0 => false,
            1 => true,
            other => {
                return Err(CodecError::InvalidType {
                    field: "content exists",
                    value: other as u64,
                });
            }
        };
        let largest_location = if content_exists {
            Some(Location::depacketize(cur)?)
        } else {
            None
        };
        let subscribe_parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            expires,
            group_order,
            largest_location,
            subscribe_parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.expires));
        buf.extend(u8::from(self.group_order).to_be_bytes());
        buf.extend((self.largest_location.is_some() as u8).to_be_bytes());
        if let Some(largest_location) = &self.largest_location {
            largest_location.packetize(buf);
        }
        write_parameters(buf, &self.subscribe_parameters);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::errors::CodecError;
    use crate::modules::messages::control_messages::group_order::GroupOrder;
    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::control_messages::subscribe_ok::SubscribeOk;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn packetize_without_content() {
        let subscribe_ok = SubscribeOk::new(0, 0, GroupOrder::Ascending, None, vec![]);

        let mut buf = BytesMut::new();
        subscribe_ok.packetize(&mut buf);

        let expected_bytes_array = [
            0, // Request ID (i)
            0, // Expires (i)
            1, // Group Order (8): Ascending
            0, // Content Exists (8)
            0, // Number of Parameters (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());
    }

    #[test]
    fn round_trip_with_content() {
        let subscribe_ok = SubscribeOk::new(
            2,
            3600,
            GroupOrder::Descending,
            Some(Location::new(9, 144)),
            vec![],
        );

        let mut buf = BytesMut::new();
        subscribe_ok.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(SubscribeOk::depacketize(&mut cur).unwrap(), subscribe_ok);
    }

    #[test]
    fn depacketize_invalid_content_exists() {
        let subscribe_ok = SubscribeOk::new(0, 0, GroupOrder::Ascending, None, vec![]);
        let mut buf = BytesMut::new();
        subscribe_ok.packetize(&mut buf);
        buf[3] = 2;

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            SubscribeOk::depacketize(&mut cur),
            Err(CodecError::InvalidType {
                field: "content exists",
                value: 2
            })
        );
    }
}
