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
pub struct FetchOk {
    pub request_id: u64,
    pub group_order: GroupOrder,
    pub end_of_track: bool,
    /// Largest location the fetch will deliver up to.
    pub end_location: Location,
    pub parameters: Vec<KeyValuePair>,
}

impl FetchOk {
    pub fn new(
        request_id: u64,
        group_order: GroupOrder,
        end_of_track: bool,
        end_location: Location,
        parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            group_order,
            end_of_track,
            end_location,
            parameters,
        }
    }
}

impl MOQTPayload for FetchOk {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let group_order_u8 = read_u8(cur)?;
        let group_order =
            GroupOrder::try_from(group_order_u8).map_err(|_| CodecError::InvalidType {
                field: "group order",
                value: group_order_u8 as u64,
            })?;
        let end_of_track = read_u8(cur)? != 0;
        let end_location = Location::depacketize(cur)?;
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            group_order,
            end_of_track,
            end_location,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(u8::from(self.group_order).to_be_bytes());
        buf.extend((self.end_of_track as u8).to_be_bytes());
        self.end_location.packetize(buf);
        write_parameters(buf, &self.parameters);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::messages::control_messages::fetch_ok::FetchOk;
    use crate::modules::messages::control_messages::group_order::GroupOrder;
    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip() {
        let fetch_ok = FetchOk::new(3, GroupOrder::Ascending, false, Location::new(0, 0), vec![]);

        let mut buf = BytesMut::new();
        fetch_ok.packetize(&mut buf);

        let expected_bytes_array = [
            3, // Request ID (i)
            1, // Group Order (8): Ascending
            0, // End Of Track (8)
            0, // End Group (i)
            0, // End Object (i)
            0, // Number of Parameters (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(FetchOk::depacketize(&mut cur).unwrap(), fetch_ok);
    }
}
