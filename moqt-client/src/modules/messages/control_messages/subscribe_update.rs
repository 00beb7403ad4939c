use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

/// Narrows the window of an existing subscription. The end group is encoded
/// as `group + 1` on the wire, `0` meaning "no end group".
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeUpdate {
    pub request_id: u64,
    pub start_location: Location,
    pub end_group: Option<u64>,
    pub subscriber_priority: u8,
    pub forward: bool,
    pub subscribe_parameters: Vec<KeyValuePair>,
}

impl SubscribeUpdate {
    pub fn new(
        request_id: u64,
        start_location: Location,
        end_group: Option<u64>,
        subscriber_priority: u8,
        forward: bool,
        subscribe_parameters: Vec<KeyValuePair>,
    ) -> Self {
        Self {
            request_id,
            start_location,
            end_group,
            subscriber_priority,
            forward,
            subscribe_parameters,
        }
    }
}

impl MOQTPayload for SubscribeUpdate {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let start_location = Location::depacketize(cur)?;
        let end_group_wire = read_variable_integer(cur)?;
        let end_group = if end_group_wire == 0 {
            None
        } else {
            Some(end_group_wire - 1)
        };
        let subscriber_priority = read_u8(cur)?;
        let forward = read_u8(cur)? != 0;
        let subscribe_parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            start_location,
            end_group,
            subscriber_priority,
            forward,
            subscribe_parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        self.start_location.packetize(buf);
        buf.extend(write_variable_integer(
            self.end_group.map_or(0, |group| group + 1),
        ));
        buf.extend(self.subscriber_priority.to_be_bytes());
        buf.extend((self.forward as u8).to_be_bytes());
        write_parameters(buf, &self.subscribe_parameters);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::control_messages::subscribe_update::SubscribeUpdate;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn packetize_with_end_group() {
        let update = SubscribeUpdate::new(0, Location::new(0, 2), Some(10), 32, true, vec![]);

        let mut buf = BytesMut::new();
        update.packetize(&mut buf);

        let expected_bytes_array = [
            0,  // Request ID (i)
            0,  // Start Group (i)
            2,  // Start Object (i)
            11, // End Group (i): 10 + 1
            32, // Subscriber Priority (8)
            1,  // Forward (8)
            0,  // Number of Parameters (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());
    }

    #[test]
    fn round_trip_without_end_group() {
        let update = SubscribeUpdate::new(6, Location::new(4, 1), None, 64, false, vec![]);

        let mut buf = BytesMut::new();
        update.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(SubscribeUpdate::depacketize(&mut cur).unwrap(), update);
    }
}
