use std::io::Cursor;

use bytes::BytesMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::group_order::GroupOrder;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::track::FullTrackName;
use crate::modules::variable_integer::{
    read_u8, read_variable_integer, write_variable_integer,
};

/// Where in the track a subscription starts (and possibly ends).
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FilterType {
    NextGroupStart = 0x1,
    LatestObject = 0x2,
    AbsoluteStart = 0x3,
    AbsoluteRange = 0x4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscribe {
    pub request_id: u64,
    pub track_alias: u64,
    pub full_track_name: FullTrackName,
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,
    pub forward: bool,
    pub filter_type: FilterType,
    pub start_location: Option<Location>,
    pub end_group: Option<u64>,
    pub subscribe_parameters: Vec<KeyValuePair>,
}

impl Subscribe {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        request_id: u64,
        track_alias: u64,
        full_track_name: FullTrackName,
        subscriber_priority: u8,
        group_order: GroupOrder,
        forward: bool,
        filter_type: FilterType,
        start_location: Option<Location>,
        end_group: Option<u64>,
        subscribe_parameters: Vec<KeyValuePair>,
    ) -> Result<Self, CodecError> {
        Self::validate_filter(filter_type, start_location, end_group)?;
        Ok(Self {
            request_id,
            track_alias,
            full_track_name,
            subscriber_priority,
            group_order,
            forward,
            filter_type,
            start_location,
            end_group,
            subscribe_parameters,
        })
    }

    fn validate_filter(
        filter_type: FilterType,
        start_location: Option<Location>,
        end_group: Option<u64>,
    ) -> Result<(), CodecError> {
        match filter_type {
            FilterType::NextGroupStart | FilterType::LatestObject => {
                if start_location.is_some() || end_group.is_some() {
                    return Err(CodecError::InvalidType {
                        field: "subscribe filter",
                        value: u8::from(filter_type) as u64,
                    });
                }
            }
            FilterType::AbsoluteStart => {
                if start_location.is_none() || end_group.is_some() {
                    return Err(CodecError::InvalidType {
                        field: "subscribe filter",
                        value: u8::from(filter_type) as u64,
                    });
                }
            }
            FilterType::AbsoluteRange => {
                let (Some(start), Some(end)) = (start_location, end_group) else {
                    return Err(CodecError::InvalidType {
                        field: "subscribe filter",
                        value: u8::from(filter_type) as u64,
                    });
                };
                if end <= start.group {
                    return Err(CodecError::InvalidType {
                        field: "subscribe end group",
                        value: end,
                    });
                }
            }
        }
        Ok(())
    }
}

impl MOQTPayload for Subscribe {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let track_alias = read_variable_integer(cur)?;
        let full_track_name = FullTrackName::depacketize(cur)?;
        let subscriber_priority = read_u8(cur)?;
        let group_order_u8 = read_u8(cur)?;
        let group_order =
            GroupOrder::try_from(group_order_u8).map_err(|_| CodecError::InvalidType {
                field: "group order",
                value: group_order_u8 as u64,
            })?;
        let forward = read_u8(cur)? != 0;
        let filter_type_value = read_variable_integer(cur)?;
        let filter_type = u8::try_from(filter_type_value)
            .ok()
            .and_then(|v| FilterType::try_from(v).ok())
            .ok_or(CodecError::InvalidType {
                field: "filter type",
                value: filter_type_value,
            })?;
        let start_location = match filter_type {
            FilterType::AbsoluteStart | FilterType::AbsoluteRange => {
                Some(Location::depacketize(cur)?)
            }
            _ => None,
        };
        let end_group = match filter_type {
            FilterType::AbsoluteRange => Some(read_variable_integer(cur)?),
            _ => None,
        };
        Self::validate_filter(filter_type, start_location, end_group)?;
        let subscribe_parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            track_alias,
            full_track_name,
            subscriber_priority,
            group_order,
            forward,
            filter_type,
            start_location,
            end_group,
            subscribe_parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(write_variable_integer(self.track_alias));
        self.full_track_name.packetize(buf);
        buf.extend(self.subscriber_priority.to_be_bytes());
        buf.extend(u8::from(self.group_order).to_be_bytes());
        buf.extend((self.forward as u8).to_be_bytes());
        buf.extend(write_variable_integer(u8::from(self.filter_type) as u64));
        if let Some(start_location) = &self.start_location {
            start_location.packetize(buf);
        }
        if let Some(end_group) = self.end_group {
            buf.extend(write_variable_integer(end_group));
        }
        write_parameters(buf, &self.subscribe_parameters);
    }
}

#[cfg(test)]
mod tests {
    mod success {
        use std::io::Cursor;

        use bytes::{Bytes, BytesMut};

        use crate::modules::messages::control_messages::group_order::GroupOrder;
        use crate::modules::messages::control_messages::location::Location;
        use crate::modules::messages::control_messages::subscribe::{FilterType, Subscribe};
        use crate::modules::messages::moqt_payload::MOQTPayload;
        use crate::modules::models::track::FullTrackName;
        use crate::modules::models::tuple::Tuple;

        fn full_track_name() -> FullTrackName {
            FullTrackName::try_new(Tuple::from_utf8_path("test/test"), Bytes::from_static(b"video"))
                .unwrap()
        }

        #[test]
        fn packetize_latest_object() {
            let subscribe = Subscribe::try_new(
                0,
                1,
                full_track_name(),
                32,
                GroupOrder::Original,
                true,
                FilterType::LatestObject,
                None,
                None,
                vec![],
            )
            .unwrap();

            let mut buf = BytesMut::new();
            subscribe.packetize(&mut buf);

            let expected_bytes_array = [
                0, // Request ID (i)
                1, // Track Alias (i)
                2, // Track Namespace (tuple): Number of elements
                4, // Track Namespace (b): Length
                116, 101, 115, 116, // Track Namespace (b): Value("test")
                4,   // Track Namespace (b): Length
                116, 101, 115, 116, // Track Namespace (b): Value("test")
                5,   // Track Name (b): Length
                118, 105, 100, 101, 111, // Track Name (b): Value("video")
                32,  // Subscriber Priority (8)
                0,   // Group Order (8): Original
                1,   // Forward (8)
                2,   // Filter Type (i): LatestObject
                0,   // Number of Parameters (i)
            ];
            assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());
        }

        #[test]
        fn round_trip_absolute_range() {
            let subscribe = Subscribe::try_new(
                2,
                7,
                full_track_name(),
                128,
                GroupOrder::Ascending,
                true,
                FilterType::AbsoluteRange,
                Some(Location::new(5, 0)),
                Some(6),
                vec![],
            )
            .unwrap();

            let mut buf = BytesMut::new();
            subscribe.packetize(&mut buf);

            let mut cur = Cursor::new(&buf[..]);
            assert_eq!(Subscribe::depacketize(&mut cur).unwrap(), subscribe);
        }

        #[test]
        fn round_trip_absolute_start() {
            let subscribe = Subscribe::try_new(
                4,
                9,
                full_track_name(),
                0,
                GroupOrder::Descending,
                false,
                FilterType::AbsoluteStart,
                Some(Location::new(10, 3)),
                None,
                vec![],
            )
            .unwrap();

            let mut buf = BytesMut::new();
            subscribe.packetize(&mut buf);

            let mut cur = Cursor::new(&buf[..]);
            assert_eq!(Subscribe::depacketize(&mut cur).unwrap(), subscribe);
        }
    }

    mod failure {
        use std::io::Cursor;

        use bytes::{Bytes, BytesMut};

        use crate::modules::messages::control_messages::group_order::GroupOrder;
        use crate::modules::messages::control_messages::location::Location;
        use crate::modules::messages::control_messages::subscribe::{FilterType, Subscribe};
        use crate::modules::messages::moqt_payload::MOQTPayload;
        use crate::modules::models::track::FullTrackName;
        use crate::modules::models::tuple::Tuple;

        fn full_track_name() -> FullTrackName {
            FullTrackName::try_new(Tuple::from_utf8_path("test"), Bytes::from_static(b"audio"))
                .unwrap()
        }

        #[test]
        fn latest_object_with_start_location() {
            let subscribe = Subscribe::try_new(
                0,
                1,
                full_track_name(),
                0,
                GroupOrder::Ascending,
                true,
                FilterType::LatestObject,
                Some(Location::new(0, 0)),
                None,
                vec![],
            );
            assert!(subscribe.is_err());
        }

        #[test]
        fn absolute_start_without_start_location() {
            let subscribe = Subscribe::try_new(
                0,
                1,
                full_track_name(),
                0,
                GroupOrder::Ascending,
                true,
                FilterType::AbsoluteStart,
                None,
                None,
                vec![],
            );
            assert!(subscribe.is_err());
        }

        #[test]
        fn absolute_range_with_end_not_after_start() {
            let subscribe = Subscribe::try_new(
                0,
                1,
                full_track_name(),
                0,
                GroupOrder::Ascending,
                true,
                FilterType::AbsoluteRange,
                Some(Location::new(5, 0)),
                Some(5),
                vec![],
            );
            assert!(subscribe.is_err());
        }

        #[test]
        fn depacketize_unknown_filter_type() {
            let valid = Subscribe::try_new(
                0,
                1,
                full_track_name(),
                0,
                GroupOrder::Ascending,
                true,
                FilterType::LatestObject,
                None,
                None,
                vec![],
            )
            .unwrap();
            let mut buf = BytesMut::new();
            valid.packetize(&mut buf);
            // Filter type sits just before the trailing parameter count.
            let filter_index = buf.len() - 2;
            buf[filter_index] = 0x05;

            let mut cur = Cursor::new(&buf[..]);
            assert!(Subscribe::depacketize(&mut cur).is_err());
        }
    }
}
