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
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FetchType {
    StandAlone = 0x1,
    /// Joining fetch whose start group is relative to the joining
    /// subscription's largest group.
    Relative = 0x2,
    /// Joining fetch whose start group is absolute.
    Absolute = 0x3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandAloneFetchProps {
    pub full_track_name: FullTrackName,
    pub start_location: Location,
    pub end_location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoiningFetchProps {
    pub joining_request_id: u64,
    pub joining_start: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    pub request_id: u64,
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,
    pub fetch_type: FetchType,
    pub standalone_fetch_props: Option<StandAloneFetchProps>,
    pub joining_fetch_props: Option<JoiningFetchProps>,
    pub parameters: Vec<KeyValuePair>,
}

impl Fetch {
    pub fn try_new(
        request_id: u64,
        subscriber_priority: u8,
        group_order: GroupOrder,
        fetch_type: FetchType,
        standalone_fetch_props: Option<StandAloneFetchProps>,
        joining_fetch_props: Option<JoiningFetchProps>,
        parameters: Vec<KeyValuePair>,
    ) -> Result<Self, CodecError> {
        match fetch_type {
            FetchType::StandAlone => {
                if standalone_fetch_props.is_none() || joining_fetch_props.is_some() {
                    return Err(CodecError::InvalidType {
                        field: "fetch type",
                        value: u8::from(fetch_type) as u64,
                    });
                }
            }
            FetchType::Relative | FetchType::Absolute => {
                if standalone_fetch_props.is_some() || joining_fetch_props.is_none() {
                    return Err(CodecError::InvalidType {
                        field: "fetch type",
                        value: u8::from(fetch_type) as u64,
                    });
                }
            }
        }
        Ok(Self {
            request_id,
            subscriber_priority,
            group_order,
            fetch_type,
            standalone_fetch_props,
            joining_fetch_props,
            parameters,
        })
    }
}

impl MOQTPayload for Fetch {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let subscriber_priority = read_u8(cur)?;
        let group_order_u8 = read_u8(cur)?;
        let group_order =
            GroupOrder::try_from(group_order_u8).map_err(|_| CodecError::InvalidType {
                field: "group order",
                value: group_order_u8 as u64,
            })?;
        let fetch_type_value = read_variable_integer(cur)?;
        let fetch_type = u8::try_from(fetch_type_value)
            .ok()
            .and_then(|v| FetchType::try_from(v).ok())
            .ok_or(CodecError::InvalidType {
                field: "fetch type",
                value: fetch_type_value,
            })?;
        let (standalone_fetch_props, joining_fetch_props) = match fetch_type {
            FetchType::StandAlone => {
                let full_track_name = FullTrackName::depacketize(cur)?;
                let start_location = Location::depacketize(cur)?;
                let end_location = Location::depacketize(cur)?;
                (
                    Some(StandAloneFetchProps {
                        full_track_name,
                        start_location,
                        end_location,
                    }),
                    None,
                )
            }
            FetchType::Relative | FetchType::Absolute => {
                let joining_request_id = read_variable_integer(cur)?;
                let joining_start = read_variable_integer(cur)?;
                (
                    None,
                    Some(JoiningFetchProps {
                        joining_request_id,
                        joining_start,
                    }),
                )
            }
        };
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            subscriber_priority,
            group_order,
            fetch_type,
            standalone_fetch_props,
            joining_fetch_props,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        buf.extend(self.subscriber_priority.to_be_bytes());
        buf.extend(u8::from(self.group_order).to_be_bytes());
        buf.extend(write_variable_integer(u8::from(self.fetch_type) as u64));
        match self.fetch_type {
            FetchType::StandAlone => {
                let props = self
                    .standalone_fetch_props
                    .as_ref()
                    .expect("validated at construction");
                props.full_track_name.packetize(buf);
                props.start_location.packetize(buf);
                props.end_location.packetize(buf);
            }
            FetchType::Relative | FetchType::Absolute => {
                let props = self
                    .joining_fetch_props
                    .as_ref()
                    .expect("validated at construction");
                buf.extend(write_variable_integer(props.joining_request_id));
                buf.extend(write_variable_integer(props.joining_start));
            }
        }
        write_parameters(buf, &self.parameters);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{Bytes, BytesMut};

    use crate::modules::messages::control_messages::fetch::{
        Fetch, FetchType, JoiningFetchProps, StandAloneFetchProps,
    };
    use crate::modules::messages::control_messages::group_order::GroupOrder;
    use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::moqt_payload::MOQTPayload;
    use crate::modules::models::track::FullTrackName;
    use crate::modules::models::tuple::Tuple;

    #[test]
    fn round_trip_standalone() {
        let fetch = Fetch::try_new(
            3,
            64,
            GroupOrder::Original,
            FetchType::StandAlone,
            Some(StandAloneFetchProps {
                full_track_name: FullTrackName::try_new(
                    Tuple::from_utf8_path("moqtail/r1"),
                    Bytes::from_static(b"video"),
                )
                .unwrap(),
                start_location: Location::new(10, 0),
                end_location: Location::new(10, 4),
            }),
            None,
            vec![],
        )
        .unwrap();

        let mut buf = BytesMut::new();
        fetch.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(Fetch::depacketize(&mut cur).unwrap(), fetch);
    }

    #[test]
    fn round_trip_joining() {
        let fetch = Fetch::try_new(
            161803,
            15,
            GroupOrder::Descending,
            FetchType::Absolute,
            None,
            Some(JoiningFetchProps {
                joining_request_id: 119,
                joining_start: 73,
            }),
            vec![
                KeyValuePair::try_new_varint(4444, 12321).unwrap(),
                KeyValuePair::try_new_bytes(1, Bytes::from_static(b"fetch me ok")).unwrap(),
            ],
        )
        .unwrap();

        let mut buf = BytesMut::new();
        fetch.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(Fetch::depacketize(&mut cur).unwrap(), fetch);
    }

    #[test]
    fn standalone_requires_props() {
        let fetch = Fetch::try_new(
            0,
            0,
            GroupOrder::Ascending,
            FetchType::StandAlone,
            None,
            Some(JoiningFetchProps {
                joining_request_id: 0,
                joining_start: 0,
            }),
            vec![],
        );
        assert!(fetch.is_err());
    }
}
