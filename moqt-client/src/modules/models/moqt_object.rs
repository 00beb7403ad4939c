use bytes::Bytes;

use crate::modules::errors::SessionError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::data_streams::datagram_object::DatagramObject;
use crate::modules::messages::data_streams::fetch_object::FetchObject;
use crate::modules::messages::data_streams::object_status::ObjectStatus;
use crate::modules::messages::data_streams::subgroup_header::SubgroupHeader;
use crate::modules::messages::data_streams::subgroup_object::SubgroupObject;
use crate::modules::models::track::{ForwardingPreference, FullTrackName};

/// Transport-independent view of one object, as handed to and received
/// from the caller.
///
/// Invariants, enforced at construction:
/// - status is `Normal` iff a payload is present;
/// - a subgroup id is present iff the forwarding preference is `Subgroup`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoqtObject {
    pub full_track_name: FullTrackName,
    pub location: Location,
    pub publisher_priority: u8,
    pub forwarding_preference: ForwardingPreference,
    pub subgroup_id: Option<u64>,
    pub object_status: ObjectStatus,
    pub extension_headers: Option<Vec<KeyValuePair>>,
    pub payload: Option<Bytes>,
}

impl MoqtObject {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        full_track_name: FullTrackName,
        location: Location,
        publisher_priority: u8,
        forwarding_preference: ForwardingPreference,
        subgroup_id: Option<u64>,
        object_status: ObjectStatus,
        extension_headers: Option<Vec<KeyValuePair>>,
        payload: Option<Bytes>,
    ) -> Result<Self, SessionError> {
        if (object_status == ObjectStatus::Normal) != payload.is_some() {
            return Err(SessionError::ProtocolViolation(format!(
                "object status {:?} does not match payload presence",
                object_status
            )));
        }
        if (forwarding_preference == ForwardingPreference::Subgroup) != subgroup_id.is_some() {
            return Err(SessionError::ProtocolViolation(
                "subgroup id must be present exactly for subgroup forwarding".to_string(),
            ));
        }
        Ok(Self {
            full_track_name,
            location,
            publisher_priority,
            forwarding_preference,
            subgroup_id,
            object_status,
            extension_headers,
            payload,
        })
    }

    pub(crate) fn try_from_subgroup(
        header: &SubgroupHeader,
        object: SubgroupObject,
        first_object_id: u64,
        full_track_name: FullTrackName,
    ) -> Result<Self, SessionError> {
        let subgroup_id = header.effective_subgroup_id(first_object_id);
        let object_status = object.object_status.unwrap_or(ObjectStatus::Normal);
        let payload = match object_status {
            ObjectStatus::Normal => Some(object.payload.unwrap_or_default()),
            _ => None,
        };
        Self::try_new(
            full_track_name,
            Location::new(header.group_id, object.object_id),
            header.publisher_priority,
            ForwardingPreference::Subgroup,
            Some(subgroup_id),
            object_status,
            object.extension_headers,
            payload,
        )
    }

    pub(crate) fn try_from_fetch(
        object: FetchObject,
        full_track_name: FullTrackName,
    ) -> Result<Self, SessionError> {
        let object_status = object.object_status.unwrap_or(ObjectStatus::Normal);
        let payload = match object_status {
            ObjectStatus::Normal => Some(object.payload.unwrap_or_default()),
            _ => None,
        };
        let extension_headers = if object.extension_headers.is_empty() {
            None
        } else {
            Some(object.extension_headers)
        };
        Self::try_new(
            full_track_name,
            Location::new(object.group_id, object.object_id),
            object.publisher_priority,
            ForwardingPreference::Subgroup,
            Some(object.subgroup_id),
            object_status,
            extension_headers,
            payload,
        )
    }

    pub(crate) fn try_from_datagram(
        datagram: DatagramObject,
        full_track_name: FullTrackName,
    ) -> Result<Self, SessionError> {
        let object_status = datagram.object_status.unwrap_or(ObjectStatus::Normal);
        Self::try_new(
            full_track_name,
            Location::new(datagram.group_id, datagram.object_id),
            datagram.publisher_priority,
            ForwardingPreference::Datagram,
            None,
            object_status,
            datagram.extension_headers,
            datagram.payload,
        )
    }

    pub(crate) fn to_subgroup_object(&self) -> SubgroupObject {
        SubgroupObject {
            object_id: self.location.object,
            extension_headers: self.extension_headers.clone(),
            object_status: match self.object_status {
                ObjectStatus::Normal => None,
                other => Some(other),
            },
            payload: self.payload.clone(),
        }
    }

    pub(crate) fn to_fetch_object(&self) -> FetchObject {
        FetchObject {
            group_id: self.location.group,
            subgroup_id: self.subgroup_id.unwrap_or(0),
            object_id: self.location.object,
            publisher_priority: self.publisher_priority,
            extension_headers: self.extension_headers.clone().unwrap_or_default(),
            object_status: match self.object_status {
                ObjectStatus::Normal => None,
                other => Some(other),
            },
            payload: self.payload.clone(),
        }
    }

    pub(crate) fn to_datagram_object(&self, track_alias: u64) -> DatagramObject {
        DatagramObject {
            track_alias,
            group_id: self.location.group,
            object_id: self.location.object,
            publisher_priority: self.publisher_priority,
            extension_headers: self.extension_headers.clone(),
            object_status: match self.object_status {
                ObjectStatus::Normal => None,
                other => Some(other),
            },
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::modules::errors::SessionError;
    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::data_streams::object_status::ObjectStatus;
    use crate::modules::messages::data_streams::subgroup_header::{
        SubgroupHeader, SubgroupHeaderType,
    };
    use crate::modules::messages::data_streams::subgroup_object::SubgroupObject;
    use crate::modules::models::moqt_object::MoqtObject;
    use crate::modules::models::track::{ForwardingPreference, FullTrackName};
    use crate::modules::models::tuple::Tuple;

    fn full_track_name() -> FullTrackName {
        FullTrackName::try_new(
            Tuple::from_utf8_path("moqtail/r1/u1"),
            Bytes::from_static(b"video"),
        )
        .unwrap()
    }

    #[test]
    fn status_payload_invariant() {
        let err = MoqtObject::try_new(
            full_track_name(),
            Location::new(0, 0),
            0,
            ForwardingPreference::Subgroup,
            Some(0),
            ObjectStatus::Normal,
            None,
            None,
        );
        assert!(matches!(err, Err(SessionError::ProtocolViolation(_))));

        let err = MoqtObject::try_new(
            full_track_name(),
            Location::new(0, 0),
            0,
            ForwardingPreference::Subgroup,
            Some(0),
            ObjectStatus::EndOfGroup,
            None,
            Some(Bytes::from_static(b"x")),
        );
        assert!(matches!(err, Err(SessionError::ProtocolViolation(_))));
    }

    #[test]
    fn subgroup_id_invariant() {
        let err = MoqtObject::try_new(
            full_track_name(),
            Location::new(0, 0),
            0,
            ForwardingPreference::Datagram,
            Some(0),
            ObjectStatus::Normal,
            None,
            Some(Bytes::from_static(b"x")),
        );
        assert!(matches!(err, Err(SessionError::ProtocolViolation(_))));
    }

    #[test]
    fn from_subgroup_uses_first_object_id_for_implicit_types() {
        let header = SubgroupHeader::try_new(
            SubgroupHeaderType::ImplicitFirstObject,
            1,
            4,
            None,
            128,
        )
        .unwrap();
        let object = SubgroupObject::try_new(9, None, None, Some(Bytes::from_static(b"p")))
            .unwrap();

        let moqt_object =
            MoqtObject::try_from_subgroup(&header, object, 9, full_track_name()).unwrap();
        assert_eq!(moqt_object.subgroup_id, Some(9));
        assert_eq!(moqt_object.location, Location::new(4, 9));
    }

    #[test]
    fn subgroup_round_trip_through_wire_form() {
        let object = MoqtObject::try_new(
            full_track_name(),
            Location::new(2, 3),
            128,
            ForwardingPreference::Subgroup,
            Some(0),
            ObjectStatus::Normal,
            None,
            Some(Bytes::from_static(b"frame")),
        )
        .unwrap();

        let wire = object.to_subgroup_object();
        assert_eq!(wire.object_id, 3);
        assert_eq!(wire.payload.as_deref(), Some(b"frame".as_slice()));
        assert_eq!(wire.object_status, None);
    }
}
