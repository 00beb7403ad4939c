use std::io::Cursor;

use bytes::BytesMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use crate::modules::errors::CodecError;
use crate::modules::variable_integer::{read_u8, read_variable_integer, write_variable_integer};

//  +======+===============+=================+============+
//  | Type | Subgroup ID   | Subgroup ID     | Extensions |
//  +======+===============+=================+============+
//  |      | Field Present | Value           | Present    |
//  +------+---------------+-----------------+------------+
//  | 0x08 | No            | 0               | No         |
//  +------+---------------+-----------------+------------+
//  | 0x09 | No            | 0               | Yes        |
//  +------+---------------+-----------------+------------+
//  | 0x0A | No            | First Object ID | No         |
//  +------+---------------+-----------------+------------+
//  | 0x0B | No            | First Object ID | Yes        |
//  +------+---------------+-----------------+------------+
//  | 0x0C | Yes           | Header Field    | No         |
//  +------+---------------+-----------------+------------+
//  | 0x0D | Yes           | Header Field    | Yes        |
//  +------+---------------+-----------------+------------+

/// How a subgroup header conveys its subgroup id.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum SubgroupIdKind {
    ImplicitZero,
    ImplicitFirstObject,
    Explicit,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum SubgroupHeaderType {
    ImplicitZero = 0x08,
    ImplicitZeroWithExtensions = 0x09,
    ImplicitFirstObject = 0x0A,
    ImplicitFirstObjectWithExtensions = 0x0B,
    Explicit = 0x0C,
    ExplicitWithExtensions = 0x0D,
}

impl SubgroupHeaderType {
    /// Selects the header type from its two orthogonal properties.
    pub fn from_flags(has_extensions: bool, subgroup_id_kind: SubgroupIdKind) -> Self {
        match (subgroup_id_kind, has_extensions) {
            (SubgroupIdKind::ImplicitZero, false) => Self::ImplicitZero,
            (SubgroupIdKind::ImplicitZero, true) => Self::ImplicitZeroWithExtensions,
            (SubgroupIdKind::ImplicitFirstObject, false) => Self::ImplicitFirstObject,
            (SubgroupIdKind::ImplicitFirstObject, true) => Self::ImplicitFirstObjectWithExtensions,
            (SubgroupIdKind::Explicit, false) => Self::Explicit,
            (SubgroupIdKind::Explicit, true) => Self::ExplicitWithExtensions,
        }
    }

    pub fn has_extensions(self) -> bool {
        matches!(
            self,
            Self::ImplicitZeroWithExtensions
                | Self::ImplicitFirstObjectWithExtensions
                | Self::ExplicitWithExtensions
        )
    }

    pub fn subgroup_id_kind(self) -> SubgroupIdKind {
        match self {
            Self::ImplicitZero | Self::ImplicitZeroWithExtensions => SubgroupIdKind::ImplicitZero,
            Self::ImplicitFirstObject | Self::ImplicitFirstObjectWithExtensions => {
                SubgroupIdKind::ImplicitFirstObject
            }
            Self::Explicit | Self::ExplicitWithExtensions => SubgroupIdKind::Explicit,
        }
    }
}

/// Header opening a unidirectional subgroup data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupHeader {
    pub header_type: SubgroupHeaderType,
    pub track_alias: u64,
    pub group_id: u64,
    /// Present iff `header_type` carries an explicit subgroup id.
    pub subgroup_id: Option<u64>,
    pub publisher_priority: u8,
}

impl SubgroupHeader {
    pub fn try_new(
        header_type: SubgroupHeaderType,
        track_alias: u64,
        group_id: u64,
        subgroup_id: Option<u64>,
        publisher_priority: u8,
    ) -> Result<Self, CodecError> {
        let explicit = header_type.subgroup_id_kind() == SubgroupIdKind::Explicit;
        if explicit != subgroup_id.is_some() {
            return Err(CodecError::InvalidType {
                field: "subgroup header type",
                value: u64::from(header_type),
            });
        }
        Ok(Self {
            header_type,
            track_alias,
            group_id,
            subgroup_id,
            publisher_priority,
        })
    }

    /// The subgroup id objects on this stream belong to, resolved with the
    /// id of the stream's first object per the header-type table.
    pub fn effective_subgroup_id(&self, first_object_id: u64) -> u64 {
        match self.header_type.subgroup_id_kind() {
            SubgroupIdKind::ImplicitZero => 0,
            SubgroupIdKind::ImplicitFirstObject => first_object_id,
            SubgroupIdKind::Explicit => self.subgroup_id.expect("validated at construction"),
        }
    }

    pub(crate) fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let type_value = read_variable_integer(cur)?;
        let header_type =
            SubgroupHeaderType::try_from(type_value).map_err(|_| CodecError::InvalidType {
                field: "subgroup header type",
                value: type_value,
            })?;
        let track_alias = read_variable_integer(cur)?;
        let group_id = read_variable_integer(cur)?;
        let subgroup_id = if header_type.subgroup_id_kind() == SubgroupIdKind::Explicit {
            Some(read_variable_integer(cur)?)
        } else {
            None
        };
        let publisher_priority = read_u8(cur)?;
        Ok(Self {
            header_type,
            track_alias,
            group_id,
            subgroup_id,
            publisher_priority,
        })
    }

    pub(crate) fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(u64::from(self.header_type)));
        buf.extend(write_variable_integer(self.track_alias));
        buf.extend(write_variable_integer(self.group_id));
        if let Some(subgroup_id) = self.subgroup_id {
            buf.extend(write_variable_integer(subgroup_id));
        }
        buf.extend(self.publisher_priority.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::errors::CodecError;
    use crate::modules::messages::data_streams::subgroup_header::{
        SubgroupHeader, SubgroupHeaderType, SubgroupIdKind,
    };

    #[test]
    fn type_flags_are_orthogonal() {
        for (has_extensions, kind, expected) in [
            (false, SubgroupIdKind::ImplicitZero, 0x08u64),
            (true, SubgroupIdKind::ImplicitZero, 0x09),
            (false, SubgroupIdKind::ImplicitFirstObject, 0x0A),
            (true, SubgroupIdKind::ImplicitFirstObject, 0x0B),
            (false, SubgroupIdKind::Explicit, 0x0C),
            (true, SubgroupIdKind::Explicit, 0x0D),
        ] {
            let header_type = SubgroupHeaderType::from_flags(has_extensions, kind);
            assert_eq!(u64::from(header_type), expected);
            assert_eq!(header_type.has_extensions(), has_extensions);
            assert_eq!(header_type.subgroup_id_kind(), kind);
        }
    }

    #[test]
    fn packetize_implicit_zero() {
        let header = SubgroupHeader::try_new(
            SubgroupHeaderType::ImplicitZero,
            2,
            0,
            None,
            128,
        )
        .unwrap();

        let mut buf = BytesMut::new();
        header.packetize(&mut buf);

        let expected_bytes_array = [
            0x08, // Header Type (i)
            2,    // Track Alias (i)
            0,    // Group ID (i)
            128,  // Publisher Priority (8)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());
    }

    #[test]
    fn round_trip_explicit() {
        let header = SubgroupHeader::try_new(
            SubgroupHeaderType::ExplicitWithExtensions,
            999,
            9,
            Some(11),
            255,
        )
        .unwrap();

        let mut buf = BytesMut::new();
        header.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(SubgroupHeader::depacketize(&mut cur).unwrap(), header);
    }

    #[test]
    fn effective_subgroup_id_derivation() {
        let implicit_zero =
            SubgroupHeader::try_new(SubgroupHeaderType::ImplicitZero, 1, 0, None, 0).unwrap();
        assert_eq!(implicit_zero.effective_subgroup_id(7), 0);

        let first_object =
            SubgroupHeader::try_new(SubgroupHeaderType::ImplicitFirstObject, 1, 0, None, 0)
                .unwrap();
        assert_eq!(first_object.effective_subgroup_id(7), 7);

        let explicit =
            SubgroupHeader::try_new(SubgroupHeaderType::Explicit, 1, 0, Some(100), 0).unwrap();
        assert_eq!(explicit.effective_subgroup_id(7), 100);
    }

    #[test]
    fn explicit_type_requires_subgroup_id() {
        assert!(matches!(
            SubgroupHeader::try_new(SubgroupHeaderType::Explicit, 1, 0, None, 0),
            Err(CodecError::InvalidType { .. })
        ));
        assert!(matches!(
            SubgroupHeader::try_new(SubgroupHeaderType::ImplicitZero, 1, 0, Some(0), 0),
            Err(CodecError::InvalidType { .. })
        ));
    }

    #[test]
    fn unknown_header_type() {
        let buf = [0x0Eu8, 0x01, 0x00, 0x80];
        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            SubgroupHeader::depacketize(&mut cur),
            Err(CodecError::InvalidType {
                field: "subgroup header type",
                value: 0x0E
            })
        );
    }
}
