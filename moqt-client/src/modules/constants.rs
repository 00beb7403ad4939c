/// Protocol version negotiated by default (draft-ietf-moq-transport-11).
pub const MOQ_TRANSPORT_VERSION: u64 = 0xff00000b;

/// Largest value a track alias may take (60 bits).
pub const MAX_TRACK_ALIAS: u64 = (1 << 60) - 1;

/// Largest value a request id may take (62 bits).
pub const MAX_REQUEST_ID: u64 = (1 << 62) - 1;

/// Control message payloads are length-prefixed with a u16.
pub const MAX_CONTROL_PAYLOAD_LENGTH: usize = 0xFFFF;

/// Upper bound on a reason phrase, in bytes.
pub const MAX_REASON_PHRASE_LENGTH: usize = 1024;

/// Upper bound on an odd-typed key-value pair value, in bytes.
pub const MAX_KEY_VALUE_BYTES_LENGTH: usize = 65535;

/// Upper bound on the number of namespace tuple fields.
pub const MAX_NAMESPACE_FIELDS: usize = 32;

/// Upper bound on the serialized size of a full track name, in bytes.
pub const MAX_FULL_TRACK_NAME_LENGTH: usize = 4096;

/// Stream type discriminator of a fetch data stream.
pub const FETCH_HEADER_TYPE: u64 = 0x05;
