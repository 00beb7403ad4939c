use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding wire formats.
///
/// `NotEnoughBytes` is the only non-fatal variant: receive loops treat it as
/// "wait for more bytes and retry" and leave the receive buffer untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("not enough bytes: have {have}, need {need}")]
    NotEnoughBytes { have: usize, need: usize },
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsMax {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("invalid {field} value {value}")]
    InvalidType { field: &'static str, value: u64 },
    #[error("key-value pair type {key} does not match its value kind")]
    KeyValueFormatting { key: u64 },
    #[error("{field} does not fit its integer width")]
    Casting { field: &'static str },
}

/// Errors surfaced by the session engine and its public API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("track alias error: {0}")]
    TrackAlias(String),
    #[error("track name error: {0}")]
    TrackName(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("session terminated")]
    Terminated,
}

/// Session-level termination codes sent when closing the transport.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum TerminationErrorCode {
    NoError = 0x0,
    InternalError = 0x1,
    Unauthorized = 0x2,
    ProtocolViolation = 0x3,
    GoAway = 0x10,
}

/// Error codes carried by SUBSCRIBE_ERROR.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum SubscribeErrorCode {
    InternalError = 0x0,
    Unauthorized = 0x1,
    Timeout = 0x2,
    NotSupported = 0x3,
    TrackDoesNotExist = 0x4,
    InvalidRange = 0x5,
    RetryTrackAlias = 0x6,
    MalformedAuthToken = 0x10,
    UnknownAuthTokenAlias = 0x11,
    ExpiredAuthToken = 0x12,
}

/// Error codes carried by FETCH_ERROR.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum FetchErrorCode {
    InternalError = 0x0,
    Unauthorized = 0x1,
    Timeout = 0x2,
    NotSupported = 0x3,
    TrackDoesNotExist = 0x4,
    InvalidRange = 0x5,
    NoObjects = 0x6,
    MalformedAuthToken = 0x10,
    UnknownAuthTokenAlias = 0x11,
    ExpiredAuthToken = 0x12,
}

/// Error codes carried by PUBLISH_NAMESPACE_ERROR and SUBSCRIBE_ANNOUNCES_ERROR.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum NamespaceErrorCode {
    InternalError = 0x0,
    Unauthorized = 0x1,
    Timeout = 0x2,
    NotSupported = 0x3,
    Uninterested = 0x4,
    MalformedAuthToken = 0x10,
    UnknownAuthTokenAlias = 0x11,
    ExpiredAuthToken = 0x12,
}
