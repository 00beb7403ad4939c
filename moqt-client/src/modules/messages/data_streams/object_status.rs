use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Status of an object transmitted without a payload.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum ObjectStatus {
    Normal = 0x0,
    DoesNotExist = 0x1,
    EndOfGroup = 0x3,
    EndOfTrack = 0x4,
}
