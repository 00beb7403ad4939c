use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Preferred group delivery order of a subscription or fetch.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GroupOrder {
    Original = 0x0,
    Ascending = 0x1,
    Descending = 0x2,
}
