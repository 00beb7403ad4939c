use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Wire type codes of the control messages.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControlMessageType {
    SubscribeUpdate = 0x02,
    Subscribe = 0x03,
    SubscribeOk = 0x04,
    SubscribeError = 0x05,
    PublishNamespace = 0x06,
    PublishNamespaceOk = 0x07,
    PublishNamespaceError = 0x08,
    PublishNamespaceDone = 0x09,
    Unsubscribe = 0x0A,
    SubscribeDone = 0x0B,
    PublishNamespaceCancel = 0x0C,
    TrackStatusRequest = 0x0D,
    TrackStatus = 0x0E,
    GoAway = 0x10,
    SubscribeAnnounces = 0x11,
    SubscribeAnnouncesOk = 0x12,
    SubscribeAnnouncesError = 0x13,
    UnsubscribeAnnounces = 0x14,
    MaxRequestId = 0x15,
    Fetch = 0x16,
    FetchCancel = 0x17,
    FetchOk = 0x18,
    FetchError = 0x19,
    RequestsBlocked = 0x1A,
    ClientSetup = 0x20,
    ServerSetup = 0x21,
}
