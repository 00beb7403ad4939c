use std::io::Cursor;

use bytes::{Buf, BytesMut};

use crate::modules::errors::CodecError;
use crate::modules::messages::control_message_type::ControlMessageType;
use crate::modules::messages::control_messages::client_setup::ClientSetup;
use crate::modules::messages::control_messages::fetch::Fetch;
use crate::modules::messages::control_messages::fetch_cancel::FetchCancel;
use crate::modules::messages::control_messages::fetch_ok::FetchOk;
use crate::modules::messages::control_messages::goaway::GoAway;
use crate::modules::messages::control_messages::max_request_id::MaxRequestId;
use crate::modules::messages::control_messages::namespace_ok::NamespaceOk;
use crate::modules::messages::control_messages::publish_namespace::PublishNamespace;
use crate::modules::messages::control_messages::publish_namespace_cancel::PublishNamespaceCancel;
use crate::modules::messages::control_messages::publish_namespace_done::PublishNamespaceDone;
use crate::modules::messages::control_messages::request_error::RequestError;
use crate::modules::messages::control_messages::requests_blocked::RequestsBlocked;
use crate::modules::messages::control_messages::server_setup::ServerSetup;
use crate::modules::messages::control_messages::subscribe::Subscribe;
use crate::modules::messages::control_messages::subscribe_announces::SubscribeAnnounces;
use crate::modules::messages::control_messages::subscribe_done::SubscribeDone;
use crate::modules::messages::control_messages::subscribe_error::SubscribeError;
use crate::modules::messages::control_messages::subscribe_ok::SubscribeOk;
use crate::modules::messages::control_messages::subscribe_update::SubscribeUpdate;
use crate::modules::messages::control_messages::track_status::TrackStatus;
use crate::modules::messages::control_messages::track_status_request::TrackStatusRequest;
use crate::modules::messages::control_messages::unsubscribe::Unsubscribe;
use crate::modules::messages::control_messages::unsubscribe_announces::UnsubscribeAnnounces;
use crate::modules::messages::control_messages::util::{create_full_message, read_message_type};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::read_u16;

/// A fully framed control message: tagged union of everything that can
/// travel on the bidirectional control stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    ClientSetup(Box<ClientSetup>),
    ServerSetup(Box<ServerSetup>),
    GoAway(Box<GoAway>),
    MaxRequestId(Box<MaxRequestId>),
    RequestsBlocked(Box<RequestsBlocked>),
    Subscribe(Box<Subscribe>),
    SubscribeOk(Box<SubscribeOk>),
    SubscribeError(Box<SubscribeError>),
    SubscribeUpdate(Box<SubscribeUpdate>),
    SubscribeDone(Box<SubscribeDone>),
    Unsubscribe(Box<Unsubscribe>),
    Fetch(Box<Fetch>),
    FetchOk(Box<FetchOk>),
    FetchError(Box<RequestError>),
    FetchCancel(Box<FetchCancel>),
    PublishNamespace(Box<PublishNamespace>),
    PublishNamespaceOk(Box<NamespaceOk>),
    PublishNamespaceError(Box<RequestError>),
    PublishNamespaceDone(Box<PublishNamespaceDone>),
    PublishNamespaceCancel(Box<PublishNamespaceCancel>),
    SubscribeAnnounces(Box<SubscribeAnnounces>),
    SubscribeAnnouncesOk(Box<NamespaceOk>),
    SubscribeAnnouncesError(Box<RequestError>),
    UnsubscribeAnnounces(Box<UnsubscribeAnnounces>),
    TrackStatusRequest(Box<TrackStatusRequest>),
    TrackStatus(Box<TrackStatus>),
}

impl ControlMessage {
    pub fn message_type(&self) -> ControlMessageType {
        match self {
            Self::ClientSetup(_) => ControlMessageType::ClientSetup,
            Self::ServerSetup(_) => ControlMessageType::ServerSetup,
            Self::GoAway(_) => ControlMessageType::GoAway,
            Self::MaxRequestId(_) => ControlMessageType::MaxRequestId,
            Self::RequestsBlocked(_) => ControlMessageType::RequestsBlocked,
            Self::Subscribe(_) => ControlMessageType::Subscribe,
            Self::SubscribeOk(_) => ControlMessageType::SubscribeOk,
            Self::SubscribeError(_) => ControlMessageType::SubscribeError,
            Self::SubscribeUpdate(_) => ControlMessageType::SubscribeUpdate,
            Self::SubscribeDone(_) => ControlMessageType::SubscribeDone,
            Self::Unsubscribe(_) => ControlMessageType::Unsubscribe,
            Self::Fetch(_) => ControlMessageType::Fetch,
            Self::FetchOk(_) => ControlMessageType::FetchOk,
            Self::FetchError(_) => ControlMessageType::FetchError,
            Self::FetchCancel(_) => ControlMessageType::FetchCancel,
            Self::PublishNamespace(_) => ControlMessageType::PublishNamespace,
            Self::PublishNamespaceOk(_) => ControlMessageType::PublishNamespaceOk,
            Self::PublishNamespaceError(_) => ControlMessageType::PublishNamespaceError,
            Self::PublishNamespaceDone(_) => ControlMessageType::PublishNamespaceDone,
            Self::PublishNamespaceCancel(_) => ControlMessageType::PublishNamespaceCancel,
            Self::SubscribeAnnounces(_) => ControlMessageType::SubscribeAnnounces,
            Self::SubscribeAnnouncesOk(_) => ControlMessageType::SubscribeAnnouncesOk,
            Self::SubscribeAnnouncesError(_) => ControlMessageType::SubscribeAnnouncesError,
            Self::UnsubscribeAnnounces(_) => ControlMessageType::UnsubscribeAnnounces,
            Self::TrackStatusRequest(_) => ControlMessageType::TrackStatusRequest,
            Self::TrackStatus(_) => ControlMessageType::TrackStatus,
        }
    }

    /// Serializes the message with its `varint(type) u16(length)` frame.
    pub fn packetize(&self) -> Result<BytesMut, CodecError> {
        let mut payload = BytesMut::new();
        match self {
            Self::ClientSetup(m) => m.packetize(&mut payload),
            Self::ServerSetup(m) => m.packetize(&mut payload),
            Self::GoAway(m) => m.packetize(&mut payload),
            Self::MaxRequestId(m) => m.packetize(&mut payload),
            Self::RequestsBlocked(m) => m.packetize(&mut payload),
            Self::Subscribe(m) => m.packetize(&mut payload),
            Self::SubscribeOk(m) => m.packetize(&mut payload),
            Self::SubscribeError(m) => m.packetize(&mut payload),
            Self::SubscribeUpdate(m) => m.packetize(&mut payload),
            Self::SubscribeDone(m) => m.packetize(&mut payload),
            Self::Unsubscribe(m) => m.packetize(&mut payload),
            Self::Fetch(m) => m.packetize(&mut payload),
            Self::FetchOk(m) => m.packetize(&mut payload),
            Self::FetchError(m) => m.packetize(&mut payload),
            Self::FetchCancel(m) => m.packetize(&mut payload),
            Self::PublishNamespace(m) => m.packetize(&mut payload),
            Self::PublishNamespaceOk(m) => m.packetize(&mut payload),
            Self::PublishNamespaceError(m) => m.packetize(&mut payload),
            Self::PublishNamespaceDone(m) => m.packetize(&mut payload),
            Self::PublishNamespaceCancel(m) => m.packetize(&mut payload),
            Self::SubscribeAnnounces(m) => m.packetize(&mut payload),
            Self::SubscribeAnnouncesOk(m) => m.packetize(&mut payload),
            Self::SubscribeAnnouncesError(m) => m.packetize(&mut payload),
            Self::UnsubscribeAnnounces(m) => m.packetize(&mut payload),
            Self::TrackStatusRequest(m) => m.packetize(&mut payload),
            Self::TrackStatus(m) => m.packetize(&mut payload),
        }
        create_full_message(self.message_type(), payload)
    }

    /// Parses one framed control message. Rewinds the cursor when the frame
    /// is still incomplete (`NotEnoughBytes`) so the caller can retry after
    /// more bytes arrive.
    pub fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let checkpoint = cur.position();
        let result = Self::depacketize_inner(cur);
        if matches!(result, Err(CodecError::NotEnoughBytes { .. })) {
            cur.set_position(checkpoint);
        }
        result
    }

    fn depacketize_inner(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let message_type = read_message_type(cur)?;
        let payload_length = read_u16(cur)? as usize;
        if cur.remaining() < payload_length {
            return Err(CodecError::NotEnoughBytes {
                have: cur.remaining(),
                need: payload_length,
            });
        }
        let payload_start = cur.position() as usize;
        let underlying: &[u8] = cur.get_ref();
        let payload = &underlying[payload_start..payload_start + payload_length];
        let mut payload_cur = Cursor::new(payload);

        let message = match message_type {
            ControlMessageType::ClientSetup => {
                Self::ClientSetup(Box::new(ClientSetup::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::ServerSetup => {
                Self::ServerSetup(Box::new(ServerSetup::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::GoAway => {
                Self::GoAway(Box::new(GoAway::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::MaxRequestId => {
                Self::MaxRequestId(Box::new(MaxRequestId::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::RequestsBlocked => {
                Self::RequestsBlocked(Box::new(RequestsBlocked::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::Subscribe => {
                Self::Subscribe(Box::new(Subscribe::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::SubscribeOk => {
                Self::SubscribeOk(Box::new(SubscribeOk::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::SubscribeError => {
                Self::SubscribeError(Box::new(SubscribeError::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::SubscribeUpdate => {
                Self::SubscribeUpdate(Box::new(SubscribeUpdate::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::SubscribeDone => {
                Self::SubscribeDone(Box::new(SubscribeDone::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::Unsubscribe => {
                Self::Unsubscribe(Box::new(Unsubscribe::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::Fetch => {
                Self::Fetch(Box::new(Fetch::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::FetchOk => {
                Self::FetchOk(Box::new(FetchOk::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::FetchError => {
                Self::FetchError(Box::new(RequestError::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::FetchCancel => {
                Self::FetchCancel(Box::new(FetchCancel::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::PublishNamespace => {
                Self::PublishNamespace(Box::new(PublishNamespace::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::PublishNamespaceOk => {
                Self::PublishNamespaceOk(Box::new(NamespaceOk::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::PublishNamespaceError => {
                Self::PublishNamespaceError(Box::new(RequestError::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::PublishNamespaceDone => Self::PublishNamespaceDone(Box::new(
                PublishNamespaceDone::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::PublishNamespaceCancel => Self::PublishNamespaceCancel(Box::new(
                PublishNamespaceCancel::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::SubscribeAnnounces => Self::SubscribeAnnounces(Box::new(
                SubscribeAnnounces::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::SubscribeAnnouncesOk => {
                Self::SubscribeAnnouncesOk(Box::new(NamespaceOk::depacketize(&mut payload_cur)?))
            }
            ControlMessageType::SubscribeAnnouncesError => Self::SubscribeAnnouncesError(Box::new(
                RequestError::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::UnsubscribeAnnounces => Self::UnsubscribeAnnounces(Box::new(
                UnsubscribeAnnounces::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::TrackStatusRequest => Self::TrackStatusRequest(Box::new(
                TrackStatusRequest::depacketize(&mut payload_cur)?,
            )),
            ControlMessageType::TrackStatus => {
                Self::TrackStatus(Box::new(TrackStatus::depacketize(&mut payload_cur)?))
            }
        };

        let consumed = payload_cur.position() as usize;
        if consumed != payload_length {
            return Err(CodecError::LengthExceedsMax {
                field: "control message payload",
                len: consumed,
                max: payload_length,
            });
        }
        cur.advance(payload_length);
        Ok(message)
    }
}
