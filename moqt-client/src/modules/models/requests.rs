use tokio::sync::{mpsc, oneshot};

use crate::modules::messages::control_messages::fetch_ok::FetchOk;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::namespace_ok::NamespaceOk;
use crate::modules::messages::control_messages::request_error::RequestError;
use crate::modules::messages::control_messages::subscribe_error::SubscribeError;
use crate::modules::messages::control_messages::subscribe_ok::SubscribeOk;
use crate::modules::messages::control_messages::track_status::TrackStatus;
use crate::modules::models::moqt_object::MoqtObject;
use crate::modules::models::track::FullTrackName;

/// Response resolved into a pending request's one-shot channel by the
/// control reader.
#[derive(Debug)]
pub(crate) enum ResponseMessage {
    SubscribeOk(SubscribeOk),
    SubscribeError(SubscribeError),
    FetchOk(FetchOk),
    FetchError(RequestError),
    NamespaceOk(NamespaceOk),
    NamespaceError(RequestError),
    TrackStatus(TrackStatus),
}

/// Mutable state of an in-flight or active subscription.
#[derive(Debug)]
pub(crate) struct SubscribeState {
    pub track_alias: u64,
    pub full_track_name: FullTrackName,
    pub start_location: Location,
    pub end_group: Option<u64>,
    pub forward: bool,
    pub subscriber_priority: u8,
    pub largest_location: Option<Location>,
    pub streams_accepted: u64,
    /// Set once SUBSCRIBE_DONE arrives; cleanup happens when
    /// `streams_accepted` reaches it.
    pub expected_streams: Option<u64>,
}

impl SubscribeState {
    /// Monotonic replacement of the largest seen location.
    pub(crate) fn record_location(&mut self, location: Location) {
        if self.largest_location.is_none_or(|largest| location > largest) {
            self.largest_location = Some(location);
        }
    }
}

pub(crate) struct SubscribeRecord {
    pub state: SubscribeState,
    pub response: Option<oneshot::Sender<ResponseMessage>>,
    pub object_sender: mpsc::Sender<MoqtObject>,
}

pub(crate) struct FetchRecord {
    pub full_track_name: FullTrackName,
    pub response: Option<oneshot::Sender<ResponseMessage>>,
    pub object_sender: mpsc::Sender<MoqtObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Subscribe,
    Fetch,
    PublishNamespace,
    SubscribeAnnounces,
    TrackStatus,
}

/// One entry of the in-flight request table, keyed by request id.
pub(crate) enum PendingRequest {
    Subscribe(SubscribeRecord),
    Fetch(FetchRecord),
    PublishNamespace {
        response: Option<oneshot::Sender<ResponseMessage>>,
    },
    SubscribeAnnounces {
        response: Option<oneshot::Sender<ResponseMessage>>,
    },
    TrackStatus {
        response: Option<oneshot::Sender<ResponseMessage>>,
    },
}

impl PendingRequest {
    /// Takes the one-shot response sender; `None` means the request was
    /// already resolved once, which the dispatcher treats as a duplicate
    /// response from the peer.
    pub(crate) fn take_response(&mut self) -> Option<oneshot::Sender<ResponseMessage>> {
        match self {
            Self::Subscribe(record) => record.response.take(),
            Self::Fetch(record) => record.response.take(),
            Self::PublishNamespace { response }
            | Self::SubscribeAnnounces { response }
            | Self::TrackStatus { response } => response.take(),
        }
    }

    pub(crate) fn as_subscribe(&self) -> Option<&SubscribeRecord> {
        match self {
            Self::Subscribe(record) => Some(record),
            _ => None,
        }
    }

    pub(crate) fn as_subscribe_mut(&mut self) -> Option<&mut SubscribeRecord> {
        match self {
            Self::Subscribe(record) => Some(record),
            _ => None,
        }
    }

    /// Which family of requests this entry belongs to, for response/request
    /// kind matching.
    pub(crate) fn kind(&self) -> RequestKind {
        match self {
            Self::Subscribe(_) => RequestKind::Subscribe,
            Self::Fetch(_) => RequestKind::Fetch,
            Self::PublishNamespace { .. } => RequestKind::PublishNamespace,
            Self::SubscribeAnnounces { .. } => RequestKind::SubscribeAnnounces,
            Self::TrackStatus { .. } => RequestKind::TrackStatus,
        }
    }

    pub(crate) fn as_fetch(&self) -> Option<&FetchRecord> {
        match self {
            Self::Fetch(record) => Some(record),
            _ => None,
        }
    }
}
