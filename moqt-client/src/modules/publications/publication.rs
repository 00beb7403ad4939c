use std::sync::Arc;

use crate::modules::publications::fetch_publication::FetchPublication;
use crate::modules::publications::subscribe_publication::SubscribePublication;
use crate::modules::transport::protocol::TransportProtocol;

/// An active outbound delivery, keyed in the session by the incoming
/// request id.
pub(crate) enum Publication<T: TransportProtocol> {
    Subscribe(Arc<SubscribePublication<T>>),
    Fetch(Arc<FetchPublication>),
}

impl<T: TransportProtocol> Publication<T> {
    pub(crate) fn cancel(&self) {
        match self {
            Self::Subscribe(publication) => publication.cancel(),
            Self::Fetch(publication) => publication.cancel(),
        }
    }
}
