use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::modules::messages::control_messages::location::Location;
use crate::modules::models::moqt_object::MoqtObject;

/// Peer-level rejection of a request, returned as a value rather than an
/// error: the session stays healthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRejection {
    pub error_code: u64,
    pub reason_phrase: String,
}

/// An accepted subscription: a lazy stream of objects fed by the incoming
/// data streams. Dropping it releases the backpressure queue; the session
/// keeps forwarding state until the subscription finishes or is
/// unsubscribed.
#[derive(Debug)]
pub struct Subscription {
    pub request_id: u64,
    pub track_alias: u64,
    /// Publisher's largest location at accept time, when known.
    pub largest_location: Option<Location>,
    pub(crate) objects: mpsc::Receiver<MoqtObject>,
}

impl Subscription {
    /// Next object, in per-stream reception order. `None` once the
    /// subscription has ended and the queue is drained.
    pub async fn next_object(&mut self) -> Option<MoqtObject> {
        self.objects.recv().await
    }

    pub fn into_stream(self) -> ReceiverStream<MoqtObject> {
        ReceiverStream::new(self.objects)
    }
}

/// An accepted fetch: a finite stream of past objects that ends when the
/// publisher finishes the fetch data stream.
#[derive(Debug)]
pub struct FetchStream {
    pub request_id: u64,
    pub(crate) objects: mpsc::Receiver<MoqtObject>,
}

impl FetchStream {
    pub async fn next_object(&mut self) -> Option<MoqtObject> {
        self.objects.recv().await
    }

    pub fn into_stream(self) -> ReceiverStream<MoqtObject> {
        ReceiverStream::new(self.objects)
    }
}

/// Outcome of `Session::subscribe`.
#[derive(Debug)]
pub enum SubscribeResult {
    Accepted(Subscription),
    Rejected(RequestRejection),
}

/// Outcome of `Session::fetch`.
#[derive(Debug)]
pub enum FetchResult {
    Accepted(FetchStream),
    Rejected(RequestRejection),
}

/// Outcome of the namespace-level requests.
#[derive(Debug, PartialEq, Eq)]
pub enum NamespaceResult {
    Accepted,
    Rejected(RequestRejection),
}

/// Answer to a TRACK_STATUS_REQUEST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackStatusInfo {
    pub status_code: u64,
    pub largest_location: Location,
}
