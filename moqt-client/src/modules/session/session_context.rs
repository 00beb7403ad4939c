use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use crate::modules::errors::{SessionError, TerminationErrorCode};
use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::messages::control_messages::requests_blocked::RequestsBlocked;
use crate::modules::models::alias_map::AliasMap;
use crate::modules::models::requests::PendingRequest;
use crate::modules::models::request_id::RequestIdGenerator;
use crate::modules::models::track::{FullTrackName, Track};
use crate::modules::models::tuple::Tuple;
use crate::modules::publications::publication::Publication;
use crate::modules::session::enums::SessionEvent;
use crate::modules::session::options::SessionConfig;
use crate::modules::streams::stream_sender::StreamSender;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;

use std::sync::Arc;

/// State shared by the public API, the control reader, the stream readers
/// and the publications. Registries are mutated by the control reader and
/// the public API; stream readers only look up entries and feed object
/// queues.
pub(crate) struct SessionContext<T: TransportProtocol> {
    pub(crate) transport: T::Connection,
    pub(crate) control_sender: StreamSender<T>,
    pub(crate) config: SessionConfig,
    pub(crate) request_id: RequestIdGenerator,
    pub(crate) peer_max_request_id: AtomicU64,
    pub(crate) requests: tokio::sync::Mutex<HashMap<u64, PendingRequest>>,
    /// Track alias of active subscriptions to their request id.
    pub(crate) subscriptions: tokio::sync::Mutex<HashMap<u64, u64>>,
    pub(crate) alias_map: tokio::sync::Mutex<AliasMap>,
    pub(crate) tracks: tokio::sync::RwLock<HashMap<FullTrackName, Arc<Track>>>,
    pub(crate) publications: tokio::sync::Mutex<HashMap<u64, Publication<T>>>,
    pub(crate) announced_namespaces: tokio::sync::Mutex<HashSet<Tuple>>,
    pub(crate) announce_interests: tokio::sync::Mutex<HashSet<Tuple>>,
    pub(crate) event_sender: tokio::sync::mpsc::UnboundedSender<SessionEvent>,
    pub(crate) cancellation: CancellationToken,
    destroyed: AtomicBool,
}

impl<T: TransportProtocol> SessionContext<T> {
    pub(crate) fn new(
        transport: T::Connection,
        control_sender: StreamSender<T>,
        config: SessionConfig,
        event_sender: tokio::sync::mpsc::UnboundedSender<SessionEvent>,
        peer_max_request_id: u64,
    ) -> Self {
        let request_id = RequestIdGenerator::new(config.initial_request_id);
        Self {
            transport,
            control_sender,
            config,
            request_id,
            peer_max_request_id: AtomicU64::new(peer_max_request_id),
            requests: tokio::sync::Mutex::new(HashMap::new()),
            subscriptions: tokio::sync::Mutex::new(HashMap::new()),
            alias_map: tokio::sync::Mutex::new(AliasMap::new()),
            tracks: tokio::sync::RwLock::new(HashMap::new()),
            publications: tokio::sync::Mutex::new(HashMap::new()),
            announced_namespaces: tokio::sync::Mutex::new(HashSet::new()),
            announce_interests: tokio::sync::Mutex::new(HashSet::new()),
            event_sender,
            cancellation: CancellationToken::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<(), SessionError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(SessionError::Terminated);
        }
        Ok(())
    }

    pub(crate) async fn send_control(&self, message: &ControlMessage) -> Result<(), SessionError> {
        self.ensure_active()?;
        let bytes = message.packetize()?;
        self.control_sender
            .send(&bytes)
            .await
            .map_err(|error| SessionError::Internal(format!("control send failed: {error}")))?;
        tracing::debug!("sent control message: {:?}", message.message_type());
        Ok(())
    }

    /// Allocates the next request id, honoring the peer's MAX_REQUEST_ID.
    /// When blocked, a REQUESTS_BLOCKED frame is sent and the call fails
    /// fast.
    pub(crate) async fn allocate_request_id(&self) -> Result<u64, SessionError> {
        let next = self.request_id.peek();
        let ceiling = self.peer_max_request_id.load(Ordering::SeqCst);
        if next >= ceiling {
            let blocked = ControlMessage::RequestsBlocked(Box::new(RequestsBlocked::new(ceiling)));
            if let Err(error) = self.send_control(&blocked).await {
                tracing::warn!("failed to send requests blocked: {}", error);
            }
            return Err(SessionError::Internal(format!(
                "request id {next} is blocked by peer maximum {ceiling}"
            )));
        }
        Ok(self.request_id.next())
    }

    pub(crate) fn grant_request_ids(&self, maximum: u64) {
        self.peer_max_request_id.fetch_max(maximum, Ordering::SeqCst);
    }

    /// Removes a subscription from all three registries.
    pub(crate) async fn evict_subscription(&self, request_id: u64, track_alias: u64) {
        self.requests.lock().await.remove(&request_id);
        self.subscriptions.lock().await.remove(&track_alias);
        self.alias_map.lock().await.remove_by_alias(track_alias);
    }

    /// Idempotent teardown: cancels every task, closes the transport,
    /// clears the registries (resolving outstanding request futures by
    /// dropping their one-shot senders) and emits the termination event
    /// once.
    pub(crate) async fn disconnect(&self, code: TerminationErrorCode, reason: &str) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("disconnecting session: {}", reason);
        self.cancellation.cancel();
        self.transport.close(code.into(), reason.as_bytes());

        for (_, publication) in self.publications.lock().await.drain() {
            publication.cancel();
        }
        self.requests.lock().await.clear();
        self.subscriptions.lock().await.clear();
        self.alias_map.lock().await.clear();
        self.announced_namespaces.lock().await.clear();
        self.announce_interests.lock().await.clear();

        let _ = self.event_sender.send(SessionEvent::Terminated {
            reason: reason.to_string(),
        });
    }

    pub(crate) fn emit_event(&self, event: SessionEvent) {
        if self.event_sender.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}
