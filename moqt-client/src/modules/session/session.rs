use std::io::Cursor;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::modules::constants::MAX_REQUEST_ID;
use crate::modules::errors::{SessionError, TerminationErrorCode};
use crate::modules::messages::control_messages::client_setup::ClientSetup;
use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::messages::control_messages::fetch::{Fetch, FetchType};
use crate::modules::messages::control_messages::fetch_cancel::FetchCancel;
use crate::modules::messages::control_messages::publish_namespace::PublishNamespace;
use crate::modules::messages::control_messages::publish_namespace_done::PublishNamespaceDone;
use crate::modules::messages::control_messages::server_setup::ServerSetup;
use crate::modules::messages::control_messages::setup_parameters::SetupParameter;
use crate::modules::messages::control_messages::subscribe::Subscribe;
use crate::modules::messages::control_messages::subscribe_announces::SubscribeAnnounces;
use crate::modules::messages::control_messages::subscribe_update::SubscribeUpdate;
use crate::modules::messages::control_messages::track_status_request::TrackStatusRequest;
use crate::modules::messages::control_messages::unsubscribe::Unsubscribe;
use crate::modules::messages::control_messages::unsubscribe_announces::UnsubscribeAnnounces;
use crate::modules::errors::CodecError;
use crate::modules::models::requests::{
    FetchRecord, PendingRequest, ResponseMessage, SubscribeRecord, SubscribeState,
};
use crate::modules::models::track::{FullTrackName, Track};
use crate::modules::models::tuple::Tuple;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::session::enums::SessionEvent;
use crate::modules::session::options::{
    FetchOption, SessionConfig, SubscribeOption, SubscribeUpdateOption,
};
use crate::modules::session::session_context::SessionContext;
use crate::modules::session::subscription::{
    FetchResult, FetchStream, NamespaceResult, RequestRejection, SubscribeResult, Subscription,
    TrackStatusInfo,
};
use crate::modules::session::threads::control_message_receive_thread::ControlMessageReceiveThread;
use crate::modules::session::threads::datagram_receive_thread::DatagramReceiveThread;
use crate::modules::session::threads::uni_stream_accept_thread::UniStreamAcceptThread;
use crate::modules::streams::stream_receiver::StreamReceiver;
use crate::modules::streams::stream_sender::StreamSender;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;
use crate::modules::transport::transport_connection_creator::TransportConnectionCreator;

/// One MoQT session over a WebTransport-like connection.
///
/// `connect` performs the handshake (ClientSetup, then exactly one
/// ServerSetup) and spawns the control reader, the unidirectional stream
/// acceptor and the datagram reader. All request APIs return peer
/// rejections as values; `SessionError` is reserved for local and
/// session-fatal failures.
pub struct Session<T: TransportProtocol> {
    context: Arc<SessionContext<T>>,
    event_receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
    control_thread: tokio::task::JoinHandle<()>,
    accept_thread: tokio::task::JoinHandle<()>,
    datagram_thread: tokio::task::JoinHandle<()>,
}

impl<T: TransportProtocol> Session<T> {
    pub async fn connect(
        creator: &T::ConnectionCreator,
        url: &Url,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let transport = creator
            .connect(url)
            .await
            .map_err(|error| SessionError::Internal(format!("transport connect failed: {error}")))?;
        let (send_stream, receive_stream) = transport
            .open_bi(i32::MAX)
            .await
            .map_err(|error| SessionError::Internal(format!("control stream open failed: {error}")))?;
        let control_sender = StreamSender::<T>::new(send_stream);
        let mut control_receiver = StreamReceiver::<T>::new(receive_stream);

        let mut setup_parameters = vec![SetupParameter::MaxRequestId(config.max_request_id)];
        if let Some(path) = &config.path {
            setup_parameters.push(SetupParameter::Path(path.clone()));
        }
        if let Some(size) = config.max_auth_token_cache_size {
            setup_parameters.push(SetupParameter::MaxAuthTokenCacheSize(size));
        }
        let client_setup = ControlMessage::ClientSetup(Box::new(ClientSetup::new(
            config.supported_versions.clone(),
            setup_parameters,
        )));
        control_sender
            .send(&client_setup.packetize()?)
            .await
            .map_err(|error| SessionError::Internal(format!("client setup send failed: {error}")))?;
        tracing::info!("sent client setup");

        let (server_setup, leftover_bytes) =
            Self::read_server_setup(&transport, &mut control_receiver, &config).await?;
        if !config
            .supported_versions
            .contains(&server_setup.selected_version)
        {
            transport.close(
                TerminationErrorCode::ProtocolViolation.into(),
                b"unsupported version",
            );
            return Err(SessionError::ProtocolViolation(format!(
                "server selected unsupported version {:#x}",
                server_setup.selected_version
            )));
        }
        let peer_max_request_id = server_setup
            .setup_parameters
            .iter()
            .find_map(|parameter| match parameter {
                SetupParameter::MaxRequestId(value) => Some(*value),
                _ => None,
            })
            .unwrap_or(MAX_REQUEST_ID);
        tracing::info!(
            "received server setup, version {:#x}",
            server_setup.selected_version
        );

        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let context = Arc::new(SessionContext::new(
            transport,
            control_sender,
            config,
            event_sender,
            peer_max_request_id,
        ));
        let control_thread = ControlMessageReceiveThread::run(
            control_receiver,
            leftover_bytes,
            Arc::downgrade(&context),
        );
        let accept_thread = UniStreamAcceptThread::run(Arc::downgrade(&context));
        let datagram_thread = DatagramReceiveThread::run(Arc::downgrade(&context));

        Ok(Self {
            context,
            event_receiver: tokio::sync::Mutex::new(event_receiver),
            control_thread,
            accept_thread,
            datagram_thread,
        })
    }

    /// Reads exactly one control message and requires it to be
    /// ServerSetup. Bytes received past the setup frame are handed over to
    /// the control reader.
    async fn read_server_setup(
        transport: &T::Connection,
        control_receiver: &mut StreamReceiver<T>,
        config: &SessionConfig,
    ) -> Result<(ServerSetup, BytesMut), SessionError> {
        let mut recv_bytes = BytesMut::new();
        loop {
            let mut cur = Cursor::new(&recv_bytes[..]);
            match ControlMessage::depacketize(&mut cur) {
                Ok(ControlMessage::ServerSetup(server_setup)) => {
                    let consumed = cur.position() as usize;
                    recv_bytes.advance(consumed);
                    return Ok((*server_setup, recv_bytes));
                }
                Ok(other) => {
                    transport.close(
                        TerminationErrorCode::ProtocolViolation.into(),
                        b"expected server setup",
                    );
                    return Err(SessionError::ProtocolViolation(format!(
                        "expected server setup, received {:?}",
                        other.message_type()
                    )));
                }
                Err(CodecError::NotEnoughBytes { .. }) => {
                    match control_receiver
                        .receive_chunk_timeout(
                            &mut recv_bytes,
                            config.control_stream_timeout,
                            "server setup",
                        )
                        .await
                    {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            transport.close(
                                TerminationErrorCode::ProtocolViolation.into(),
                                b"control stream closed",
                            );
                            return Err(SessionError::ProtocolViolation(
                                "control stream closed during handshake".to_string(),
                            ));
                        }
                        Err(error) => {
                            transport
                                .close(TerminationErrorCode::InternalError.into(), b"handshake");
                            return Err(error);
                        }
                    }
                }
                Err(error) => {
                    transport.close(
                        TerminationErrorCode::ProtocolViolation.into(),
                        b"malformed handshake",
                    );
                    return Err(SessionError::ProtocolViolation(format!(
                        "malformed handshake message: {error}"
                    )));
                }
            }
        }
    }

    /// Next lifecycle/discovery event. Fails once the sender side is gone
    /// after termination.
    pub async fn receive_event(&self) -> Result<SessionEvent, SessionError> {
        self.event_receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or(SessionError::Terminated)
    }

    pub async fn disconnect(&self, reason: &str) {
        self.context
            .disconnect(TerminationErrorCode::NoError, reason)
            .await;
    }

    pub async fn subscribe(&self, option: SubscribeOption) -> Result<SubscribeResult, SessionError> {
        self.context.ensure_active()?;
        let request_id = self.context.allocate_request_id().await?;
        let track_alias = match option.track_alias {
            Some(alias) => alias,
            None => self.context.alias_map.lock().await.mint_unused_alias(),
        };
        let subscribe = Subscribe::try_new(
            request_id,
            track_alias,
            option.full_track_name.clone(),
            option.subscriber_priority,
            option.group_order,
            option.forward,
            option.filter_type,
            option.start_location,
            option.end_group,
            option.subscribe_parameters,
        )?;

        let (response_sender, response_receiver) = oneshot::channel();
        let (object_sender, object_receiver) =
            mpsc::channel(self.context.config.object_queue_capacity);
        self.context
            .alias_map
            .lock()
            .await
            .add(track_alias, option.full_track_name.clone())?;
        self.context
            .subscriptions
            .lock()
            .await
            .insert(track_alias, request_id);
        self.context.requests.lock().await.insert(
            request_id,
            PendingRequest::Subscribe(SubscribeRecord {
                state: SubscribeState {
                    track_alias,
                    full_track_name: option.full_track_name,
                    start_location: option.start_location.unwrap_or_default(),
                    end_group: option.end_group,
                    forward: option.forward,
                    subscriber_priority: option.subscriber_priority,
                    largest_location: None,
                    streams_accepted: 0,
                    expected_streams: None,
                },
                response: Some(response_sender),
                object_sender,
            }),
        );

        if let Err(error) = self
            .context
            .send_control(&ControlMessage::Subscribe(Box::new(subscribe)))
            .await
        {
            self.context.evict_subscription(request_id, track_alias).await;
            return Err(error);
        }
        tracing::info!("subscribe sent, request id {}", request_id);

        let response = response_receiver.await.map_err(|_| {
            SessionError::Internal("session terminated before subscribe response".to_string())
        })?;
        match response {
            ResponseMessage::SubscribeOk(subscribe_ok) => {
                if let Some(location) = subscribe_ok.largest_location {
                    let mut requests = self.context.requests.lock().await;
                    if let Some(record) = requests
                        .get_mut(&request_id)
                        .and_then(|pending| pending.as_subscribe_mut())
                    {
                        record.state.record_location(location);
                    }
                }
                Ok(SubscribeResult::Accepted(Subscription {
                    request_id,
                    track_alias,
                    largest_location: subscribe_ok.largest_location,
                    objects: object_receiver,
                }))
            }
            ResponseMessage::SubscribeError(error) => {
                self.context.evict_subscription(request_id, track_alias).await;
                Ok(SubscribeResult::Rejected(RequestRejection {
                    error_code: error.error_code,
                    reason_phrase: error.reason_phrase,
                }))
            }
            _ => Err(SessionError::ProtocolViolation(
                "mismatched response for subscribe".to_string(),
            )),
        }
    }

    /// Idempotent: an unknown request id is a no-op. Outstanding data
    /// streams are not closed here; the registries are evicted and late
    /// streams for the old alias are dropped.
    pub async fn unsubscribe(&self, request_id: u64) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        let track_alias = {
            let requests = self.context.requests.lock().await;
            requests
                .get(&request_id)
                .and_then(|pending| pending.as_subscribe())
                .map(|record| record.state.track_alias)
        };
        let Some(track_alias) = track_alias else {
            return Ok(());
        };
        self.context
            .send_control(&ControlMessage::Unsubscribe(Box::new(Unsubscribe::new(
                request_id,
            ))))
            .await?;
        self.context.evict_subscription(request_id, track_alias).await;
        Ok(())
    }

    /// Narrowing-only update of an active subscription: the start location
    /// may not move backwards and the end group may not grow. Violations
    /// fail before anything is written to the wire.
    pub async fn subscribe_update(
        &self,
        option: SubscribeUpdateOption,
    ) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        {
            let requests = self.context.requests.lock().await;
            let record = requests
                .get(&option.request_id)
                .and_then(|pending| pending.as_subscribe())
                .ok_or_else(|| {
                    SessionError::ProtocolViolation(format!(
                        "subscribe update for unknown request id {}",
                        option.request_id
                    ))
                })?;
            let state = &record.state;
            if option.start_location < state.start_location {
                return Err(SessionError::ProtocolViolation(
                    "subscribe update must not move the start location backwards".to_string(),
                ));
            }
            match (option.end_group, state.end_group) {
                (Some(new_end), Some(current_end)) if new_end > current_end => {
                    return Err(SessionError::ProtocolViolation(
                        "subscribe update must not raise the end group".to_string(),
                    ));
                }
                (None, Some(_)) => {
                    return Err(SessionError::ProtocolViolation(
                        "subscribe update must not clear the end group".to_string(),
                    ));
                }
                _ => {}
            }
            if let Some(new_end) = option.end_group {
                if option.start_location.group >= new_end {
                    return Err(SessionError::ProtocolViolation(
                        "end group must be after the start group".to_string(),
                    ));
                }
            }
        }

        let update = SubscribeUpdate::new(
            option.request_id,
            option.start_location,
            option.end_group,
            option.subscriber_priority,
            option.forward,
            option.subscribe_parameters,
        );
        self.context
            .send_control(&ControlMessage::SubscribeUpdate(Box::new(update)))
            .await?;

        let mut requests = self.context.requests.lock().await;
        if let Some(record) = requests
            .get_mut(&option.request_id)
            .and_then(|pending| pending.as_subscribe_mut())
        {
            record.state.start_location = option.start_location;
            if option.end_group.is_some() {
                record.state.end_group = option.end_group;
            }
            record.state.subscriber_priority = option.subscriber_priority;
            record.state.forward = option.forward;
        }
        Ok(())
    }

    pub async fn fetch(&self, option: FetchOption) -> Result<FetchResult, SessionError> {
        self.context.ensure_active()?;
        let full_track_name = match option.fetch_type {
            FetchType::StandAlone => option
                .standalone_fetch_props
                .as_ref()
                .ok_or_else(|| {
                    SessionError::ProtocolViolation(
                        "standalone fetch requires standalone props".to_string(),
                    )
                })?
                .full_track_name
                .clone(),
            FetchType::Relative | FetchType::Absolute => {
                let props = option.joining_fetch_props.as_ref().ok_or_else(|| {
                    SessionError::ProtocolViolation(
                        "joining fetch requires joining props".to_string(),
                    )
                })?;
                let requests = self.context.requests.lock().await;
                let record = requests
                    .get(&props.joining_request_id)
                    .and_then(|pending| pending.as_subscribe())
                    .ok_or_else(|| {
                        SessionError::ProtocolViolation(format!(
                            "joining fetch references unknown subscription {}",
                            props.joining_request_id
                        ))
                    })?;
                record.state.full_track_name.clone()
            }
        };

        let request_id = self.context.allocate_request_id().await?;
        let fetch = Fetch::try_new(
            request_id,
            option.subscriber_priority,
            option.group_order,
            option.fetch_type,
            option.standalone_fetch_props,
            option.joining_fetch_props,
            option.parameters,
        )?;

        let (response_sender, response_receiver) = oneshot::channel();
        let (object_sender, object_receiver) =
            mpsc::channel(self.context.config.object_queue_capacity);
        self.context.requests.lock().await.insert(
            request_id,
            PendingRequest::Fetch(FetchRecord {
                full_track_name,
                response: Some(response_sender),
                object_sender,
            }),
        );

        if let Err(error) = self
            .context
            .send_control(&ControlMessage::Fetch(Box::new(fetch)))
            .await
        {
            self.context.requests.lock().await.remove(&request_id);
            return Err(error);
        }
        tracing::info!("fetch sent, request id {}", request_id);

        let response = response_receiver.await.map_err(|_| {
            SessionError::Internal("session terminated before fetch response".to_string())
        })?;
        match response {
            ResponseMessage::FetchOk(_) => Ok(FetchResult::Accepted(FetchStream {
                request_id,
                objects: object_receiver,
            })),
            ResponseMessage::FetchError(error) => {
                self.context.requests.lock().await.remove(&request_id);
                Ok(FetchResult::Rejected(RequestRejection {
                    error_code: error.error_code,
                    reason_phrase: error.reason_phrase,
                }))
            }
            _ => Err(SessionError::ProtocolViolation(
                "mismatched response for fetch".to_string(),
            )),
        }
    }

    /// Idempotent. The fetch record stays until the peer finishes (or
    /// resets) the data stream, which drains and closes the caller stream.
    pub async fn fetch_cancel(&self, request_id: u64) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        let exists = self
            .context
            .requests
            .lock()
            .await
            .get(&request_id)
            .is_some_and(|pending| pending.as_fetch().is_some());
        if !exists {
            return Ok(());
        }
        self.context
            .send_control(&ControlMessage::FetchCancel(Box::new(FetchCancel::new(
                request_id,
            ))))
            .await
    }

    pub async fn publish_namespace(
        &self,
        track_namespace: Tuple,
        parameters: Vec<KeyValuePair>,
    ) -> Result<NamespaceResult, SessionError> {
        self.context.ensure_active()?;
        let request_id = self.context.allocate_request_id().await?;
        let (response_sender, response_receiver) = oneshot::channel();
        self.context.requests.lock().await.insert(
            request_id,
            PendingRequest::PublishNamespace {
                response: Some(response_sender),
            },
        );
        let message = PublishNamespace::new(request_id, track_namespace.clone(), parameters);
        if let Err(error) = self
            .context
            .send_control(&ControlMessage::PublishNamespace(Box::new(message)))
            .await
        {
            self.context.requests.lock().await.remove(&request_id);
            return Err(error);
        }

        let response = response_receiver.await.map_err(|_| {
            SessionError::Internal("session terminated before publish namespace response".to_string())
        })?;
        self.context.requests.lock().await.remove(&request_id);
        match response {
            ResponseMessage::NamespaceOk(_) => {
                self.context
                    .announced_namespaces
                    .lock()
                    .await
                    .insert(track_namespace);
                Ok(NamespaceResult::Accepted)
            }
            ResponseMessage::NamespaceError(error) => Ok(NamespaceResult::Rejected(
                RequestRejection {
                    error_code: error.error_code,
                    reason_phrase: error.reason_phrase,
                },
            )),
            _ => Err(SessionError::ProtocolViolation(
                "mismatched response for publish namespace".to_string(),
            )),
        }
    }

    /// Withdraws a namespace: removed locally first, then announced to the
    /// peer.
    pub async fn publish_namespace_done(
        &self,
        track_namespace: &Tuple,
    ) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        self.context
            .announced_namespaces
            .lock()
            .await
            .remove(track_namespace);
        self.context
            .send_control(&ControlMessage::PublishNamespaceDone(Box::new(
                PublishNamespaceDone::new(track_namespace.clone()),
            )))
            .await
    }

    pub async fn subscribe_announces(
        &self,
        track_namespace_prefix: Tuple,
        parameters: Vec<KeyValuePair>,
    ) -> Result<NamespaceResult, SessionError> {
        self.context.ensure_active()?;
        let request_id = self.context.allocate_request_id().await?;
        let (response_sender, response_receiver) = oneshot::channel();
        self.context.requests.lock().await.insert(
            request_id,
            PendingRequest::SubscribeAnnounces {
                response: Some(response_sender),
            },
        );
        let message = SubscribeAnnounces::new(request_id, track_namespace_prefix, parameters);
        if let Err(error) = self
            .context
            .send_control(&ControlMessage::SubscribeAnnounces(Box::new(message)))
            .await
        {
            self.context.requests.lock().await.remove(&request_id);
            return Err(error);
        }

        let response = response_receiver.await.map_err(|_| {
            SessionError::Internal(
                "session terminated before subscribe announces response".to_string(),
            )
        })?;
        self.context.requests.lock().await.remove(&request_id);
        match response {
            ResponseMessage::NamespaceOk(_) => Ok(NamespaceResult::Accepted),
            ResponseMessage::NamespaceError(error) => Ok(NamespaceResult::Rejected(
                RequestRejection {
                    error_code: error.error_code,
                    reason_phrase: error.reason_phrase,
                },
            )),
            _ => Err(SessionError::ProtocolViolation(
                "mismatched response for subscribe announces".to_string(),
            )),
        }
    }

    /// Fire-and-forget withdrawal of an announce interest prefix.
    pub async fn unsubscribe_announces(
        &self,
        track_namespace_prefix: &Tuple,
    ) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        self.context
            .send_control(&ControlMessage::UnsubscribeAnnounces(Box::new(
                UnsubscribeAnnounces::new(track_namespace_prefix.clone()),
            )))
            .await
    }

    pub async fn track_status(
        &self,
        full_track_name: FullTrackName,
        parameters: Vec<KeyValuePair>,
    ) -> Result<TrackStatusInfo, SessionError> {
        self.context.ensure_active()?;
        let request_id = self.context.allocate_request_id().await?;
        let (response_sender, response_receiver) = oneshot::channel();
        self.context.requests.lock().await.insert(
            request_id,
            PendingRequest::TrackStatus {
                response: Some(response_sender),
            },
        );
        let message = TrackStatusRequest::new(request_id, full_track_name, parameters);
        if let Err(error) = self
            .context
            .send_control(&ControlMessage::TrackStatusRequest(Box::new(message)))
            .await
        {
            self.context.requests.lock().await.remove(&request_id);
            return Err(error);
        }

        let response = response_receiver.await.map_err(|_| {
            SessionError::Internal("session terminated before track status response".to_string())
        })?;
        self.context.requests.lock().await.remove(&request_id);
        match response {
            ResponseMessage::TrackStatus(status) => Ok(TrackStatusInfo {
                status_code: status.status_code,
                largest_location: status.largest_location,
            }),
            _ => Err(SessionError::ProtocolViolation(
                "mismatched response for track status".to_string(),
            )),
        }
    }

    /// Registers or replaces a local track. No wire activity until the
    /// peer subscribes or fetches.
    pub async fn add_or_update_track(&self, track: Track) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        self.context
            .tracks
            .write()
            .await
            .insert(track.full_track_name.clone(), Arc::new(track));
        Ok(())
    }

    pub async fn remove_track(&self, full_track_name: &FullTrackName) -> Result<(), SessionError> {
        self.context.ensure_active()?;
        self.context.tracks.write().await.remove(full_track_name);
        Ok(())
    }
}

impl<T: TransportProtocol> Drop for Session<T> {
    fn drop(&mut self) {
        tracing::info!("session dropped");
        self.context.cancellation.cancel();
        self.control_thread.abort();
        self.accept_thread.abort();
        self.datagram_thread.abort();
    }
}
