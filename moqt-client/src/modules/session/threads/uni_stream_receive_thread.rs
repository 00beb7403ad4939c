use std::io::Cursor;
use std::sync::Weak;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio_util::sync::CancellationToken;

use crate::modules::constants::FETCH_HEADER_TYPE;
use crate::modules::errors::{CodecError, SessionError, TerminationErrorCode};
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::data_streams::fetch_header::FetchHeader;
use crate::modules::messages::data_streams::fetch_object::FetchObject;
use crate::modules::messages::data_streams::subgroup_header::SubgroupHeader;
use crate::modules::messages::data_streams::subgroup_object::SubgroupObject;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::moqt_object::MoqtObject;
use crate::modules::session::session_context::SessionContext;
use crate::modules::streams::stream_receiver::StreamReceiver;
use crate::modules::transport::protocol::TransportProtocol;

enum StreamHeader {
    Fetch(FetchHeader),
    Subgroup(SubgroupHeader),
}

/// Reads one incoming unidirectional data stream: a single header, then
/// objects until FIN, pushed into the owning subscription's or fetch's
/// object queue.
pub(crate) struct UniStreamReceiveThread;

impl UniStreamReceiveThread {
    pub(crate) fn run<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
        receive_stream: StreamReceiver<T>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(error) = Self::read_stream(context.clone(), receive_stream).await {
                match &error {
                    SessionError::ProtocolViolation(_) => {
                        if let Some(session) = context.upgrade() {
                            session
                                .disconnect(
                                    TerminationErrorCode::ProtocolViolation,
                                    &error.to_string(),
                                )
                                .await;
                        }
                    }
                    // Stream-level failures abort this stream only.
                    other => tracing::error!("data stream reader stopped: {}", other),
                }
            }
        })
    }

    async fn read_stream<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
        mut receive_stream: StreamReceiver<T>,
    ) -> Result<(), SessionError> {
        let (cancellation, data_timeout) = {
            let Some(session) = context.upgrade() else {
                return Ok(());
            };
            (
                session.cancellation.clone(),
                session.config.data_stream_timeout,
            )
        };

        let mut recv_bytes = BytesMut::new();
        let header = loop {
            match Self::parse_header(&recv_bytes) {
                Ok(Some((consumed, header))) => {
                    recv_bytes.advance(consumed);
                    break header;
                }
                Ok(None) => {
                    let chunk = tokio::select! {
                        _ = cancellation.cancelled() => return Ok(()),
                        chunk = receive_stream.receive_chunk_timeout(
                            &mut recv_bytes,
                            data_timeout,
                            "data stream header",
                        ) => chunk?,
                    };
                    if chunk.is_none() {
                        if recv_bytes.is_empty() {
                            // Empty stream; nothing to demultiplex.
                            return Ok(());
                        }
                        return Err(SessionError::ProtocolViolation(
                            "data stream ended mid-header".to_string(),
                        ));
                    }
                }
                Err(error) => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "bad data stream header: {error}"
                    )));
                }
            }
        };

        match header {
            StreamHeader::Fetch(header) => {
                Self::read_fetch_objects(
                    context,
                    receive_stream,
                    recv_bytes,
                    header,
                    cancellation,
                    data_timeout,
                )
                .await
            }
            StreamHeader::Subgroup(header) => {
                Self::read_subgroup_objects(
                    context,
                    receive_stream,
                    recv_bytes,
                    header,
                    cancellation,
                    data_timeout,
                )
                .await
            }
        }
    }

    /// Checkpoint parse of the stream-opening header. The first varint
    /// distinguishes a fetch stream (0x05) from a subgroup stream
    /// (0x08..=0x0D).
    fn parse_header(buf: &[u8]) -> Result<Option<(usize, StreamHeader)>, CodecError> {
        if buf.is_empty() {
            return Ok(None);
        }
        let mut cur = Cursor::new(buf);
        let result = if buf[0] as u64 == FETCH_HEADER_TYPE {
            FetchHeader::depacketize(&mut cur).map(StreamHeader::Fetch)
        } else {
            SubgroupHeader::depacketize(&mut cur).map(StreamHeader::Subgroup)
        };
        match result {
            Ok(header) => Ok(Some((cur.position() as usize, header))),
            Err(CodecError::NotEnoughBytes { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn read_fetch_objects<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
        mut receive_stream: StreamReceiver<T>,
        mut recv_bytes: BytesMut,
        header: FetchHeader,
        cancellation: CancellationToken,
        data_timeout: Option<Duration>,
    ) -> Result<(), SessionError> {
        let (full_track_name, object_sender) = {
            let Some(session) = context.upgrade() else {
                return Ok(());
            };
            let requests = session.requests.lock().await;
            match requests
                .get(&header.request_id)
                .and_then(|pending| pending.as_fetch())
            {
                Some(record) => (record.full_track_name.clone(), record.object_sender.clone()),
                None => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "fetch data stream for unknown request id {}",
                        header.request_id
                    )));
                }
            }
        };

        let mut previous_location: Option<Location> = None;
        loop {
            loop {
                let mut cur = Cursor::new(&recv_bytes[..]);
                match FetchObject::depacketize(&mut cur) {
                    Ok(object) => {
                        recv_bytes.advance(cur.position() as usize);
                        let location = Location::new(object.group_id, object.object_id);
                        if previous_location.is_some_and(|previous| location < previous) {
                            return Err(SessionError::ProtocolViolation(
                                "fetch objects must arrive in ascending order".to_string(),
                            ));
                        }
                        previous_location = Some(location);
                        let moqt_object =
                            MoqtObject::try_from_fetch(object, full_track_name.clone())?;
                        if object_sender.send(moqt_object).await.is_err() {
                            // Consumer dropped the fetch stream.
                            return Ok(());
                        }
                    }
                    Err(CodecError::NotEnoughBytes { .. }) => break,
                    Err(error) => {
                        return Err(SessionError::ProtocolViolation(format!(
                            "bad fetch object: {error}"
                        )));
                    }
                }
            }

            let chunk = tokio::select! {
                _ = cancellation.cancelled() => return Ok(()),
                chunk = receive_stream.receive_chunk_timeout(
                    &mut recv_bytes,
                    data_timeout,
                    "fetch data stream",
                ) => chunk,
            };
            match chunk {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if !recv_bytes.is_empty() {
                        return Err(SessionError::ProtocolViolation(
                            "fetch stream ended mid-object".to_string(),
                        ));
                    }
                    // FIN closes the caller-visible stream by dropping the
                    // request record.
                    if let Some(session) = context.upgrade() {
                        session.requests.lock().await.remove(&header.request_id);
                    }
                    tracing::debug!("fetch {} stream finished", header.request_id);
                    return Ok(());
                }
                Err(error) => {
                    // The affected fetch is aborted; the session survives.
                    if let Some(session) = context.upgrade() {
                        session.requests.lock().await.remove(&header.request_id);
                    }
                    return Err(error);
                }
            }
        }
    }

    async fn read_subgroup_objects<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
        mut receive_stream: StreamReceiver<T>,
        mut recv_bytes: BytesMut,
        header: SubgroupHeader,
        cancellation: CancellationToken,
        data_timeout: Option<Duration>,
    ) -> Result<(), SessionError> {
        let looked_up = {
            let Some(session) = context.upgrade() else {
                return Ok(());
            };
            let request_id = session
                .subscriptions
                .lock()
                .await
                .get(&header.track_alias)
                .copied();
            match request_id {
                Some(request_id) => {
                    let requests = session.requests.lock().await;
                    requests
                        .get(&request_id)
                        .and_then(|pending| pending.as_subscribe())
                        .map(|record| {
                            (
                                request_id,
                                record.state.full_track_name.clone(),
                                record.object_sender.clone(),
                            )
                        })
                }
                None => None,
            }
        };
        let Some((request_id, full_track_name, object_sender)) = looked_up else {
            // Late stream for an already-evicted subscription.
            tracing::warn!(
                "dropping data stream for unknown track alias {}",
                header.track_alias
            );
            return Ok(());
        };

        let has_extensions = header.header_type.has_extensions();
        let mut first_object_id: Option<u64> = None;
        loop {
            loop {
                let mut cur = Cursor::new(&recv_bytes[..]);
                match SubgroupObject::deserialize(&mut cur, has_extensions) {
                    Ok(object) => {
                        recv_bytes.advance(cur.position() as usize);
                        let first = *first_object_id.get_or_insert(object.object_id);
                        let moqt_object = MoqtObject::try_from_subgroup(
                            &header,
                            object,
                            first,
                            full_track_name.clone(),
                        )?;
                        let location = moqt_object.location;
                        if object_sender.send(moqt_object).await.is_err() {
                            return Ok(());
                        }
                        Self::record_location(&context, request_id, location).await;
                    }
                    Err(CodecError::NotEnoughBytes { .. }) => break,
                    Err(error) => {
                        return Err(SessionError::ProtocolViolation(format!(
                            "bad subgroup object: {error}"
                        )));
                    }
                }
            }

            let chunk = tokio::select! {
                _ = cancellation.cancelled() => return Ok(()),
                chunk = receive_stream.receive_chunk_timeout(
                    &mut recv_bytes,
                    data_timeout,
                    "subgroup data stream",
                ) => chunk,
            };
            match chunk {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if !recv_bytes.is_empty() {
                        return Err(SessionError::ProtocolViolation(
                            "subgroup stream ended mid-object".to_string(),
                        ));
                    }
                    Self::finish_subscription_stream(&context, request_id, header.track_alias)
                        .await;
                    return Ok(());
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn record_location<T: TransportProtocol>(
        context: &Weak<SessionContext<T>>,
        request_id: u64,
        location: Location,
    ) {
        let Some(session) = context.upgrade() else {
            return;
        };
        let mut requests = session.requests.lock().await;
        if let Some(record) = requests
            .get_mut(&request_id)
            .and_then(|pending| pending.as_subscribe_mut())
        {
            record.state.record_location(location);
        }
    }

    /// Counts the finished stream; once SUBSCRIBE_DONE's expected count is
    /// reached, the subscription's queue is closed and its registry
    /// entries are evicted.
    async fn finish_subscription_stream<T: TransportProtocol>(
        context: &Weak<SessionContext<T>>,
        request_id: u64,
        track_alias: u64,
    ) {
        let Some(session) = context.upgrade() else {
            return;
        };
        let mut requests = session.requests.lock().await;
        let Some(record) = requests
            .get_mut(&request_id)
            .and_then(|pending| pending.as_subscribe_mut())
        else {
            return;
        };
        record.state.streams_accepted += 1;
        let finished = record
            .state
            .expected_streams
            .is_some_and(|expected| record.state.streams_accepted >= expected);
        if finished {
            requests.remove(&request_id);
            drop(requests);
            session.subscriptions.lock().await.remove(&track_alias);
            session.alias_map.lock().await.remove_by_alias(track_alias);
            tracing::debug!("subscription {} completed", request_id);
        }
    }
}
