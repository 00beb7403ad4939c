use std::sync::Arc;

use crate::modules::errors::{SessionError, SubscribeErrorCode};
use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::messages::control_messages::fetch::{Fetch, FetchType};
use crate::modules::messages::control_messages::fetch_ok::FetchOk;
use crate::modules::messages::control_messages::group_order::GroupOrder;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::namespace_ok::NamespaceOk;
use crate::modules::messages::control_messages::request_error::RequestError;
use crate::modules::messages::control_messages::subscribe::Subscribe;
use crate::modules::messages::control_messages::subscribe_done::SubscribeDone;
use crate::modules::messages::control_messages::subscribe_error::SubscribeError;
use crate::modules::messages::control_messages::subscribe_ok::SubscribeOk;
use crate::modules::messages::control_messages::track_status::{TrackStatus, TrackStatusCode};
use crate::modules::messages::control_messages::track_status_request::TrackStatusRequest;
use crate::modules::models::requests::{RequestKind, ResponseMessage};
use crate::modules::publications::fetch_publication::FetchPublication;
use crate::modules::publications::publication::Publication;
use crate::modules::publications::subscribe_publication::SubscribePublication;
use crate::modules::session::enums::SessionEvent;
use crate::modules::session::session_context::SessionContext;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::errors::FetchErrorCode;

/// Routes one inbound control message to its handler. An error return is a
/// protocol violation: the control reader disconnects the session.
pub(crate) async fn handle_control_message<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    message: ControlMessage,
) -> Result<(), SessionError> {
    match message {
        ControlMessage::ClientSetup(_) | ControlMessage::ServerSetup(_) => Err(
            SessionError::ProtocolViolation("setup message after handshake".to_string()),
        ),
        ControlMessage::GoAway(goaway) => {
            session.emit_event(SessionEvent::GoAway {
                new_session_uri: goaway.new_session_uri,
            });
            Ok(())
        }
        ControlMessage::MaxRequestId(max_request_id) => {
            session.grant_request_ids(max_request_id.request_id);
            Ok(())
        }
        ControlMessage::RequestsBlocked(blocked) => {
            tracing::warn!(
                "peer is blocked on request id ceiling {}",
                blocked.maximum_request_id
            );
            Ok(())
        }

        ControlMessage::SubscribeOk(subscribe_ok) => {
            let request_id = subscribe_ok.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::Subscribe,
                ResponseMessage::SubscribeOk(*subscribe_ok),
            )
            .await
        }
        ControlMessage::SubscribeError(subscribe_error) => {
            let request_id = subscribe_error.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::Subscribe,
                ResponseMessage::SubscribeError(*subscribe_error),
            )
            .await
        }
        ControlMessage::SubscribeDone(subscribe_done) => {
            handle_subscribe_done(session, *subscribe_done).await
        }
        ControlMessage::FetchOk(fetch_ok) => {
            let request_id = fetch_ok.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::Fetch,
                ResponseMessage::FetchOk(*fetch_ok),
            )
            .await
        }
        ControlMessage::FetchError(fetch_error) => {
            let request_id = fetch_error.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::Fetch,
                ResponseMessage::FetchError(*fetch_error),
            )
            .await
        }
        ControlMessage::PublishNamespaceOk(namespace_ok) => {
            let request_id = namespace_ok.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::PublishNamespace,
                ResponseMessage::NamespaceOk(*namespace_ok),
            )
            .await
        }
        ControlMessage::PublishNamespaceError(error) => {
            let request_id = error.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::PublishNamespace,
                ResponseMessage::NamespaceError(*error),
            )
            .await
        }
        ControlMessage::SubscribeAnnouncesOk(namespace_ok) => {
            let request_id = namespace_ok.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::SubscribeAnnounces,
                ResponseMessage::NamespaceOk(*namespace_ok),
            )
            .await
        }
        ControlMessage::SubscribeAnnouncesError(error) => {
            let request_id = error.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::SubscribeAnnounces,
                ResponseMessage::NamespaceError(*error),
            )
            .await
        }
        ControlMessage::TrackStatus(track_status) => {
            let request_id = track_status.request_id;
            resolve_response(
                session,
                request_id,
                RequestKind::TrackStatus,
                ResponseMessage::TrackStatus(*track_status),
            )
            .await
        }

        ControlMessage::Subscribe(subscribe) => {
            handle_incoming_subscribe(session, *subscribe).await
        }
        ControlMessage::Fetch(fetch) => handle_incoming_fetch(session, *fetch).await,
        ControlMessage::SubscribeUpdate(update) => {
            let publications = session.publications.lock().await;
            match publications.get(&update.request_id) {
                Some(Publication::Subscribe(publication)) => {
                    let publication = publication.clone();
                    drop(publications);
                    publication.update(&update).await;
                    Ok(())
                }
                _ => Err(SessionError::ProtocolViolation(format!(
                    "subscribe update for unknown publication {}",
                    update.request_id
                ))),
            }
        }
        ControlMessage::Unsubscribe(unsubscribe) => {
            if let Some(publication) = session
                .publications
                .lock()
                .await
                .remove(&unsubscribe.request_id)
            {
                publication.cancel();
            }
            Ok(())
        }
        ControlMessage::FetchCancel(fetch_cancel) => {
            if let Some(publication) = session
                .publications
                .lock()
                .await
                .remove(&fetch_cancel.request_id)
            {
                publication.cancel();
            }
            Ok(())
        }

        ControlMessage::PublishNamespace(publish_namespace) => {
            let reply = NamespaceOk::new(publish_namespace.request_id);
            session
                .send_control(&ControlMessage::PublishNamespaceOk(Box::new(reply)))
                .await?;
            session.emit_event(SessionEvent::NamespacePublished {
                track_namespace: publish_namespace.track_namespace,
            });
            Ok(())
        }
        ControlMessage::PublishNamespaceDone(done) => {
            session.emit_event(SessionEvent::NamespaceUnpublished {
                track_namespace: done.track_namespace,
            });
            Ok(())
        }
        ControlMessage::PublishNamespaceCancel(cancel) => {
            session
                .announced_namespaces
                .lock()
                .await
                .remove(&cancel.track_namespace);
            session.emit_event(SessionEvent::NamespaceCanceled {
                track_namespace: cancel.track_namespace,
                error_code: cancel.error_code,
                reason_phrase: cancel.reason_phrase,
            });
            Ok(())
        }
        ControlMessage::SubscribeAnnounces(subscribe_announces) => {
            session
                .announce_interests
                .lock()
                .await
                .insert(subscribe_announces.track_namespace_prefix.clone());
            let reply = NamespaceOk::new(subscribe_announces.request_id);
            session
                .send_control(&ControlMessage::SubscribeAnnouncesOk(Box::new(reply)))
                .await?;
            session.emit_event(SessionEvent::AnnouncesSubscribed {
                track_namespace_prefix: subscribe_announces.track_namespace_prefix,
            });
            Ok(())
        }
        ControlMessage::UnsubscribeAnnounces(unsubscribe_announces) => {
            session
                .announce_interests
                .lock()
                .await
                .remove(&unsubscribe_announces.track_namespace_prefix);
            session.emit_event(SessionEvent::AnnouncesUnsubscribed {
                track_namespace_prefix: unsubscribe_announces.track_namespace_prefix,
            });
            Ok(())
        }
        ControlMessage::TrackStatusRequest(request) => {
            handle_track_status_request(session, *request).await
        }
    }
}

/// Resolves the one-shot future of a pending request. Unknown ids, kind
/// mismatches and duplicate responses are protocol violations.
async fn resolve_response<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    request_id: u64,
    expected_kind: RequestKind,
    response: ResponseMessage,
) -> Result<(), SessionError> {
    let mut requests = session.requests.lock().await;
    let Some(pending) = requests.get_mut(&request_id) else {
        return Err(SessionError::ProtocolViolation(format!(
            "response for unknown request id {request_id}"
        )));
    };
    if pending.kind() != expected_kind {
        return Err(SessionError::ProtocolViolation(format!(
            "response kind mismatch for request id {request_id}"
        )));
    }
    let Some(sender) = pending.take_response() else {
        return Err(SessionError::ProtocolViolation(format!(
            "duplicate response for request id {request_id}"
        )));
    };
    if sender.send(response).is_err() {
        tracing::debug!("requester for id {} went away", request_id);
    }
    Ok(())
}

/// SUBSCRIBE_DONE pins the expected stream count; the subscription is
/// evicted once every announced stream has been accepted. A done for an
/// unknown id is tolerated: it races with local unsubscribe.
async fn handle_subscribe_done<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    done: SubscribeDone,
) -> Result<(), SessionError> {
    let mut requests = session.requests.lock().await;
    let Some(record) = requests
        .get_mut(&done.request_id)
        .and_then(|pending| pending.as_subscribe_mut())
    else {
        tracing::debug!("subscribe done for unknown request id {}", done.request_id);
        return Ok(());
    };
    record.state.expected_streams = Some(done.stream_count);
    let track_alias = record.state.track_alias;
    if record.state.streams_accepted >= done.stream_count {
        requests.remove(&done.request_id);
        drop(requests);
        session.subscriptions.lock().await.remove(&track_alias);
        session.alias_map.lock().await.remove_by_alias(track_alias);
        tracing::debug!("subscription {} completed", done.request_id);
    }
    Ok(())
}

/// The peer subscribed to one of this endpoint's tracks.
async fn handle_incoming_subscribe<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    subscribe: Subscribe,
) -> Result<(), SessionError> {
    let track = session
        .tracks
        .read()
        .await
        .get(&subscribe.full_track_name)
        .cloned();
    let Some(track) = track else {
        return send_subscribe_error(
            session,
            subscribe.request_id,
            SubscribeErrorCode::TrackDoesNotExist,
            "track does not exist",
            subscribe.track_alias,
        )
        .await;
    };
    if track.live.is_none() {
        return send_subscribe_error(
            session,
            subscribe.request_id,
            SubscribeErrorCode::NotSupported,
            "track has no live source",
            subscribe.track_alias,
        )
        .await;
    }

    {
        let mut alias_map = session.alias_map.lock().await;
        if alias_map
            .add(subscribe.track_alias, subscribe.full_track_name.clone())
            .is_err()
        {
            let fresh_alias = alias_map.mint_unused_alias();
            drop(alias_map);
            return send_subscribe_error(
                session,
                subscribe.request_id,
                SubscribeErrorCode::RetryTrackAlias,
                "track alias already in use",
                fresh_alias,
            )
            .await;
        }
    }

    // The publisher's largest known location drives both the filter
    // resolution and the SubscribeOk content fields.
    let publisher_largest = track.largest_location().await;

    // Attach to the live source before acknowledging, so no object
    // published after the SubscribeOk can be missed.
    let publication = SubscribePublication::start(session, track, &subscribe, publisher_largest);
    session
        .publications
        .lock()
        .await
        .insert(subscribe.request_id, Publication::Subscribe(publication));

    let subscribe_ok = SubscribeOk::new(
        subscribe.request_id,
        0,
        subscribe.group_order,
        publisher_largest,
        vec![],
    );
    session
        .send_control(&ControlMessage::SubscribeOk(Box::new(subscribe_ok)))
        .await?;
    tracing::info!(
        "serving subscribe {} for {}",
        subscribe.request_id,
        subscribe.full_track_name
    );
    Ok(())
}

async fn send_subscribe_error<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    request_id: u64,
    error_code: SubscribeErrorCode,
    reason: &str,
    track_alias: u64,
) -> Result<(), SessionError> {
    let error = SubscribeError::try_new(request_id, error_code.into(), reason.to_string(), track_alias)?;
    session
        .send_control(&ControlMessage::SubscribeError(Box::new(error)))
        .await
}

/// The peer fetched a range of one of this endpoint's tracks.
async fn handle_incoming_fetch<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    fetch: Fetch,
) -> Result<(), SessionError> {
    let (full_track_name, start_location, end_location) = match fetch.fetch_type {
        FetchType::StandAlone => {
            let props = fetch
                .standalone_fetch_props
                .clone()
                .expect("validated by the codec");
            (
                props.full_track_name,
                props.start_location,
                props.end_location,
            )
        }
        FetchType::Relative | FetchType::Absolute => {
            let props = fetch
                .joining_fetch_props
                .expect("validated by the codec");
            let publications = session.publications.lock().await;
            let Some(Publication::Subscribe(publication)) =
                publications.get(&props.joining_request_id)
            else {
                return Err(SessionError::ProtocolViolation(format!(
                    "joining fetch references unknown subscription {}",
                    props.joining_request_id
                )));
            };
            let publication = publication.clone();
            drop(publications);
            let latest = publication.latest_location().await.unwrap_or_default();
            let start_group = match fetch.fetch_type {
                FetchType::Relative => latest.group.saturating_sub(props.joining_start),
                _ => props.joining_start,
            };
            (
                publication.full_track_name().clone(),
                Location::new(start_group, 0),
                latest,
            )
        }
    };

    let track = session.tracks.read().await.get(&full_track_name).cloned();
    let Some(track) = track else {
        return send_fetch_error(
            session,
            fetch.request_id,
            FetchErrorCode::TrackDoesNotExist,
            "track does not exist",
        )
        .await;
    };
    if track.past.is_none() {
        return send_fetch_error(
            session,
            fetch.request_id,
            FetchErrorCode::NotSupported,
            "track has no past source",
        )
        .await;
    }

    let fetch_ok = FetchOk::new(
        fetch.request_id,
        GroupOrder::Ascending,
        false,
        Location::new(0, 0),
        vec![],
    );
    session
        .send_control(&ControlMessage::FetchOk(Box::new(fetch_ok)))
        .await?;

    let publication = FetchPublication::start(
        session,
        track,
        fetch.request_id,
        start_location,
        end_location,
        fetch.subscriber_priority,
    );
    session
        .publications
        .lock()
        .await
        .insert(fetch.request_id, Publication::Fetch(publication));
    Ok(())
}

async fn send_fetch_error<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    request_id: u64,
    error_code: FetchErrorCode,
    reason: &str,
) -> Result<(), SessionError> {
    let error = RequestError::try_new(request_id, error_code.into(), reason.to_string())?;
    session
        .send_control(&ControlMessage::FetchError(Box::new(error)))
        .await
}

/// Answers TRACK_STATUS_REQUEST from the local track table, reporting the
/// track's largest known location.
async fn handle_track_status_request<T: TransportProtocol>(
    session: &Arc<SessionContext<T>>,
    request: TrackStatusRequest,
) -> Result<(), SessionError> {
    let track = session
        .tracks
        .read()
        .await
        .get(&request.full_track_name)
        .cloned();
    let status = match track {
        Some(track) => {
            let largest_location = track.largest_location().await.unwrap_or_default();
            TrackStatus::new(
                request.request_id,
                TrackStatusCode::InProgress,
                largest_location,
                vec![],
            )
        }
        None => TrackStatus::new(
            request.request_id,
            TrackStatusCode::DoesNotExist,
            Location::new(0, 0),
            vec![],
        ),
    };
    session
        .send_control(&ControlMessage::TrackStatus(Box::new(status)))
        .await
}
