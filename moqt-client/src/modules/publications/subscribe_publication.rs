use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use anyhow::Context;
use bytes::BytesMut;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::subscribe::{FilterType, Subscribe};
use crate::modules::messages::control_messages::subscribe_done::{
    SubscribeDone, SubscribeDoneCode,
};
use crate::modules::messages::control_messages::subscribe_update::SubscribeUpdate;
use crate::modules::messages::data_streams::subgroup_header::{
    SubgroupHeader, SubgroupHeaderType, SubgroupIdKind,
};
use crate::modules::models::moqt_object::MoqtObject;
use crate::modules::models::track::{ForwardingPreference, FullTrackName, Track};
use crate::modules::publications::priority::stream_priority;
use crate::modules::session::session_context::SessionContext;
use crate::modules::streams::stream_sender::StreamSender;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;

/// Window and delivery state of a subscribe publication, mutated by the
/// live-source task and by incoming SUBSCRIBE_UPDATE.
#[derive(Debug)]
pub(crate) struct SubscribePublicationState {
    pub start_location: Location,
    pub end_group: Option<u64>,
    pub subscriber_priority: u8,
    pub forward: bool,
    pub started: bool,
    pub completed: bool,
    pub latest_location: Option<Location>,
    pub streams_opened: u64,
}

struct GroupStream<T: TransportProtocol> {
    sender: StreamSender<T>,
    has_extensions: bool,
}

/// Serves one incoming SUBSCRIBE from a track's live source: one outbound
/// unidirectional stream per group, closed in ascending group order.
pub(crate) struct SubscribePublication<T: TransportProtocol> {
    request_id: u64,
    track_alias: u64,
    full_track_name: FullTrackName,
    publisher_priority: u8,
    forwarding_preference: ForwardingPreference,
    state: tokio::sync::Mutex<SubscribePublicationState>,
    streams: tokio::sync::Mutex<BTreeMap<u64, GroupStream<T>>>,
    cancellation: CancellationToken,
}

/// Derives the initial start location from the subscribe filter.
pub(crate) fn resolve_start_location(
    filter_type: FilterType,
    start_location: Option<Location>,
    publisher_largest: Option<Location>,
) -> Location {
    match filter_type {
        FilterType::LatestObject => publisher_largest
            .map(Location::next_object)
            .unwrap_or_default(),
        FilterType::NextGroupStart => publisher_largest
            .map(Location::next_group)
            .unwrap_or_default(),
        FilterType::AbsoluteStart | FilterType::AbsoluteRange => start_location.unwrap_or_default(),
    }
}

impl<T: TransportProtocol> SubscribePublication<T> {
    pub(crate) fn start(
        session: &Arc<SessionContext<T>>,
        track: Arc<Track>,
        subscribe: &Subscribe,
        publisher_largest: Option<Location>,
    ) -> Arc<Self> {
        let start_location = resolve_start_location(
            subscribe.filter_type,
            subscribe.start_location,
            publisher_largest,
        );
        let publication = Arc::new(Self {
            request_id: subscribe.request_id,
            track_alias: subscribe.track_alias,
            full_track_name: subscribe.full_track_name.clone(),
            publisher_priority: track.publisher_priority,
            forwarding_preference: track.forwarding_preference,
            state: tokio::sync::Mutex::new(SubscribePublicationState {
                start_location,
                end_group: subscribe.end_group,
                subscriber_priority: subscribe.subscriber_priority,
                forward: subscribe.forward,
                started: false,
                completed: false,
                latest_location: None,
                streams_opened: 0,
            }),
            streams: tokio::sync::Mutex::new(BTreeMap::new()),
            cancellation: session.cancellation.child_token(),
        });

        let source = track
            .live
            .as_ref()
            .expect("caller verified the track has a live source")
            .attach();
        let session = Arc::downgrade(session);
        let task_publication = publication.clone();
        tokio::spawn(async move {
            task_publication.run(session, source).await;
        });

        publication
    }

    async fn run(
        self: Arc<Self>,
        session: Weak<SessionContext<T>>,
        mut source: broadcast::Receiver<MoqtObject>,
    ) {
        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => return,
                received = source.recv() => match received {
                    Ok(object) => {
                        if let Err(error) = self.on_new_object(&session, object).await {
                            tracing::error!(
                                "publication {} failed to deliver object: {:?}",
                                self.request_id,
                                error
                            );
                            self.remove_from_session(&session).await;
                            self.cancellation.cancel();
                            return;
                        }
                        if self.state.lock().await.completed {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "publication {} lagged behind its live source, skipped {} objects",
                            self.request_id,
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        self.on_source_done(&session).await;
                        return;
                    }
                },
            }
        }
    }

    async fn on_new_object(
        &self,
        session: &Weak<SessionContext<T>>,
        object: MoqtObject,
    ) -> anyhow::Result<()> {
        let session = session.upgrade().context("session dropped")?;
        let mut state = self.state.lock().await;
        if state.completed || self.cancellation.is_cancelled() || !state.forward {
            return Ok(());
        }
        if !state.started {
            if state.start_location <= object.location {
                state.started = true;
            } else {
                return Ok(());
            }
        }

        if self.forwarding_preference == ForwardingPreference::Datagram {
            let datagram = object.to_datagram_object(self.track_alias);
            session
                .transport
                .send_datagram(datagram.packetize().freeze())
                .await?;
            state.latest_location = Some(object.location);
            return Ok(());
        }

        let group_id = object.location.group;
        let previous_group = state.latest_location.map(|location| location.group);

        let mut streams = self.streams.lock().await;
        if !streams.contains_key(&group_id) {
            let has_extensions = object.extension_headers.is_some();
            let subgroup_id = object.subgroup_id.unwrap_or(0);
            // Explicit zero and implicit zero are equivalent on the wire;
            // prefer the compact implicit form.
            let subgroup_id_kind = if subgroup_id == 0 {
                SubgroupIdKind::ImplicitZero
            } else {
                SubgroupIdKind::Explicit
            };
            let header_type = SubgroupHeaderType::from_flags(has_extensions, subgroup_id_kind);
            let header = SubgroupHeader::try_new(
                header_type,
                self.track_alias,
                group_id,
                (subgroup_id_kind == SubgroupIdKind::Explicit).then_some(subgroup_id),
                self.publisher_priority,
            )?;
            let priority = stream_priority(self.publisher_priority, state.subscriber_priority);
            let send_stream = session.transport.open_uni(priority).await?;
            let sender = StreamSender::<T>::new(send_stream);
            let mut buf = BytesMut::new();
            header.packetize(&mut buf);
            sender.send(&buf).await?;
            streams.insert(
                group_id,
                GroupStream {
                    sender,
                    has_extensions,
                },
            );
            state.streams_opened += 1;
            tracing::debug!(
                "publication {} opened stream for group {}",
                self.request_id,
                group_id
            );
        }

        let group_stream = streams.get(&group_id).expect("inserted above");
        let mut buf = BytesMut::new();
        object
            .to_subgroup_object()
            .serialize(&mut buf, group_stream.has_extensions);
        group_stream.sender.send(&buf).await?;

        if state.end_group == Some(group_id) {
            // Close every open stream, ascending by group id.
            while let Some((closing_group, stream)) = streams.pop_first() {
                if let Err(error) = stream.sender.finish().await {
                    tracing::warn!(
                        "failed to close stream for group {}: {}",
                        closing_group,
                        error
                    );
                }
            }
            state.latest_location = Some(object.location);
            state.completed = true;
            let streams_opened = state.streams_opened;
            drop(streams);
            drop(state);

            self.send_subscribe_done(
                &session,
                SubscribeDoneCode::SubscriptionEnded,
                streams_opened,
                "end group reached",
            )
            .await?;
            session.publications.lock().await.remove(&self.request_id);
            self.cancellation.cancel();
            return Ok(());
        }

        if let Some(previous) = previous_group {
            if previous != group_id {
                if let Some(stream) = streams.remove(&previous) {
                    if let Err(error) = stream.sender.finish().await {
                        tracing::warn!(
                            "failed to close stream for group {}: {}",
                            previous,
                            error
                        );
                    }
                }
            }
        }
        state.latest_location = Some(object.location);
        Ok(())
    }

    /// Live source finished: close remaining streams in ascending group
    /// order and report the track as ended.
    async fn on_source_done(&self, session: &Weak<SessionContext<T>>) {
        let Some(session) = session.upgrade() else {
            return;
        };
        let mut state = self.state.lock().await;
        if state.completed {
            return;
        }
        state.completed = true;
        let streams_opened = state.streams_opened;
        drop(state);

        let mut streams = self.streams.lock().await;
        while let Some((group_id, stream)) = streams.pop_first() {
            if let Err(error) = stream.sender.finish().await {
                tracing::warn!("failed to close stream for group {}: {}", group_id, error);
            }
        }
        drop(streams);

        if let Err(error) = self
            .send_subscribe_done(&session, SubscribeDoneCode::TrackEnded, streams_opened, "track ended")
            .await
        {
            tracing::warn!("failed to send subscribe done: {:?}", error);
        }
        session.publications.lock().await.remove(&self.request_id);
    }

    async fn send_subscribe_done(
        &self,
        session: &Arc<SessionContext<T>>,
        status_code: SubscribeDoneCode,
        stream_count: u64,
        reason: &str,
    ) -> anyhow::Result<()> {
        let done =
            SubscribeDone::try_new(self.request_id, status_code, stream_count, reason.to_string())?;
        session
            .send_control(&ControlMessage::SubscribeDone(Box::new(done)))
            .await?;
        Ok(())
    }

    async fn remove_from_session(&self, session: &Weak<SessionContext<T>>) {
        if let Some(session) = session.upgrade() {
            session.publications.lock().await.remove(&self.request_id);
        }
    }

    /// Applies an incoming SUBSCRIBE_UPDATE. Stream bookkeeping follows
    /// lazily with the next object.
    pub(crate) async fn update(&self, update: &SubscribeUpdate) {
        let mut state = self.state.lock().await;
        state.start_location = update.start_location;
        if update.end_group.is_some() {
            state.end_group = update.end_group;
        }
        state.subscriber_priority = update.subscriber_priority;
        state.forward = update.forward;
    }

    pub(crate) async fn latest_location(&self) -> Option<Location> {
        self.state.lock().await.latest_location
    }

    pub(crate) fn full_track_name(&self) -> &FullTrackName {
        &self.full_track_name
    }

    pub(crate) fn cancel(&self) {
        self.cancellation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use crate::modules::messages::control_messages::location::Location;
    use crate::modules::messages::control_messages::subscribe::FilterType;
    use crate::modules::publications::subscribe_publication::resolve_start_location;

    #[test]
    fn latest_object_starts_after_the_largest_location() {
        let start = resolve_start_location(
            FilterType::LatestObject,
            None,
            Some(Location::new(7, 3)),
        );
        assert_eq!(start, Location::new(7, 4));

        let start = resolve_start_location(FilterType::LatestObject, None, None);
        assert_eq!(start, Location::new(0, 0));
    }

    #[test]
    fn next_group_start_begins_the_following_group() {
        let start = resolve_start_location(
            FilterType::NextGroupStart,
            None,
            Some(Location::new(7, 3)),
        );
        assert_eq!(start, Location::new(8, 0));

        let start = resolve_start_location(FilterType::NextGroupStart, None, None);
        assert_eq!(start, Location::new(0, 0));
    }

    #[test]
    fn absolute_filters_use_the_caller_location() {
        let start = resolve_start_location(
            FilterType::AbsoluteRange,
            Some(Location::new(5, 0)),
            Some(Location::new(7, 3)),
        );
        assert_eq!(start, Location::new(5, 0));
    }
}
