use std::sync::{Arc, Weak};

use anyhow::Context;
use bytes::BytesMut;
use tokio_util::sync::CancellationToken;

use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::data_streams::fetch_header::FetchHeader;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::track::Track;
use crate::modules::publications::priority::stream_priority;
use crate::modules::session::session_context::SessionContext;
use crate::modules::streams::stream_sender::StreamSender;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;

/// Serves one incoming FETCH: drains the track's past source over a single
/// unidirectional stream, `FetchHeader` first, objects in ascending
/// location order, then FIN.
pub(crate) struct FetchPublication {
    request_id: u64,
    cancellation: CancellationToken,
}

impl FetchPublication {
    pub(crate) fn start<T: TransportProtocol>(
        session: &Arc<SessionContext<T>>,
        track: Arc<Track>,
        request_id: u64,
        start_location: Location,
        end_location: Location,
        subscriber_priority: u8,
    ) -> Arc<Self> {
        let cancellation = session.cancellation.child_token();
        let publication = Arc::new(Self {
            request_id,
            cancellation: cancellation.clone(),
        });
        let session = Arc::downgrade(session);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancellation.cancelled() => Ok(()),
                result = Self::run(
                    session.clone(),
                    track,
                    request_id,
                    start_location,
                    end_location,
                    subscriber_priority,
                ) => result,
            };
            if let Err(error) = result {
                tracing::error!("fetch publication {} failed: {:?}", request_id, error);
            }
            if let Some(session) = session.upgrade() {
                session.publications.lock().await.remove(&request_id);
            }
        });
        publication
    }

    async fn run<T: TransportProtocol>(
        session: Weak<SessionContext<T>>,
        track: Arc<Track>,
        request_id: u64,
        start_location: Location,
        end_location: Location,
        subscriber_priority: u8,
    ) -> anyhow::Result<()> {
        let past = track
            .past
            .clone()
            .context("fetch publication requires a past source")?;
        let objects = past.get_range(start_location, end_location).await?;

        let session = session.upgrade().context("session dropped")?;
        let priority = stream_priority(track.publisher_priority, subscriber_priority);
        let send_stream = session.transport.open_uni(priority).await?;
        let sender = StreamSender::<T>::new(send_stream);

        let mut buf = BytesMut::new();
        FetchHeader::new(request_id).packetize(&mut buf);
        sender.send(&buf).await?;

        for object in objects {
            let mut buf = BytesMut::new();
            object.to_fetch_object().packetize(&mut buf);
            sender.send(&buf).await?;
        }
        sender.finish().await?;
        tracing::debug!("fetch publication {} finished", request_id);
        Ok(())
    }

    pub(crate) fn cancel(&self) {
        tracing::debug!("fetch publication {} canceled", self.request_id);
        self.cancellation.cancel();
    }
}
