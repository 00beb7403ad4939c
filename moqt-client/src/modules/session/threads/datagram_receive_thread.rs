use std::sync::Weak;

use crate::modules::messages::data_streams::datagram_object::DatagramObject;
use crate::modules::models::moqt_object::MoqtObject;
use crate::modules::session::session_context::SessionContext;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;

/// Demultiplexes incoming datagram objects to subscriptions by track
/// alias. Datagrams are unreliable, so malformed or unroutable ones are
/// dropped rather than treated as violations.
pub(crate) struct DatagramReceiveThread;

impl DatagramReceiveThread {
    pub(crate) fn run<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let Some(session) = context.upgrade() else {
                    return;
                };
                let cancellation = session.cancellation.clone();
                let datagram = tokio::select! {
                    _ = cancellation.cancelled() => return,
                    datagram = session.transport.receive_datagram() => datagram,
                };
                let datagram = match datagram {
                    Ok(datagram) => datagram,
                    Err(error) => {
                        tracing::debug!("datagram channel closed: {}", error);
                        return;
                    }
                };
                let object = match DatagramObject::depacketize(&datagram) {
                    Ok(object) => object,
                    Err(error) => {
                        tracing::warn!("dropping malformed datagram: {}", error);
                        continue;
                    }
                };

                let looked_up = {
                    let request_id = session
                        .subscriptions
                        .lock()
                        .await
                        .get(&object.track_alias)
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
                    tracing::warn!(
                        "dropping datagram for unknown track alias {}",
                        object.track_alias
                    );
                    continue;
                };

                match MoqtObject::try_from_datagram(object, full_track_name) {
                    Ok(moqt_object) => {
                        let location = moqt_object.location;
                        if object_sender.send(moqt_object).await.is_err() {
                            continue;
                        }
                        let mut requests = session.requests.lock().await;
                        if let Some(record) = requests
                            .get_mut(&request_id)
                            .and_then(|pending| pending.as_subscribe_mut())
                        {
                            record.state.record_location(location);
                        }
                    }
                    Err(error) => tracing::warn!("dropping invalid datagram object: {}", error),
                }
            }
        })
    }
}
