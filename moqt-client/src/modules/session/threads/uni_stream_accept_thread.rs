use std::sync::Weak;

use crate::modules::errors::TerminationErrorCode;
use crate::modules::session::session_context::SessionContext;
use crate::modules::session::threads::uni_stream_receive_thread::UniStreamReceiveThread;
use crate::modules::streams::stream_receiver::StreamReceiver;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::transport_connection::TransportConnection;

/// Accepts incoming unidirectional data streams and spawns one reader task
/// per stream.
pub(crate) struct UniStreamAcceptThread;

impl UniStreamAcceptThread {
    pub(crate) fn run<T: TransportProtocol>(
        context: Weak<SessionContext<T>>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let Some(session) = context.upgrade() else {
                    return;
                };
                let cancellation = session.cancellation.clone();
                let accepted = tokio::select! {
                    _ = cancellation.cancelled() => return,
                    accepted = session.transport.accept_uni() => accepted,
                };
                match accepted {
                    Ok(receive_stream) => {
                        tracing::debug!("accepted incoming data stream");
                        UniStreamReceiveThread::run(
                            context.clone(),
                            StreamReceiver::new(receive_stream),
                        );
                    }
                    Err(error) => {
                        if session.ensure_active().is_ok() {
                            tracing::error!("failed to accept data stream: {}", error);
                            session
                                .disconnect(
                                    TerminationErrorCode::InternalError,
                                    &format!("uni stream acceptor failed: {error}"),
                                )
                                .await;
                        }
                        return;
                    }
                }
            }
        })
    }
}
