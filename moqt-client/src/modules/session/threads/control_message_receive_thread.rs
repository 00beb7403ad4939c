use std::io::Cursor;
use std::sync::Weak;

use bytes::{Buf, BytesMut};

use crate::modules::errors::{CodecError, TerminationErrorCode};
use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::session::dispatcher;
use crate::modules::session::session_context::SessionContext;
use crate::modules::streams::stream_receiver::StreamReceiver;
use crate::modules::transport::protocol::TransportProtocol;

/// Reads the bidirectional control stream for the lifetime of the session.
/// Handlers run to completion before the next message is decoded, keeping
/// registry mutations serial.
pub(crate) struct ControlMessageReceiveThread;

impl ControlMessageReceiveThread {
    pub(crate) fn run<T: TransportProtocol>(
        mut receive_stream: StreamReceiver<T>,
        leftover_bytes: BytesMut,
        context: Weak<SessionContext<T>>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut recv_bytes = leftover_bytes;
            loop {
                // Drain every complete frame before reading more bytes.
                loop {
                    let Some(session) = context.upgrade() else {
                        return;
                    };
                    let mut cur = Cursor::new(&recv_bytes[..]);
                    match ControlMessage::depacketize(&mut cur) {
                        Ok(message) => {
                            let consumed = cur.position() as usize;
                            recv_bytes.advance(consumed);
                            tracing::debug!(
                                "received control message: {:?}",
                                message.message_type()
                            );
                            if let Err(error) =
                                dispatcher::handle_control_message(&session, message).await
                            {
                                tracing::error!("control dispatch failed: {}", error);
                                session
                                    .disconnect(
                                        TerminationErrorCode::ProtocolViolation,
                                        &error.to_string(),
                                    )
                                    .await;
                                return;
                            }
                        }
                        Err(CodecError::NotEnoughBytes { .. }) => break,
                        Err(error) => {
                            tracing::error!("malformed control message: {}", error);
                            session
                                .disconnect(
                                    TerminationErrorCode::ProtocolViolation,
                                    &format!("malformed control message: {error}"),
                                )
                                .await;
                            return;
                        }
                    }
                }

                let Some(session) = context.upgrade() else {
                    return;
                };
                let cancellation = session.cancellation.clone();
                let timeout = session.config.control_stream_timeout;
                drop(session);

                let chunk = tokio::select! {
                    _ = cancellation.cancelled() => return,
                    chunk = receive_stream.receive_chunk_timeout(
                        &mut recv_bytes,
                        timeout,
                        "control stream",
                    ) => chunk,
                };
                match chunk {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        if let Some(session) = context.upgrade() {
                            session
                                .disconnect(
                                    TerminationErrorCode::NoError,
                                    "control stream closed by peer",
                                )
                                .await;
                        }
                        return;
                    }
                    Err(error) => {
                        if let Some(session) = context.upgrade() {
                            session
                                .disconnect(TerminationErrorCode::InternalError, &error.to_string())
                                .await;
                        }
                        return;
                    }
                }
            }
        })
    }
}
