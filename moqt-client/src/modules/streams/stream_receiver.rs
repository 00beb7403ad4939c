use std::time::Duration;

use bytes::BytesMut;

use crate::modules::errors::SessionError;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::read_error::TransportError;
use crate::modules::transport::transport_receive_stream::TransportReceiveStream;

/// Pulls chunks off one incoming stream into a caller-owned accumulation
/// buffer. Message alignment is the caller's business: it parses with a
/// cursor and consumes only complete frames.
pub(crate) struct StreamReceiver<T: TransportProtocol> {
    receive_stream: T::ReceiveStream,
}

impl<T: TransportProtocol> StreamReceiver<T> {
    const RECEIVE_BYTES_CAPACITY: usize = 1024;

    pub(crate) fn new(receive_stream: T::ReceiveStream) -> Self {
        Self { receive_stream }
    }

    /// Appends the next chunk to `out`. `Ok(None)` is a clean FIN.
    pub(crate) async fn receive_chunk(
        &mut self,
        out: &mut BytesMut,
    ) -> Result<Option<usize>, TransportError> {
        let mut bytes = vec![0u8; Self::RECEIVE_BYTES_CAPACITY];
        match self.receive_stream.receive(&mut bytes).await? {
            Some(size) => {
                out.extend_from_slice(&bytes[..size]);
                Ok(Some(size))
            }
            None => Ok(None),
        }
    }

    /// `receive_chunk` with the configured per-read bound applied.
    pub(crate) async fn receive_chunk_timeout(
        &mut self,
        out: &mut BytesMut,
        limit: Option<Duration>,
        what: &'static str,
    ) -> Result<Option<usize>, SessionError> {
        let map_error =
            |error: TransportError| SessionError::Internal(format!("{what} read failed: {error}"));
        match limit {
            Some(duration) => tokio::time::timeout(duration, self.receive_chunk(out))
                .await
                .map_err(|_| SessionError::Timeout(what))?
                .map_err(map_error),
            None => self.receive_chunk(out).await.map_err(map_error),
        }
    }
}
