use async_trait::async_trait;
use bytes::Bytes;

use crate::modules::transport::read_error::TransportError;
use crate::modules::transport::transport_receive_stream::TransportReceiveStream;
use crate::modules::transport::transport_send_stream::TransportSendStream;

/// One established WebTransport-like session: a bidirectional stream for
/// the control channel, unidirectional streams with a numeric send
/// priority hint for data, and an unreliable datagram channel.
#[async_trait]
pub trait TransportConnection: Send + Sync + 'static {
    type SendStream: TransportSendStream;
    type ReceiveStream: TransportReceiveStream;

    async fn open_bi(
        &self,
        send_priority: i32,
    ) -> Result<(Self::SendStream, Self::ReceiveStream), TransportError>;

    async fn open_uni(&self, send_priority: i32) -> Result<Self::SendStream, TransportError>;

    async fn accept_uni(&self) -> Result<Self::ReceiveStream, TransportError>;

    async fn send_datagram(&self, datagram: Bytes) -> Result<(), TransportError>;

    async fn receive_datagram(&self) -> Result<Bytes, TransportError>;

    /// Closes the whole session. Idempotent.
    fn close(&self, error_code: u64, reason: &[u8]);
}
