use async_trait::async_trait;
use bytes::BytesMut;
use mockall::automock;

use crate::modules::transport::read_error::TransportError;

/// Reliable ordered outgoing byte stream.
#[automock]
#[async_trait]
pub trait TransportSendStream: Send + Sync + 'static {
    async fn send(&mut self, buffer: &BytesMut) -> Result<(), TransportError>;

    /// Gracefully finishes the stream (FIN).
    async fn finish(&mut self) -> Result<(), TransportError>;
}
