use async_trait::async_trait;
use mockall::automock;

use crate::modules::transport::read_error::TransportError;

/// Reliable ordered incoming byte stream.
#[automock]
#[async_trait]
pub trait TransportReceiveStream: Send + Sync + 'static {
    /// Reads up to `buffer.len()` bytes. `Ok(None)` signals a clean FIN.
    async fn receive(&mut self, buffer: &mut Vec<u8>) -> Result<Option<usize>, TransportError>;
}
