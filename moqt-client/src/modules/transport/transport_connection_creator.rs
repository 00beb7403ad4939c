use async_trait::async_trait;
use url::Url;

use crate::modules::transport::read_error::TransportError;
use crate::modules::transport::transport_connection::TransportConnection;

/// Dials WebTransport-like sessions.
#[async_trait]
pub trait TransportConnectionCreator: Send + Sync + 'static {
    type Connection: TransportConnection;

    async fn connect(&self, url: &Url) -> Result<Self::Connection, TransportError>;
}
