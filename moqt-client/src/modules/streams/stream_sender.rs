use bytes::BytesMut;

use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::read_error::TransportError;
use crate::modules::transport::transport_send_stream::TransportSendStream;

/// Serializes writes onto one outgoing stream; shared by everything that
/// writes to the control stream or to a publication's data stream.
pub(crate) struct StreamSender<T: TransportProtocol> {
    send_stream: tokio::sync::Mutex<T::SendStream>,
}

impl<T: TransportProtocol> StreamSender<T> {
    pub(crate) fn new(send_stream: T::SendStream) -> Self {
        Self {
            send_stream: tokio::sync::Mutex::new(send_stream),
        }
    }

    pub(crate) async fn send(&self, bytes: &BytesMut) -> Result<(), TransportError> {
        self.send_stream.lock().await.send(bytes).await
    }

    pub(crate) async fn finish(&self) -> Result<(), TransportError> {
        self.send_stream.lock().await.finish().await
    }
}
