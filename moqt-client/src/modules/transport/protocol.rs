use crate::modules::transport::transport_connection::TransportConnection;
use crate::modules::transport::transport_connection_creator::TransportConnectionCreator;
use crate::modules::transport::transport_receive_stream::TransportReceiveStream;
use crate::modules::transport::transport_send_stream::TransportSendStream;

/// Binds the transport collaborator's concrete types together so the
/// session engine can stay generic over the underlying implementation.
pub trait TransportProtocol: 'static {
    type ConnectionCreator: TransportConnectionCreator<Connection = Self::Connection>;
    type Connection: TransportConnection<
            SendStream = Self::SendStream,
            ReceiveStream = Self::ReceiveStream,
        >;
    type SendStream: TransportSendStream;
    type ReceiveStream: TransportReceiveStream;
}
