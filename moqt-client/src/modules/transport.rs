pub(crate) mod protocol;
pub(crate) mod read_error;
pub(crate) mod transport_connection;
pub(crate) mod transport_connection_creator;
pub(crate) mod transport_receive_stream;
pub(crate) mod transport_send_stream;

#[cfg(test)]
pub(crate) mod test_transport;
