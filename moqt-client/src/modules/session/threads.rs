pub(crate) mod control_message_receive_thread;
pub(crate) mod datagram_receive_thread;
pub(crate) mod uni_stream_accept_thread;
pub(crate) mod uni_stream_receive_thread;
