pub(crate) mod stream_receiver;
pub(crate) mod stream_sender;
