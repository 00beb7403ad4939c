pub(crate) mod control_message_type;
pub(crate) mod control_messages;
pub(crate) mod data_streams;
pub(crate) mod moqt_payload;
