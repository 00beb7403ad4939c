pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod messages;
pub(crate) mod models;
pub(crate) mod publications;
pub(crate) mod session;
pub(crate) mod streams;
pub(crate) mod transport;
pub(crate) mod variable_bytes;
pub(crate) mod variable_integer;
