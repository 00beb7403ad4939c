pub(crate) mod client_setup;
pub(crate) mod control_message;
pub(crate) mod fetch;
pub(crate) mod fetch_cancel;
pub(crate) mod fetch_ok;
pub(crate) mod goaway;
pub(crate) mod group_order;
pub(crate) mod key_value_pair;
pub(crate) mod location;
pub(crate) mod max_request_id;
pub(crate) mod namespace_ok;
pub(crate) mod publish_namespace;
pub(crate) mod publish_namespace_cancel;
pub(crate) mod publish_namespace_done;
pub(crate) mod request_error;
pub(crate) mod requests_blocked;
pub(crate) mod server_setup;
pub(crate) mod setup_parameters;
pub(crate) mod subscribe;
pub(crate) mod subscribe_announces;
pub(crate) mod subscribe_done;
pub(crate) mod subscribe_error;
pub(crate) mod subscribe_ok;
pub(crate) mod subscribe_update;
pub(crate) mod track_status;
pub(crate) mod track_status_request;
pub(crate) mod unsubscribe;
pub(crate) mod unsubscribe_announces;
pub(crate) mod util;
