mod modules;

pub use modules::constants::MOQ_TRANSPORT_VERSION;
pub use modules::errors::{
    CodecError, FetchErrorCode, NamespaceErrorCode, SessionError, SubscribeErrorCode,
    TerminationErrorCode,
};
pub use modules::messages::control_messages::fetch::{
    FetchType, JoiningFetchProps, StandAloneFetchProps,
};
pub use modules::messages::control_messages::group_order::GroupOrder;
pub use modules::messages::control_messages::key_value_pair::{KeyValuePair, PairValue};
pub use modules::messages::control_messages::location::Location;
pub use modules::messages::control_messages::subscribe::FilterType;
pub use modules::messages::control_messages::subscribe_done::SubscribeDoneCode;
pub use modules::messages::control_messages::track_status::TrackStatusCode;
pub use modules::messages::data_streams::extension_header::{
    describe, ExtensionHeaders, AUDIO_LEVEL, CAPTURE_TIMESTAMP, VIDEO_CONFIG, VIDEO_FRAME_MARKING,
};
pub use modules::messages::data_streams::object_status::ObjectStatus;
pub use modules::models::moqt_object::MoqtObject;
pub use modules::models::track::{
    ForwardingPreference, FullTrackName, LiveSource, PastObjectSource, Track,
};
pub use modules::models::tuple::Tuple;
pub use modules::session::enums::SessionEvent;
pub use modules::session::options::{
    FetchOption, SessionConfig, SubscribeOption, SubscribeUpdateOption,
};
pub use modules::session::session::Session;
pub use modules::session::subscription::{
    FetchResult, FetchStream, NamespaceResult, RequestRejection, SubscribeResult, Subscription,
    TrackStatusInfo,
};
pub use modules::transport::protocol::TransportProtocol;
pub use modules::transport::read_error::TransportError;
pub use modules::transport::transport_connection::TransportConnection;
pub use modules::transport::transport_connection_creator::TransportConnectionCreator;
pub use modules::transport::transport_receive_stream::TransportReceiveStream;
pub use modules::transport::transport_send_stream::TransportSendStream;
