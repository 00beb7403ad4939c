use std::time::Duration;

use crate::modules::constants::MOQ_TRANSPORT_VERSION;
use crate::modules::messages::control_messages::fetch::{
    FetchType, JoiningFetchProps, StandAloneFetchProps,
};
use crate::modules::messages::control_messages::group_order::GroupOrder;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::location::Location;
use crate::modules::messages::control_messages::subscribe::FilterType;
use crate::modules::models::track::FullTrackName;

/// Session-wide knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub supported_versions: Vec<u64>,
    /// Optional PATH setup parameter.
    pub path: Option<String>,
    /// MAX_REQUEST_ID granted to the peer in CLIENT_SETUP.
    pub max_request_id: u64,
    pub max_auth_token_cache_size: Option<u64>,
    /// First request id this endpoint allocates. Some relays expect 0,
    /// others 1; stride is always 2.
    pub initial_request_id: u64,
    /// Bound on individual control stream reads. `None` waits forever.
    pub control_stream_timeout: Option<Duration>,
    /// Bound on individual data stream reads.
    pub data_stream_timeout: Option<Duration>,
    /// Capacity of each subscription's and fetch's object queue.
    pub object_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            supported_versions: vec![MOQ_TRANSPORT_VERSION],
            path: None,
            max_request_id: 1000,
            max_auth_token_cache_size: None,
            initial_request_id: 0,
            control_stream_timeout: None,
            data_stream_timeout: Some(Duration::from_secs(15)),
            object_queue_capacity: 1024,
        }
    }
}

/// Parameters of an outgoing SUBSCRIBE.
#[derive(Debug, Clone)]
pub struct SubscribeOption {
    pub full_track_name: FullTrackName,
    /// Pinned track alias; a random unused 60-bit alias is drawn when
    /// `None`.
    pub track_alias: Option<u64>,
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,
    pub forward: bool,
    pub filter_type: FilterType,
    pub start_location: Option<Location>,
    pub end_group: Option<u64>,
    pub subscribe_parameters: Vec<KeyValuePair>,
}

impl SubscribeOption {
    pub fn new(full_track_name: FullTrackName) -> Self {
        Self {
            full_track_name,
            track_alias: None,
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            forward: true,
            filter_type: FilterType::LatestObject,
            start_location: None,
            end_group: None,
            subscribe_parameters: vec![],
        }
    }
}

/// Parameters of an outgoing SUBSCRIBE_UPDATE. Updates may only narrow the
/// subscription window.
#[derive(Debug, Clone)]
pub struct SubscribeUpdateOption {
    pub request_id: u64,
    pub start_location: Location,
    pub end_group: Option<u64>,
    pub subscriber_priority: u8,
    pub forward: bool,
    pub subscribe_parameters: Vec<KeyValuePair>,
}

/// Parameters of an outgoing FETCH.
#[derive(Debug, Clone)]
pub struct FetchOption {
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,
    pub fetch_type: FetchType,
    pub standalone_fetch_props: Option<StandAloneFetchProps>,
    pub joining_fetch_props: Option<JoiningFetchProps>,
    pub parameters: Vec<KeyValuePair>,
}

impl FetchOption {
    pub fn standalone(props: StandAloneFetchProps) -> Self {
        Self {
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            fetch_type: FetchType::StandAlone,
            standalone_fetch_props: Some(props),
            joining_fetch_props: None,
            parameters: vec![],
        }
    }

    pub fn joining(fetch_type: FetchType, props: JoiningFetchProps) -> Self {
        Self {
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            fetch_type,
            standalone_fetch_props: None,
            joining_fetch_props: Some(props),
            parameters: vec![],
        }
    }
}
