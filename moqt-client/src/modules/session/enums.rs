use bytes::Bytes;

use crate::modules::models::tuple::Tuple;

/// Lifecycle and discovery notifications surfaced to the caller through
/// `Session::receive_event`. Handlers must not call back into blocking
/// session APIs.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The peer published a namespace.
    NamespacePublished { track_namespace: Tuple },
    /// The peer withdrew a namespace.
    NamespaceUnpublished { track_namespace: Tuple },
    /// The peer canceled a namespace this endpoint had published.
    NamespaceCanceled {
        track_namespace: Tuple,
        error_code: u64,
        reason_phrase: String,
    },
    /// The peer registered interest in a namespace prefix.
    AnnouncesSubscribed { track_namespace_prefix: Tuple },
    /// The peer withdrew interest in a namespace prefix.
    AnnouncesUnsubscribed { track_namespace_prefix: Tuple },
    /// The peer asked this endpoint to migrate.
    GoAway { new_session_uri: Bytes },
    /// The session was torn down. Emitted exactly once.
    Terminated { reason: String },
}
