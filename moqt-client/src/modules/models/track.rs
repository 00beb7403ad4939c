use std::fmt;
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::broadcast;

use crate::modules::constants::{MAX_FULL_TRACK_NAME_LENGTH, MAX_NAMESPACE_FIELDS};
use crate::modules::errors::{CodecError, SessionError};
use crate::modules::messages::control_messages::location::Location;
use crate::modules::models::moqt_object::MoqtObject;
use crate::modules::models::tuple::Tuple;
use crate::modules::variable_bytes::{read_variable_bytes, write_variable_bytes};

/// Protocol-level identity of a track: a namespace tuple plus a name.
/// Immutable after construction; the constructor enforces the namespace
/// field count (1..=32) and the total serialized size (≤ 4096 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullTrackName {
    namespace: Tuple,
    name: Bytes,
}

impl FullTrackName {
    pub fn try_new(namespace: Tuple, name: Bytes) -> Result<Self, SessionError> {
        if namespace.is_empty() || namespace.len() > MAX_NAMESPACE_FIELDS {
            return Err(SessionError::TrackName(format!(
                "namespace must have 1..={} fields, got {}",
                MAX_NAMESPACE_FIELDS,
                namespace.len()
            )));
        }
        let full_track_name = Self { namespace, name };
        let serialized_length = full_track_name.serialized_length();
        if serialized_length > MAX_FULL_TRACK_NAME_LENGTH {
            return Err(SessionError::TrackName(format!(
                "full track name is {} bytes, maximum is {}",
                serialized_length, MAX_FULL_TRACK_NAME_LENGTH
            )));
        }
        Ok(full_track_name)
    }

    pub fn namespace(&self) -> &Tuple {
        &self.namespace
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    fn serialized_length(&self) -> usize {
        let mut buf = BytesMut::new();
        self.packetize(&mut buf);
        buf.len()
    }

    pub(crate) fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let namespace = Tuple::depacketize(cur)?;
        let name = read_variable_bytes(cur)?;
        if namespace.is_empty() {
            return Err(CodecError::LengthExceedsMax {
                field: "namespace tuple",
                len: 0,
                max: MAX_NAMESPACE_FIELDS,
            });
        }
        let full_track_name = Self { namespace, name };
        let serialized_length = full_track_name.serialized_length();
        if serialized_length > MAX_FULL_TRACK_NAME_LENGTH {
            return Err(CodecError::LengthExceedsMax {
                field: "full track name",
                len: serialized_length,
                max: MAX_FULL_TRACK_NAME_LENGTH,
            });
        }
        Ok(full_track_name)
    }

    pub(crate) fn packetize(&self, buf: &mut BytesMut) {
        self.namespace.packetize(buf);
        buf.extend(write_variable_bytes(&self.name));
    }
}

impl fmt::Display for FullTrackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, String::from_utf8_lossy(&self.name))
    }
}

/// How a track's objects travel to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingPreference {
    Subgroup,
    Datagram,
}

/// Caller-side producer of live objects. Publications attach to the source
/// via an internal broadcast receiver; objects published while no
/// publication is attached are dropped, but they still raise the source's
/// largest-location high-water mark so late joiners resolve their filters
/// against what was actually produced.
#[derive(Debug, Clone)]
pub struct LiveSource {
    sender: broadcast::Sender<MoqtObject>,
    largest_location: Arc<RwLock<Option<Location>>>,
}

impl LiveSource {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            largest_location: Arc::new(RwLock::new(None)),
        }
    }

    pub fn publish(&self, object: MoqtObject) {
        {
            let mut largest = self
                .largest_location
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if largest.is_none_or(|current| object.location > current) {
                *largest = Some(object.location);
            }
        }
        // No receivers means no active publication; nothing to deliver.
        let _ = self.sender.send(object);
    }

    /// Largest location ever published on this source.
    pub fn largest_location(&self) -> Option<Location> {
        *self
            .largest_location
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn attach(&self) -> broadcast::Receiver<MoqtObject> {
        self.sender.subscribe()
    }
}

impl Default for LiveSource {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Random-access provider of past objects, drained by fetch publications.
#[async_trait]
pub trait PastObjectSource: Send + Sync {
    /// Returns the objects in `[start, end]`, ordered ascending by location.
    async fn get_range(
        &self,
        start: Location,
        end: Location,
    ) -> Result<Vec<MoqtObject>, SessionError>;

    /// Largest location this source can serve, when it knows it.
    async fn largest_location(&self) -> Result<Option<Location>, SessionError> {
        Ok(None)
    }
}

/// A caller-registered track. Registering a track causes no wire activity
/// until the peer subscribes or fetches.
#[derive(Clone)]
pub struct Track {
    pub full_track_name: FullTrackName,
    pub forwarding_preference: ForwardingPreference,
    pub publisher_priority: u8,
    pub live: Option<LiveSource>,
    pub past: Option<Arc<dyn PastObjectSource>>,
}

impl Track {
    pub fn new(
        full_track_name: FullTrackName,
        forwarding_preference: ForwardingPreference,
        publisher_priority: u8,
    ) -> Self {
        Self {
            full_track_name,
            forwarding_preference,
            publisher_priority,
            live: None,
            past: None,
        }
    }

    pub fn with_live_source(mut self, live: LiveSource) -> Self {
        self.live = Some(live);
        self
    }

    pub fn with_past_source(mut self, past: Arc<dyn PastObjectSource>) -> Self {
        self.past = Some(past);
        self
    }

    /// Largest location this endpoint has produced for the track: the live
    /// source's high-water mark, falling back to the past source.
    pub async fn largest_location(&self) -> Option<Location> {
        if let Some(location) = self.live.as_ref().and_then(|live| live.largest_location()) {
            return Some(location);
        }
        if let Some(past) = &self.past {
            match past.largest_location().await {
                Ok(location) => return location,
                Err(error) => {
                    tracing::warn!("past source failed to report its largest location: {}", error);
                    return None;
                }
            }
        }
        None
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("full_track_name", &self.full_track_name)
            .field("forwarding_preference", &self.forwarding_preference)
            .field("publisher_priority", &self.publisher_priority)
            .field("live", &self.live.is_some())
            .field("past", &self.past.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{Bytes, BytesMut};

    use crate::modules::errors::SessionError;
    use crate::modules::models::track::FullTrackName;
    use crate::modules::models::tuple::Tuple;

    #[test]
    fn round_trip() {
        let name = FullTrackName::try_new(
            Tuple::from_utf8_path("moqtail/r1/u1"),
            Bytes::from_static(b"video"),
        )
        .unwrap();

        let mut buf = BytesMut::new();
        name.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(FullTrackName::depacketize(&mut cur).unwrap(), name);
    }

    #[test]
    fn rejects_empty_namespace() {
        let result = FullTrackName::try_new(Tuple::new(vec![]), Bytes::from_static(b"video"));
        assert!(matches!(result, Err(SessionError::TrackName(_))));
    }

    #[test]
    fn rejects_oversize_name() {
        let result = FullTrackName::try_new(
            Tuple::from_utf8_path("ns"),
            Bytes::from(vec![b'x'; 4096]),
        );
        assert!(matches!(result, Err(SessionError::TrackName(_))));
    }

    #[test]
    fn live_source_tracks_its_largest_published_location() {
        use crate::modules::messages::control_messages::location::Location;
        use crate::modules::messages::data_streams::object_status::ObjectStatus;
        use crate::modules::models::moqt_object::MoqtObject;
        use crate::modules::models::track::{ForwardingPreference, LiveSource};

        fn object(group: u64, object_id: u64) -> MoqtObject {
            MoqtObject::try_new(
                FullTrackName::try_new(
                    Tuple::from_utf8_path("test"),
                    Bytes::from_static(b"video"),
                )
                .unwrap(),
                Location::new(group, object_id),
                0,
                ForwardingPreference::Subgroup,
                Some(0),
                ObjectStatus::Normal,
                None,
                Some(Bytes::from_static(b"p")),
            )
            .unwrap()
        }

        let live = LiveSource::new(4);
        assert_eq!(live.largest_location(), None);

        // Published with no receiver attached: dropped, but counted.
        live.publish(object(2, 5));
        live.publish(object(1, 9));
        assert_eq!(live.largest_location(), Some(Location::new(2, 5)));

        live.publish(object(3, 0));
        assert_eq!(live.largest_location(), Some(Location::new(3, 0)));
    }
}
