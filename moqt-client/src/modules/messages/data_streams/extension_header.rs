use std::collections::HashMap;

use bytes::Bytes;
use once_cell::sync::Lazy;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;

/// Extension header type codes used by media applications. Even codes carry
/// varints, odd codes carry byte blobs.
pub const CAPTURE_TIMESTAMP: u64 = 2;
pub const VIDEO_FRAME_MARKING: u64 = 4;
pub const AUDIO_LEVEL: u64 = 6;
pub const VIDEO_CONFIG: u64 = 13;

static EXTENSION_CATALOG: Lazy<HashMap<u64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (CAPTURE_TIMESTAMP, "capture-timestamp"),
        (VIDEO_FRAME_MARKING, "video-frame-marking"),
        (AUDIO_LEVEL, "audio-level"),
        (VIDEO_CONFIG, "video-config"),
    ])
});

/// Returns the registered name of an extension type, if any.
pub fn describe(key: u64) -> Option<&'static str> {
    EXTENSION_CATALOG.get(&key).copied()
}

/// Ordered collection of extension headers attached to an object. Typed
/// accessors cover the recognized catalog; everything else is preserved
/// untouched and round-trips through forwarding paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtensionHeaders {
    pairs: Vec<KeyValuePair>,
}

impl ExtensionHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<KeyValuePair>) -> Self {
        Self { pairs }
    }

    pub fn into_pairs(self) -> Vec<KeyValuePair> {
        self.pairs
    }

    pub fn pairs(&self) -> &[KeyValuePair] {
        &self.pairs
    }

    pub fn push(&mut self, pair: KeyValuePair) {
        self.pairs.push(pair);
    }

    pub fn with_capture_timestamp(mut self, timestamp: u64) -> Self {
        self.pairs
            .push(KeyValuePair::try_new_varint(CAPTURE_TIMESTAMP, timestamp).expect("even code"));
        self
    }

    pub fn with_video_frame_marking(mut self, marking: u64) -> Self {
        self.pairs
            .push(KeyValuePair::try_new_varint(VIDEO_FRAME_MARKING, marking).expect("even code"));
        self
    }

    pub fn with_audio_level(mut self, level: u64) -> Self {
        self.pairs
            .push(KeyValuePair::try_new_varint(AUDIO_LEVEL, level).expect("even code"));
        self
    }

    pub fn try_with_video_config(mut self, config: Bytes) -> Result<Self, CodecError> {
        self.pairs
            .push(KeyValuePair::try_new_bytes(VIDEO_CONFIG, config)?);
        Ok(self)
    }

    pub fn capture_timestamp(&self) -> Option<u64> {
        self.varint(CAPTURE_TIMESTAMP)
    }

    pub fn video_frame_marking(&self) -> Option<u64> {
        self.varint(VIDEO_FRAME_MARKING)
    }

    pub fn audio_level(&self) -> Option<u64> {
        self.varint(AUDIO_LEVEL)
    }

    pub fn video_config(&self) -> Option<&Bytes> {
        self.pairs
            .iter()
            .find(|pair| pair.key() == VIDEO_CONFIG)
            .and_then(|pair| pair.as_bytes())
    }

    fn varint(&self, key: u64) -> Option<u64> {
        self.pairs
            .iter()
            .find(|pair| pair.key() == key)
            .and_then(|pair| pair.as_varint())
    }
}
