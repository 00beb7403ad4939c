use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;

/// Common behavior of every wire payload.
///
/// `depacketize` reads from a cursor over the receive buffer and never
/// consumes the underlying buffer itself: callers commit the cursor position
/// on success and simply retry once more bytes arrive on
/// `CodecError::NotEnoughBytes`.
///
/// `packetize` is infallible; any length or formatting bound is enforced
/// when the payload is constructed.
pub trait MOQTPayload: Send + Sync {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError>
    where
        Self: Sized;

    fn packetize(&self, buf: &mut BytesMut);
}
