use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::util::{read_parameters, write_parameters};
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::models::tuple::Tuple;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

/// Advertises that tracks under a namespace are available from this
/// endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishNamespace {
    pub request_id: u64,
    pub track_namespace: Tuple,
    pub parameters: Vec<KeyValuePair>,
}

impl PublishNamespace {
    pub fn new(request_id: u64, track_namespace: Tuple, parameters: Vec<KeyValuePair>) -> Self {
        Self {
            request_id,
            track_namespace,
            parameters,
        }
    }
}

impl MOQTPayload for PublishNamespace {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let request_id = read_variable_integer(cur)?;
        let track_namespace = Tuple::depacketize(cur)?;
        let parameters = read_parameters(cur)?;
        Ok(Self {
            request_id,
            track_namespace,
            parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.request_id));
        self.track_namespace.packetize(buf);
        write_parameters(buf, &self.parameters);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::messages::control_messages::publish_namespace::PublishNamespace;
    use crate::modules::messages::moqt_payload::MOQTPayload;
    use crate::modules::models::tuple::Tuple;

    #[test]
    fn round_trip() {
        let publish_namespace =
            PublishNamespace::new(8, Tuple::from_utf8_path("moqtail/r1"), vec![]);

        let mut buf = BytesMut::new();
        publish_namespace.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(
            PublishNamespace::depacketize(&mut cur).unwrap(),
            publish_namespace
        );
    }
}
