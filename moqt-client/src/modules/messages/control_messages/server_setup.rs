use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::key_value_pair::KeyValuePair;
use crate::modules::messages::control_messages::setup_parameters::SetupParameter;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSetup {
    pub selected_version: u64,
    pub setup_parameters: Vec<SetupParameter>,
}

impl ServerSetup {
    pub fn new(selected_version: u64, setup_parameters: Vec<SetupParameter>) -> Self {
        Self {
            selected_version,
            setup_parameters,
        }
    }
}

impl MOQTPayload for ServerSetup {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let selected_version = read_variable_integer(cur)?;
        let number_of_parameters = read_variable_integer(cur)?;
        let mut setup_parameters = Vec::with_capacity(number_of_parameters as usize);
        for _ in 0..number_of_parameters {
            let pair = KeyValuePair::depacketize(cur)?;
            setup_parameters.push(SetupParameter::try_from_pair(pair)?);
        }
        Ok(Self {
            selected_version,
            setup_parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.selected_version));
        buf.extend(write_variable_integer(self.setup_parameters.len() as u64));
        for parameter in &self.setup_parameters {
            parameter.to_pair().packetize(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::modules::constants::MOQ_TRANSPORT_VERSION;
    use crate::modules::messages::control_messages::server_setup::ServerSetup;
    use crate::modules::messages::control_messages::setup_parameters::SetupParameter;
    use crate::modules::messages::moqt_payload::MOQTPayload;

    #[test]
    fn round_trip() {
        let server_setup = ServerSetup::new(
            MOQ_TRANSPORT_VERSION,
            vec![SetupParameter::MaxRequestId(128)],
        );

        let mut buf = BytesMut::new();
        server_setup.packetize(&mut buf);

        let mut cur = Cursor::new(&buf[..]);
        assert_eq!(ServerSetup::depacketize(&mut cur).unwrap(), server_setup);
    }

    #[test]
    fn packetize_without_parameters() {
        let server_setup = ServerSetup::new(MOQ_TRANSPORT_VERSION, vec![]);

        let mut buf = BytesMut::new();
        server_setup.packetize(&mut buf);

        let expected_bytes_array = [
            0xc0, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x0b, // Selected Version (i)
            0, // Number of Parameters (i)
        ];
        assert_eq!(buf.as_ref(), expected_bytes_array.as_slice());
    }
}
