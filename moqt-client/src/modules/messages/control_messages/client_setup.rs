use std::io::Cursor;

use bytes::BytesMut;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::setup_parameters::SetupParameter;
use crate::modules::messages::moqt_payload::MOQTPayload;
use crate::modules::variable_integer::{read_variable_integer, write_variable_integer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSetup {
    pub supported_versions: Vec<u64>,
    pub setup_parameters: Vec<SetupParameter>,
}

impl ClientSetup {
    pub fn new(supported_versions: Vec<u64>, setup_parameters: Vec<SetupParameter>) -> Self {
        Self {
            supported_versions,
            setup_parameters,
        }
    }
}

impl MOQTPayload for ClientSetup {
    fn depacketize(cur: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let number_of_supported_versions = read_variable_integer(cur)?;
        let mut supported_versions = Vec::with_capacity(number_of_supported_versions as usize);
        for _ in 0..number_of_supported_versions {
            supported_versions.push(read_variable_integer(cur)?);
        }
        let number_of_parameters = read_variable_integer(cur)?;
        let mut setup_parameters = Vec::with_capacity(number_of_parameters as usize);
        for _ in 0..number_of_parameters {
            let pair = crate::modules::messages::control_messages::key_value_pair::KeyValuePair::depacketize(cur)?;
            setup_parameters.push(SetupParameter::try_from_pair(pair)?);
        }
        Ok(Self {
            supported_versions,
            setup_parameters,
        })
    }

    fn packetize(&self, buf: &mut BytesMut) {
        buf.extend(write_variable_integer(self.supported_versions.len() as u64));
        for version in &self.supported_versions {
            buf.extend(write_variable_integer(*version));
        }
        buf.extend(write_variable_integer(self.setup_parameters.len() as u64));
        for parameter in &self.setup_parameters {
            parameter.to_pair().packetize(buf);
        }
    }
}
