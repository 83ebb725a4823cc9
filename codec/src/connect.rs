// CONNECT / CONNACK. Grounded on the original broker's ConnectFixedHeader plus its
// three length-prefixed payload strings (client id, username, password); the teacher
// codec's richer v3 ConnectPacket (Will topic/message, protocol level branching for
// v3.1 vs v3.1.1) is not reproduced since this broker only ever speaks one protocol
// level and never accepts a Will.

use crate::byte_array::ByteArray;
use crate::error::Error;
use crate::header::{write_fixed_header, PacketType};

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

const FLAG_USERNAME: u8 = 0b1000_0000;
const FLAG_PASSWORD: u8 = 0b0100_0000;
const MANDATORY_FLAGS: u8 = FLAG_USERNAME | FLAG_PASSWORD;

#[derive(Debug, Clone)]
pub struct ConnectPacket {
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl ConnectPacket {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteArray::new(body);
        let protocol_name = reader.read_string()?;
        if protocol_name != PROTOCOL_NAME {
            return Err(Error::InvalidProtocolName);
        }
        let protocol_level = reader.read_u8()?;
        if protocol_level != PROTOCOL_LEVEL {
            return Err(Error::InvalidProtocolLevel);
        }
        let connect_flags = reader.read_u8()?;
        if connect_flags & MANDATORY_FLAGS != MANDATORY_FLAGS {
            return Err(Error::EmptyField("connect flags"));
        }
        let _keep_alive = reader.read_u16()?;

        let client_id = reader.read_string()?;
        if client_id.is_empty() {
            return Err(Error::EmptyField("client id"));
        }
        let username = reader.read_string()?;
        if username.is_empty() {
            return Err(Error::EmptyField("username"));
        }
        let password = reader.read_string()?;
        if password.is_empty() {
            return Err(Error::EmptyField("password"));
        }

        Ok(Self {
            client_id,
            username,
            password,
        })
    }
}

/// CONNACK return codes, per the original broker's `ReturnCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectReturnCode {
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUsernameOrPassword = 4,
    NotAuthorized = 5,
}

#[derive(Debug, Clone, Copy)]
pub struct ConnAckPacket {
    pub return_code: ConnectReturnCode,
}

impl ConnAckPacket {
    #[must_use]
    pub const fn new(return_code: ConnectReturnCode) -> Self {
        Self { return_code }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        write_fixed_header(out, PacketType::ConnAck, 2)?;
        out.push(0); // session present flag: always 0, clean-session only
        out.push(self.return_code as u8);
        Ok(())
    }
}
