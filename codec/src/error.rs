// Wire-level errors produced while decoding or encoding MQTT control packets.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// Underlying transport failed while a packet was being read or written.
    Io(io::Error),

    /// The remaining-length field used more than 4 continuation bytes.
    MalformedRemainingLength,

    /// A length-prefixed field declared a length the buffer does not have.
    OutOfRange,

    /// Fixed header byte does not map to a known packet type.
    InvalidPacketType(u8),

    /// CONNECT protocol name was not `"MQTT"`.
    InvalidProtocolName,

    /// CONNECT protocol version was not `4`.
    InvalidProtocolLevel,

    /// Fixed-header QoS bits were `0b11` (QoS 2 is rejected at decode time).
    InvalidQoS,

    /// A length-prefixed string field that this packet requires to be non-empty was empty.
    EmptyField(&'static str),

    /// Payload bytes were not valid UTF-8.
    InvalidUtf8,

    /// Encoded remaining length would exceed 2,097,151 bytes.
    TooLarge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::MalformedRemainingLength => write!(f, "malformed remaining length"),
            Self::OutOfRange => write!(f, "buffer too short for declared field length"),
            Self::InvalidPacketType(t) => write!(f, "unknown packet type: {t}"),
            Self::InvalidProtocolName => write!(f, "bad protocol name"),
            Self::InvalidProtocolLevel => write!(f, "bad protocol version"),
            Self::InvalidQoS => write!(f, "invalid QoS level"),
            Self::EmptyField(name) => write!(f, "empty {name}"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 string"),
            Self::TooLarge => write!(f, "packet exceeds maximum remaining length"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8
    }
}
