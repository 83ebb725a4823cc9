// Grounded on the teacher crate's Error/ErrorKind split: a flat kind tag plus a
// free-form message, rather than a data-carrying enum per source.

use std::fmt::{self, Display};
use std::io;

use posthorn_codec::Error as CodecError;
use posthorn_store::Error as StoreError;

/// Represent the types of errors.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// Error occurred while performing I/O.
    IoError,

    /// Packet decode or encode error.
    CodecError,

    /// Store backend returned an error.
    StoreError,

    /// A client violated the protocol (bad CONNECT, packet before registration, ...).
    ProtocolError,

    /// A CONNECT or a subsequent publish/subscribe was rejected by authorization.
    NotAuthorized,

    /// Config file could not be parsed or failed validation.
    ConfigError,

    /// mpsc/broadcast channel error.
    ChannelError,
}

#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_owned(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::new(ErrorKind::IoError, &err.to_string())
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        Self::new(ErrorKind::CodecError, &err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorKind::StoreError, &err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::ConfigError, &err.to_string())
    }
}
