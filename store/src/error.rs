use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// `Set::add` on a member already present in the set.
    AlreadyExists,

    /// `Set::remove` or `Map::remove` on a member/field not present.
    NotFound,

    /// The backing store rejected the operation (connection failure, redis error, ...).
    Backend(String),

    /// A value could not be serialized or deserialized.
    Codec(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "member already exists"),
            Self::NotFound => write!(f, "member not found"),
            Self::Backend(msg) => write!(f, "store backend error: {msg}"),
            Self::Codec(msg) => write!(f, "store codec error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(feature = "redis_conn")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
