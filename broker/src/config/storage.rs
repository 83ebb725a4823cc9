use serde::Deserialize;

/// Which `Store` implementation backs `clients`/`topic/*`/`messages`/....
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single-process, in-memory store. Does not support running more than one
    /// broker frontend against the same state.
    #[serde(alias = "memory")]
    Memory,

    /// Redis-backed store, shared across broker frontends and mailman workers.
    #[serde(alias = "redis")]
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Storage {
    /// Default is [`StorageBackend::Memory`].
    #[serde(default = "Storage::default_backend")]
    backend: StorageBackend,

    /// Connection URL used when `backend` is [`StorageBackend::Redis`].
    ///
    /// Default is "redis://127.0.0.1/".
    #[serde(default = "Storage::default_redis_url")]
    redis_url: String,
}

impl Storage {
    fn default_backend() -> StorageBackend {
        StorageBackend::Memory
    }

    fn default_redis_url() -> String {
        "redis://127.0.0.1/".to_string()
    }

    #[must_use]
    pub const fn backend(&self) -> StorageBackend {
        self.backend
    }

    #[must_use]
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: Self::default_backend(),
            redis_url: Self::default_redis_url(),
        }
    }
}
