//! Generic Set/Map/Queue views the broker builds its subscription and message state
//! on top of. Two implementations are provided: an in-memory backend for a single
//! broker process, and an (optional) Redis-backed one so several broker frontends can
//! share state and scale horizontally.
//!
//! Neither backend nor caller assumes anything about key naming; the broker crate
//! owns the registry of key namespaces (`clients`, `topic/<t>/subscribers`, ...).

mod error;
pub mod memory;
#[cfg(feature = "redis_conn")]
pub mod redis_backend;

pub use error::Error;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// An unordered collection of unique string members.
#[async_trait]
pub trait Set: Send + Sync {
    /// Add `member` to `key`. Fails with [`Error::AlreadyExists`] if already present.
    async fn add(&self, key: &str, member: &str) -> Result<(), Error>;

    /// Remove `member` from `key`. Fails with [`Error::NotFound`] if absent.
    async fn remove(&self, key: &str, member: &str) -> Result<(), Error>;

    /// All members currently in `key`.
    async fn members(&self, key: &str) -> Result<Vec<String>, Error>;

    /// Incrementally scan `key`'s members, invoking `f` for each one. Semantically
    /// equivalent to `members` for the in-memory backend; backed by `SSCAN` for Redis
    /// so a slow scan does not block other clients of the same set.
    async fn scan(&self, key: &str, f: &mut (dyn FnMut(String) + Send)) -> Result<(), Error>;

    /// Drop `key` and all of its members.
    async fn destroy(&self, key: &str) -> Result<(), Error>;
}

/// A string-keyed map of opaque byte values.
#[async_trait]
pub trait Map: Send + Sync {
    /// Fetch `field`'s value, or `None` if absent.
    async fn get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Upsert `field` to `value`.
    async fn set(&self, key: &str, field: &str, value: Vec<u8>) -> Result<(), Error>;

    /// Remove `field`. Fails with [`Error::NotFound`] if absent.
    async fn remove(&self, key: &str, field: &str) -> Result<(), Error>;

    /// Incrementally scan `key`'s fields, invoking `f` for each `(field, value)` pair.
    async fn scan(
        &self,
        key: &str,
        f: &mut (dyn FnMut(String, Vec<u8>) + Send),
    ) -> Result<(), Error>;

    /// Drop `key` and all of its fields.
    async fn destroy(&self, key: &str) -> Result<(), Error>;
}

/// A FIFO queue of opaque byte values, shared across however many broker/mailman
/// processes are attached to the same backend.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Push `value` onto the back of `key`.
    async fn push(&self, key: &str, value: Vec<u8>) -> Result<(), Error>;

    /// Pop the front of `key`, blocking until an element is available or `cancel` is
    /// triggered. Returns `Ok(None)` only when cancelled.
    async fn pop(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, Error>;

    /// Drop `key` and any elements still queued on it.
    async fn destroy(&self, key: &str) -> Result<(), Error>;
}

/// The three views a backend must provide, bundled so broker code can hold a single
/// `Arc<dyn Store>` rather than three separate trait objects.
pub trait Store: Send + Sync {
    fn set(&self) -> &dyn Set;
    fn map(&self) -> &dyn Map;
    fn queue(&self) -> &dyn Queue;
}
