//! Redis-backed store, letting several broker frontends (and the standalone mailman
//! workers) share one set of clients/subscriptions/queues. Grounded on the original
//! broker's redis.go: `SADD`/`SREM`/`SMEMBERS`/`SSCAN` for sets, `HSET`/`HDEL`/`HSCAN`
//! for maps, `LPUSH`/`BLPOP` for queues.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio_util::sync::CancellationToken;

use crate::{Error, Map, Queue, Set, Store};

/// `BLPOP` is reissued with this timeout so a pop can still notice cancellation
/// instead of blocking the connection forever.
const BLPOP_POLL_SECONDS: f64 = 1.0;

/// Members are returned a batch at a time so one slow scan never blocks other callers
/// the way a full `SMEMBERS`/`HGETALL` on a huge key would.
const SCAN_BATCH: usize = 200;

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(Error::from)?;
        let manager = client.get_connection_manager().await.map_err(Error::from)?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl Set for RedisStore {
    async fn add(&self, key: &str, member: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let added: i64 = conn.sadd(key, member).await?;
        if added == 0 {
            return Err(Error::AlreadyExists);
        }
        Ok(())
    }

    async fn remove(&self, key: &str, member: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.srem(key, member).await?;
        if removed == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, Error> {
        let mut conn = self.manager.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn scan(&self, key: &str, f: &mut (dyn FnMut(String) + Send)) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SSCAN")
                .arg(key)
                .arg(cursor)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            for member in batch {
                f(member);
            }
            if next_cursor == 0 {
                return Ok(());
            }
            cursor = next_cursor;
        }
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}

#[async_trait]
impl Map for RedisStore {
    async fn get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut conn = self.manager.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn set(&self, key: &str, field: &str, value: Vec<u8>) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str, field: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.hdel(key, field).await?;
        if removed == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn scan(
        &self,
        key: &str,
        f: &mut (dyn FnMut(String, Vec<u8>) + Send),
    ) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<(String, Vec<u8>)>) = redis::cmd("HSCAN")
                .arg(key)
                .arg(cursor)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            for (field, value) in batch {
                f(field, value);
            }
            if next_cursor == 0 {
                return Ok(());
            }
            cursor = next_cursor;
        }
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}

#[async_trait]
impl Queue for RedisStore {
    async fn push(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn pop(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, Error> {
        let mut conn = self.manager.clone();
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let reply: Option<(String, Vec<u8>)> = tokio::select! {
                () = cancel.cancelled() => return Ok(None),
                res = conn.blpop(key, BLPOP_POLL_SECONDS) => res?,
            };
            if let Some((_, value)) = reply {
                return Ok(Some(value));
            }
        }
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}

impl Store for RedisStore {
    fn set(&self) -> &dyn Set {
        self
    }

    fn map(&self) -> &dyn Map {
        self
    }

    fn queue(&self) -> &dyn Queue {
        self
    }
}
