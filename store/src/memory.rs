//! Single-process backend: sets and maps live behind a `std::sync::Mutex`-guarded
//! `HashMap`, and each queue key gets its own bounded `tokio::mpsc` channel created on
//! first use. Capacity 64 keeps a runaway publisher from growing memory without bound
//! while still giving the feeder/mailman tasks headroom before they start blocking.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use crate::{Error, Map, Queue, Set, Store};

const QUEUE_CAPACITY: usize = 64;

struct QueueChannel {
    sender: mpsc::Sender<Vec<u8>>,
    receiver: AsyncMutex<mpsc::Receiver<Vec<u8>>>,
}

#[derive(Default)]
pub struct MemoryStore {
    sets: Mutex<HashMap<String, HashSet<String>>>,
    maps: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
    queues: Mutex<HashMap<String, Arc<QueueChannel>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_channel(&self, key: &str) -> Arc<QueueChannel> {
        let mut queues = self.queues.lock().expect("queue registry poisoned");
        queues
            .entry(key.to_string())
            .or_insert_with(|| {
                let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
                Arc::new(QueueChannel {
                    sender,
                    receiver: AsyncMutex::new(receiver),
                })
            })
            .clone()
    }
}

#[async_trait]
impl Set for MemoryStore {
    async fn add(&self, key: &str, member: &str) -> Result<(), Error> {
        let mut sets = self.sets.lock().expect("set registry poisoned");
        let members = sets.entry(key.to_string()).or_default();
        if !members.insert(member.to_string()) {
            return Err(Error::AlreadyExists);
        }
        Ok(())
    }

    async fn remove(&self, key: &str, member: &str) -> Result<(), Error> {
        let mut sets = self.sets.lock().expect("set registry poisoned");
        match sets.get_mut(key) {
            Some(members) if members.remove(member) => Ok(()),
            _ => Err(Error::NotFound),
        }
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, Error> {
        let sets = self.sets.lock().expect("set registry poisoned");
        Ok(sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan(&self, key: &str, f: &mut (dyn FnMut(String) + Send)) -> Result<(), Error> {
        for member in self.members(key).await? {
            f(member);
        }
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut sets = self.sets.lock().expect("set registry poisoned");
        sets.remove(key);
        Ok(())
    }
}

#[async_trait]
impl Map for MemoryStore {
    async fn get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, Error> {
        let maps = self.maps.lock().expect("map registry poisoned");
        Ok(maps.get(key).and_then(|fields| fields.get(field).cloned()))
    }

    async fn set(&self, key: &str, field: &str, value: Vec<u8>) -> Result<(), Error> {
        let mut maps = self.maps.lock().expect("map registry poisoned");
        maps.entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str, field: &str) -> Result<(), Error> {
        let mut maps = self.maps.lock().expect("map registry poisoned");
        match maps.get_mut(key) {
            Some(fields) if fields.remove(field).is_some() => Ok(()),
            _ => Err(Error::NotFound),
        }
    }

    async fn scan(
        &self,
        key: &str,
        f: &mut (dyn FnMut(String, Vec<u8>) + Send),
    ) -> Result<(), Error> {
        let entries: Vec<(String, Vec<u8>)> = {
            let maps = self.maps.lock().expect("map registry poisoned");
            maps.get(key)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        for (field, value) in entries {
            f(field, value);
        }
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut maps = self.maps.lock().expect("map registry poisoned");
        maps.remove(key);
        Ok(())
    }
}

#[async_trait]
impl Queue for MemoryStore {
    async fn push(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        let channel = self.queue_channel(key);
        channel
            .sender
            .send(value)
            .await
            .map_err(|_| Error::Backend("queue receiver dropped".to_string()))
    }

    async fn pop(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, Error> {
        let channel = self.queue_channel(key);
        let mut receiver = channel.receiver.lock().await;
        tokio::select! {
            () = cancel.cancelled() => Ok(None),
            value = receiver.recv() => Ok(value),
        }
    }

    async fn destroy(&self, key: &str) -> Result<(), Error> {
        let mut queues = self.queues.lock().expect("queue registry poisoned");
        queues.remove(key);
        Ok(())
    }
}

impl Store for MemoryStore {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_fails_when_member_already_present() {
        let store = MemoryStore::new();
        store.add("clients", "alice").await.unwrap();
        assert!(matches!(
            store.add("clients", "alice").await,
            Err(Error::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn remove_fails_when_member_absent() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.remove("clients", "alice").await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn map_set_is_an_upsert() {
        let store = MemoryStore::new();
        store.set("users", "alice", b"one".to_vec()).await.unwrap();
        store.set("users", "alice", b"two".to_vec()).await.unwrap();
        assert_eq!(
            store.get("users", "alice").await.unwrap(),
            Some(b"two".to_vec())
        );
    }

    #[tokio::test]
    async fn queue_pop_returns_none_on_cancellation() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(store.pop("messages", &cancel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn queue_pop_returns_pushed_value() {
        let store = MemoryStore::new();
        store.push("messages", b"hello".to_vec()).await.unwrap();
        let cancel = CancellationToken::new();
        assert_eq!(
            store.pop("messages", &cancel).await.unwrap(),
            Some(b"hello".to_vec())
        );
    }
}
