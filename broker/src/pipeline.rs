// Two-stage fan-out: PUBLISH handlers push onto a single ingress queue; a mailman
// worker pops from it and copies the message into every subscriber's notify queue,
// reassigning a fresh, subscriber-scoped id to each copy. Grounded on the original
// broker's store.go (`QueueMessage`/`QueueMessageForSubscribers`) and
// cmd/mailman/main.go's pop-then-fan-out loop.
//
// The id a publisher chose is only meaningful to that publisher; open question left
// by the source is how to generate the broker-assigned id each subscriber's copy
// gets. This uses a monotonic counter with collision retry against the subscriber's
// unacked map, which guarantees distinctness within that subscriber's in-flight
// window deterministically, unlike a wall-clock-derived id.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use posthorn_codec::QoS;
use posthorn_store::Store;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ErrorKind};
use crate::types::{
    client_notify_queue, client_unacked_map, topic_subscribers_set, QueuedMessage, INGRESS_QUEUE,
};

/// # Errors
///
/// Returns a store error if the ingress queue push fails.
pub async fn publish(
    store: &dyn Store,
    topic: &str,
    payload: Vec<u8>,
    qos: QoS,
    publisher_id: u16,
) -> Result<(), Error> {
    let message = QueuedMessage {
        id: publisher_id,
        topic: topic.to_string(),
        payload,
        qos,
        duplicate: false,
        send_time_unix_ms: None,
    };
    store.queue().push(INGRESS_QUEUE, message.encode()).await?;
    Ok(())
}

pub struct Mailman {
    store: Arc<dyn Store>,
    next_id: AtomicU16,
}

impl Mailman {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            next_id: AtomicU16::new(1),
        }
    }

    /// Pop and fan out messages until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns a store error if popping the ingress queue itself fails; a single
    /// message that fails to fan out is logged and skipped rather than aborting
    /// the loop.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), Error> {
        loop {
            let Some(bytes) = self.store.queue().pop(INGRESS_QUEUE, cancel).await? else {
                return Ok(());
            };
            if let Err(err) = self.fan_out(&bytes).await {
                log::warn!("mailman: failed to fan out message: {err}");
            }
        }
    }

    async fn fan_out(&self, bytes: &[u8]) -> Result<(), Error> {
        let message = QueuedMessage::decode(bytes)
            .map_err(|err| Error::new(ErrorKind::StoreError, &err.to_string()))?;

        let subscribers_key = topic_subscribers_set(&message.topic);
        let mut subscribers = Vec::new();
        self.store
            .set()
            .scan(&subscribers_key, &mut |client_id| subscribers.push(client_id))
            .await?;

        for client_id in subscribers {
            if let Err(err) = self.deliver_to(&client_id, &message).await {
                log::warn!("mailman: failed to deliver to {client_id}: {err}");
            }
        }
        Ok(())
    }

    async fn deliver_to(&self, client_id: &str, message: &QueuedMessage) -> Result<(), Error> {
        let mut copy = message.clone();
        copy.duplicate = false;
        copy.send_time_unix_ms = None;

        if message.qos == QoS::AtLeastOnce {
            let unacked_key = client_unacked_map(client_id);
            copy.id = self.allocate_id(&unacked_key).await?;
            self.store
                .map()
                .set(&unacked_key, &copy.id.to_string(), copy.encode())
                .await?;
        } else {
            copy.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        }

        self.store
            .queue()
            .push(&client_notify_queue(client_id), copy.encode())
            .await?;
        Ok(())
    }

    /// Find an id not already present in `unacked_key`, retrying past collisions.
    async fn allocate_id(&self, unacked_key: &str) -> Result<u16, Error> {
        for _ in 0..u16::MAX {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id == 0 {
                continue;
            }
            if self.store.map().get(unacked_key, &id.to_string()).await?.is_none() {
                return Ok(id);
            }
        }
        Err(Error::new(
            ErrorKind::StoreError,
            "exhausted subscriber message ids",
        ))
    }
}
