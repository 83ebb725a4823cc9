// Feeder half of the delivery loop: pop the subscriber's notify queue and forward to
// an internal channel the run loop drains; on idle, scan the unacked map for entries
// that were never sent or are older than the redelivery window and re-feed them.
// Grounded on the original broker's queueMessages goroutine in client.go.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use posthorn_codec::{PublishPacket, QoS};
use posthorn_store::Store;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::types::{client_notify_queue, client_unacked_map, QueuedMessage};

use super::Session;

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before 1970")
        .as_millis() as i64
}

pub fn spawn_feeder(
    store: Arc<dyn Store>,
    client_id: String,
    to_session: mpsc::Sender<QueuedMessage>,
    cancel: CancellationToken,
    idle: Duration,
) {
    tokio::spawn(async move {
        let notify_key = client_notify_queue(&client_id);
        let unacked_key = client_unacked_map(&client_id);

        loop {
            let popped = tokio::time::timeout(idle, store.queue().pop(&notify_key, &cancel)).await;
            match popped {
                Ok(Ok(Some(bytes))) => {
                    let Ok(message) = QueuedMessage::decode(&bytes) else {
                        log::warn!("feeder {client_id}: dropping malformed queued message");
                        continue;
                    };
                    if to_session.send(message).await.is_err() {
                        return;
                    }
                }
                Ok(Ok(None)) => return, // cancelled
                Ok(Err(err)) => {
                    log::warn!("feeder {client_id}: notify queue pop failed: {err}");
                    return;
                }
                Err(_elapsed) => {
                    if cancel.is_cancelled() {
                        return;
                    }
                    if let Err(err) =
                        refeed_stale(&*store, &unacked_key, &to_session, idle).await
                    {
                        log::warn!("feeder {client_id}: redelivery scan failed: {err}");
                    }
                }
            }
        }
    });
}

async fn refeed_stale(
    store: &dyn Store,
    unacked_key: &str,
    to_session: &mpsc::Sender<QueuedMessage>,
    idle: Duration,
) -> Result<(), Error> {
    let idle_ms = i64::try_from(idle.as_millis()).unwrap_or(i64::MAX);
    let now = now_unix_ms();
    let mut stale = Vec::new();

    store
        .map()
        .scan(unacked_key, &mut |_field, bytes| {
            if let Ok(message) = QueuedMessage::decode(&bytes) {
                let is_stale = if !message.duplicate {
                    true
                } else {
                    match message.send_time_unix_ms {
                        None => true,
                        Some(sent_at) => now.saturating_sub(sent_at) > idle_ms,
                    }
                };
                if is_stale {
                    stale.push(message);
                }
            }
        })
        .await?;

    for message in stale {
        if to_session.send(message).await.is_err() {
            return Ok(());
        }
    }
    Ok(())
}

impl Session {
    /// The sender half of the delivery loop: write out a PUBLISH frame for a message
    /// the feeder forwarded. For QoS 1, the unacked map is updated to mark the entry
    /// sent *before* the frame is written, so a crash between the two never loses the
    /// fact that a delivery was attempted.
    pub(super) async fn send_queued_message(&mut self, mut message: QueuedMessage) -> Result<(), Error> {
        let dup = if message.qos == QoS::AtLeastOnce {
            message.duplicate = true;
            message.send_time_unix_ms = Some(now_unix_ms());
            if let Some(client_id) = &self.client_id {
                self.store
                    .map()
                    .set(
                        &client_unacked_map(client_id),
                        &message.id.to_string(),
                        message.encode(),
                    )
                    .await?;
            }
            true
        } else {
            false
        };

        let packet = PublishPacket {
            dup,
            qos: message.qos,
            packet_id: (message.qos == QoS::AtLeastOnce).then_some(message.id),
            topic: message.topic,
            payload: message.payload,
        };
        let mut out = Vec::new();
        packet.encode(&mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }
}
