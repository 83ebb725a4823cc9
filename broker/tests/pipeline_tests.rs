// Grounded on the original broker's broker_test.go: AddClient uniqueness,
// Subscribe/Unsubscribe uniqueness, and QoS-0 vs QoS-1 fan-out through the ingress
// queue into a subscriber's notify queue.

use std::sync::Arc;

use posthorn::pipeline::{publish, Mailman};
use posthorn::types::{
    client_notify_queue, client_subscriptions_set, client_unacked_map, topic_subscribers_set,
    QueuedMessage, CLIENTS_SET,
};
use posthorn_codec::QoS;
use posthorn_store::memory::MemoryStore;
use posthorn_store::{Map, Queue, Set, Store};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn add_client_rejects_duplicate_id() {
    let store = MemoryStore::new();
    store.add(CLIENTS_SET, "alice").await.unwrap();
    assert!(store.add(CLIENTS_SET, "alice").await.is_err());

    store.remove(CLIENTS_SET, "alice").await.unwrap();
    store.add(CLIENTS_SET, "alice").await.unwrap();
}

#[tokio::test]
async fn subscribe_twice_is_rejected_at_the_set_layer() {
    let store = MemoryStore::new();
    let subscribers = topic_subscribers_set("sensors/temp");
    store.add(&subscribers, "alice").await.unwrap();
    assert!(store.add(&subscribers, "alice").await.is_err());

    store.remove(&subscribers, "alice").await.unwrap();
    store.add(&subscribers, "alice").await.unwrap();
}

/// Mirrors `Session::handle_subscribe`'s write order: `client/<id>/subscriptions`
/// first, `topic/<t>/subscribers` second, with a compensating removal of the first
/// if the second fails. A duplicate subscribe must fail the whole operation rather
/// than being silently treated as success.
async fn subscribe(store: &MemoryStore, client_id: &str, topic: &str) -> bool {
    let subscriptions_key = client_subscriptions_set(client_id);
    let subscribers_key = topic_subscribers_set(topic);
    match store.add(&subscriptions_key, topic).await {
        Ok(()) => match store.add(&subscribers_key, client_id).await {
            Ok(()) => true,
            Err(_) => {
                store.remove(&subscriptions_key, topic).await.unwrap();
                false
            }
        },
        Err(_) => false,
    }
}

#[tokio::test]
async fn subscribe_twice_fails_and_both_sides_stay_in_sync() {
    let store = MemoryStore::new();

    assert!(subscribe(&store, "alice", "sensors/temp").await);
    assert!(!subscribe(&store, "alice", "sensors/temp").await);

    let subscriptions = client_subscriptions_set("alice");
    let subscribers = topic_subscribers_set("sensors/temp");
    assert_eq!(store.members(&subscriptions).await.unwrap(), vec!["sensors/temp"]);
    assert_eq!(store.members(&subscribers).await.unwrap(), vec!["alice"]);
}

async fn pop_one(store: &MemoryStore, key: &str) -> Option<QueuedMessage> {
    let cancel = CancellationToken::new();
    tokio::time::timeout(std::time::Duration::from_millis(50), store.pop(key, &cancel))
        .await
        .ok()
        .flatten()
        .map(|bytes| QueuedMessage::decode(&bytes).unwrap())
}

#[tokio::test]
async fn qos0_message_is_fanned_out_without_an_unacked_entry() {
    let store = Arc::new(MemoryStore::new());
    let subscribers = topic_subscribers_set("sensors/temp");
    store.add(&subscribers, "alice").await.unwrap();

    publish(&*store, "sensors/temp", b"21C".to_vec(), QoS::AtMostOnce, 7)
        .await
        .unwrap();

    let mailman = Mailman::new(store.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();
    // run() returns as soon as the single queued message is popped and cancellation
    // is observed on the next iteration.
    let run_cancel = CancellationToken::new();
    tokio::spawn({
        let run_cancel = run_cancel.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            run_cancel.cancel();
        }
    });
    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        mailman.run(&run_cancel),
    )
    .await;

    let delivered = pop_one(&store, &client_notify_queue("alice")).await;
    let delivered = delivered.expect("qos0 message should have been fanned out");
    assert_eq!(delivered.topic, "sensors/temp");
    assert_eq!(delivered.qos, QoS::AtMostOnce);

    let mut unacked_fields = Vec::new();
    store
        .map()
        .scan(&client_unacked_map("alice"), &mut |field, _| {
            unacked_fields.push(field)
        })
        .await
        .unwrap();
    assert!(unacked_fields.is_empty());
}

#[tokio::test]
async fn qos1_message_is_stored_unacked_before_notify_push() {
    let store = Arc::new(MemoryStore::new());
    let subscribers = topic_subscribers_set("sensors/temp");
    store.add(&subscribers, "alice").await.unwrap();

    publish(&*store, "sensors/temp", b"21C".to_vec(), QoS::AtLeastOnce, 1234)
        .await
        .unwrap();

    let mailman = Mailman::new(store.clone());
    let run_cancel = CancellationToken::new();
    tokio::spawn({
        let run_cancel = run_cancel.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            run_cancel.cancel();
        }
    });
    let _ = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        mailman.run(&run_cancel),
    )
    .await;

    let mut unacked = Vec::new();
    store
        .map()
        .scan(&client_unacked_map("alice"), &mut |field, bytes| {
            unacked.push((field, QueuedMessage::decode(&bytes).unwrap()))
        })
        .await
        .unwrap();
    assert_eq!(unacked.len(), 1);

    let delivered = pop_one(&store, &client_notify_queue("alice"))
        .await
        .expect("qos1 message should have been fanned out");
    // The subscriber's copy gets a freshly broker-assigned id distinct from the id
    // the publisher originally chose.
    assert_ne!(delivered.id, 1234);
    assert_eq!(delivered.id.to_string(), unacked[0].0);
}
