// The registry of store key namespaces and the JSON shapes stored under them.
// Grounded on the original broker's store.go (`QueuedMessage`) and auth.go
// (`User`/`ACL`), translated from Go struct tags to serde field renames.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use posthorn_codec::QoS;

/// `clients`: the set of every currently-connected client id.
pub const CLIENTS_SET: &str = "clients";

/// `users`: a map of username to JSON-encoded [`User`].
pub const USERS_MAP: &str = "users";

/// `messages`: the single ingress queue every PUBLISH is pushed onto.
pub const INGRESS_QUEUE: &str = "messages";

#[must_use]
pub fn topic_subscribers_set(topic: &str) -> String {
    format!("topic/{topic}/subscribers")
}

#[must_use]
pub fn client_subscriptions_set(client_id: &str) -> String {
    format!("client/{client_id}/subscriptions")
}

#[must_use]
pub fn client_notify_queue(client_id: &str) -> String {
    format!("client/{client_id}/notify")
}

#[must_use]
pub fn client_unacked_map(client_id: &str) -> String {
    format!("client/{client_id}/messages")
}

fn qos_to_u8(qos: QoS) -> u8 {
    qos.bits()
}

fn qos_from_u8(bits: u8) -> QoS {
    QoS::from_bits(bits).unwrap_or(QoS::AtMostOnce)
}

/// A message in flight between the ingress queue and a subscriber's notify queue.
///
/// The `id` field means two different things depending on where the message sits:
/// at ingress it is the id the publisher chose; once the mailman fans it out to a
/// subscriber, the subscriber's copy gets a freshly broker-assigned id distinct
/// within that subscriber's in-flight window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: u16,
    pub topic: String,
    pub payload: Vec<u8>,
    #[serde(with = "qos_serde")]
    pub qos: QoS,
    #[serde(rename = "dup", default)]
    pub duplicate: bool,
    #[serde(rename = "ts", default)]
    pub send_time_unix_ms: Option<i64>,
}

mod qos_serde {
    use super::{qos_from_u8, qos_to_u8};
    use posthorn_codec::QoS;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(qos: &QoS, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(qos_to_u8(*qos))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<QoS, D::Error> {
        Ok(qos_from_u8(u8::deserialize(d)?))
    }
}

impl QueuedMessage {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("QueuedMessage always serializes")
    }

    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid encoded [`QueuedMessage`].
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Per-topic authorization, stored inside a [`User`]'s ACL map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicAcl {
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub subscribe: bool,
    #[serde(default)]
    pub qos: u8,
}

/// A row of the `users` map: `{password, acl}` keyed by topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub password: String,
    #[serde(default)]
    pub acl: HashMap<String, TopicAcl>,
}

impl User {
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid encoded [`User`].
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
