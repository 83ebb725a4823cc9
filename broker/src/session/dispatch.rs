// Per-packet-type dispatch for a registered connection. Grounded on the teacher
// crate's `handle_client_packet` match over `fixed_header.packet_type()`, and on the
// original broker's handlePublish/handleSubscribe/handleUnsubscribe/handlePing.

use std::time::{Duration, Instant};

use posthorn_codec::{
    decode_disconnect, decode_ping_req, encode_ping_resp, PacketType, PubAckPacket,
    PublishPacket, QoS, SubAckPacket, SubscribeAckResult, SubscribePacket, UnsubAckPacket,
    UnsubscribePacket,
};

use crate::auth::{authorize_publish, authorize_subscribe};
use crate::error::{Error, ErrorKind};
use crate::pipeline;
use crate::types::{client_subscriptions_set, client_unacked_map, topic_subscribers_set};

use super::{Session, Status};

impl Session {
    pub(super) async fn dispatch(
        &mut self,
        packet_type: PacketType,
        remaining_length: u32,
        body: &[u8],
    ) -> Result<(), Error> {
        if packet_type == PacketType::Connect {
            return self.handle_connect(body).await;
        }

        if self.status != Status::Registered {
            return Err(Error::new(
                ErrorKind::ProtocolError,
                "packet received before CONNECT completed",
            ));
        }

        match packet_type {
            PacketType::Publish { dup, qos } => self.handle_publish(dup, qos, body).await,
            PacketType::PubAck => self.handle_puback(body).await,
            PacketType::Subscribe => self.handle_subscribe(body).await,
            PacketType::Unsubscribe => self.handle_unsubscribe(body).await,
            PacketType::PingReq => self.handle_ping(remaining_length).await,
            PacketType::Disconnect => self.handle_disconnect(remaining_length),
            PacketType::Connect
            | PacketType::ConnAck
            | PacketType::SubAck
            | PacketType::UnsubAck
            | PacketType::PingResp => Err(Error::new(
                ErrorKind::ProtocolError,
                "client sent a server-to-client packet type",
            )),
        }
    }

    async fn handle_publish(&mut self, dup: bool, qos: QoS, body: &[u8]) -> Result<(), Error> {
        let packet = PublishPacket::decode(dup, qos, body)?;

        if let Some(user) = &self.user {
            authorize_publish(user, &packet.topic, qos)?;
        }

        let publisher_id = packet.packet_id.unwrap_or(0);
        pipeline::publish(
            &*self.store,
            &packet.topic,
            packet.payload,
            qos,
            publisher_id,
        )
        .await?;

        if let Some(packet_id) = packet.packet_id {
            let mut out = Vec::new();
            PubAckPacket { packet_id }.encode(&mut out)?;
            self.stream.write_all(&out).await?;
        }
        Ok(())
    }

    /// A PUBACK acknowledges one of our own QoS-1 deliveries: drop it from the
    /// client's unacked map.
    async fn handle_puback(&mut self, body: &[u8]) -> Result<(), Error> {
        let ack = posthorn_codec::PubAckPacket::decode(body)?;
        if let Some(client_id) = &self.client_id {
            let unacked_key = client_unacked_map(client_id);
            if let Err(err) = self
                .store
                .map()
                .remove(&unacked_key, &ack.packet_id.to_string())
                .await
            {
                log::debug!(
                    "session {}: PUBACK for unknown packet id {}: {err}",
                    self.id,
                    ack.packet_id
                );
            }
        }
        Ok(())
    }

    async fn handle_subscribe(&mut self, body: &[u8]) -> Result<(), Error> {
        let packet = SubscribePacket::decode(body)?;
        let client_id = self
            .client_id
            .clone()
            .expect("registered session always has a client id");

        let authorized = self
            .user
            .as_ref()
            .map_or(false, |user| authorize_subscribe(user, &packet.topic, packet.qos).is_ok());

        let result = if authorized {
            let subscribers_key = topic_subscribers_set(&packet.topic);
            let subscriptions_key = client_subscriptions_set(&client_id);
            match self.store.set().add(&subscriptions_key, &packet.topic).await {
                Ok(()) => match self.store.set().add(&subscribers_key, &client_id).await {
                    Ok(()) => SubscribeAckResult::Granted(packet.qos),
                    Err(_) => {
                        // Compensating removal: undo the reverse edge since the
                        // primary add failed partway through.
                        let _ = self
                            .store
                            .set()
                            .remove(&subscriptions_key, &packet.topic)
                            .await;
                        SubscribeAckResult::Failure
                    }
                },
                Err(_) => SubscribeAckResult::Failure, // already subscribed
            }
        } else {
            SubscribeAckResult::Failure
        };

        if matches!(result, SubscribeAckResult::Granted(_)) {
            self.ensure_delivery_started();
        }

        let mut out = Vec::new();
        SubAckPacket {
            packet_id: packet.packet_id,
            result,
        }
        .encode(&mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn handle_unsubscribe(&mut self, body: &[u8]) -> Result<(), Error> {
        let packet = UnsubscribePacket::decode(body)?;
        if let Some(client_id) = &self.client_id {
            let subscribers_key = topic_subscribers_set(&packet.topic);
            let subscriptions_key = client_subscriptions_set(client_id);
            let _ = self.store.set().remove(&subscribers_key, client_id).await;
            let _ = self.store.set().remove(&subscriptions_key, &packet.topic).await;
        }

        let mut out = Vec::new();
        UnsubAckPacket {
            packet_id: packet.packet_id,
        }
        .encode(&mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn handle_ping(&mut self, remaining_length: u32) -> Result<(), Error> {
        decode_ping_req(remaining_length)?;

        let min_interval = Duration::from_secs(self.session_config.min_ping_interval_secs());
        let now = Instant::now();
        if let Some(last) = self.last_ping {
            if now.duration_since(last) < min_interval {
                return Err(Error::new(ErrorKind::ProtocolError, "ping received too soon"));
            }
        }
        self.last_ping = Some(now);

        let mut out = Vec::new();
        encode_ping_resp(&mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    fn handle_disconnect(&mut self, remaining_length: u32) -> Result<(), Error> {
        decode_disconnect(remaining_length)?;
        self.status = Status::Closed;
        Ok(())
    }
}
