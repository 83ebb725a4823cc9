//! Wire codec for the broker's MQTT 3.1.1 subset: CONNECT/CONNACK, PUBLISH/PUBACK,
//! SUBSCRIBE/SUBACK, UNSUBSCRIBE/UNSUBACK, PINGREQ/PINGRESP and DISCONNECT. QoS 2 is
//! rejected at decode time and SUBSCRIBE/UNSUBSCRIBE carry a single topic rather than
//! a filter list.

mod byte_array;
mod connect;
mod disconnect;
mod error;
mod header;
mod ping;
mod publish;
mod subscribe;
mod unsubscribe;
mod var_int;

pub use byte_array::ByteArray;
pub use connect::{ConnAckPacket, ConnectPacket, ConnectReturnCode};
pub use disconnect::decode_disconnect;
pub use error::Error;
pub use header::{
    write_fixed_header, FixedHeader, PacketType, QoS, MAX_OUTBOUND_REMAINING_LENGTH,
};
pub use ping::{decode_ping_req, encode_ping_resp};
pub use publish::{PubAckPacket, PublishPacket, MAX_OUTBOUND_PUBLISH_REMAINING_LENGTH};
pub use subscribe::{SubAckPacket, SubscribeAckResult, SubscribePacket};
pub use unsubscribe::{UnsubAckPacket, UnsubscribePacket};
pub use var_int::{decode_remaining_length, encode_remaining_length, MAX_REMAINING_LENGTH};
