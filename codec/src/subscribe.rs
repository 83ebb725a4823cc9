// SUBSCRIBE / SUBACK. The broker's SUBSCRIBE carries exactly one topic filter rather
// than the list MQTT otherwise allows, matching the original broker's
// SubscribeFixedHeader + single StringReader + single QoS byte.

use crate::byte_array::ByteArray;
use crate::error::Error;
use crate::header::{write_fixed_header, PacketType, QoS};

#[derive(Debug, Clone)]
pub struct SubscribePacket {
    pub packet_id: u16,
    pub topic: String,
    pub qos: QoS,
}

impl SubscribePacket {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteArray::new(body);
        let packet_id = reader.read_u16()?;
        let topic = reader.read_string()?;
        if topic.is_empty() {
            return Err(Error::EmptyField("topic"));
        }
        let qos = QoS::from_bits(reader.read_u8()?)?;
        Ok(Self {
            packet_id,
            topic,
            qos,
        })
    }
}

/// Granted QoS, or a refusal (`0x80`) when authorization failed.
#[derive(Debug, Clone, Copy)]
pub enum SubscribeAckResult {
    Granted(QoS),
    Failure,
}

#[derive(Debug, Clone, Copy)]
pub struct SubAckPacket {
    pub packet_id: u16,
    pub result: SubscribeAckResult,
}

impl SubAckPacket {
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        write_fixed_header(out, PacketType::SubAck, 3)?;
        out.extend_from_slice(&self.packet_id.to_be_bytes());
        let code = match self.result {
            SubscribeAckResult::Granted(qos) => qos.bits(),
            SubscribeAckResult::Failure => 0x80,
        };
        out.push(code);
        Ok(())
    }
}
