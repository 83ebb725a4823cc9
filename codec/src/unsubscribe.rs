// UNSUBSCRIBE / UNSUBACK. Symmetric with subscribe.rs but with no QoS byte, matching
// the original broker's UnsubscribeFixedHeader.

use crate::byte_array::ByteArray;
use crate::error::Error;
use crate::header::{write_fixed_header, PacketType};

#[derive(Debug, Clone)]
pub struct UnsubscribePacket {
    pub packet_id: u16,
    pub topic: String,
}

impl UnsubscribePacket {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteArray::new(body);
        let packet_id = reader.read_u16()?;
        let topic = reader.read_string()?;
        if topic.is_empty() {
            return Err(Error::EmptyField("topic"));
        }
        Ok(Self { packet_id, topic })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnsubAckPacket {
    pub packet_id: u16,
}

impl UnsubAckPacket {
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        write_fixed_header(out, PacketType::UnsubAck, 2)?;
        out.extend_from_slice(&self.packet_id.to_be_bytes());
        Ok(())
    }
}
