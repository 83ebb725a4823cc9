// PUBLISH / PUBACK. Grounded on the original broker's publish.go: the variable header
// is a length-prefixed topic followed (for QoS 1) by a packet id, then the remaining
// bytes are the raw payload. publish.go additionally enforces a 255-byte ceiling on
// the outbound frame specifically for PUBLISH, tighter than the generic fixed-header
// cap — that extra check lives here as `MAX_OUTBOUND_PUBLISH_REMAINING_LENGTH`.

use crate::byte_array::{write_string, ByteArray};
use crate::error::Error;
use crate::header::{write_fixed_header, PacketType, QoS};

pub const MAX_OUTBOUND_PUBLISH_REMAINING_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct PublishPacket {
    pub dup: bool,
    pub qos: QoS,
    pub packet_id: Option<u16>,
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PublishPacket {
    pub fn decode(dup: bool, qos: QoS, body: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteArray::new(body);
        let topic = reader.read_string()?;
        if topic.is_empty() {
            return Err(Error::EmptyField("topic"));
        }
        let packet_id = match qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce => Some(reader.read_u16()?),
        };
        let payload = reader.read_remaining().to_vec();
        Ok(Self {
            dup,
            qos,
            packet_id,
            topic,
            payload,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let mut body = Vec::new();
        write_string(&mut body, &self.topic)?;
        if let Some(packet_id) = self.packet_id {
            body.extend_from_slice(&packet_id.to_be_bytes());
        }
        body.extend_from_slice(&self.payload);

        if body.len() > MAX_OUTBOUND_PUBLISH_REMAINING_LENGTH {
            return Err(Error::TooLarge);
        }

        write_fixed_header(
            out,
            PacketType::Publish {
                dup: self.dup,
                qos: self.qos,
            },
            body.len() as u32,
        )?;
        out.extend_from_slice(&body);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PubAckPacket {
    pub packet_id: u16,
}

impl PubAckPacket {
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteArray::new(body);
        Ok(Self {
            packet_id: reader.read_u16()?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        write_fixed_header(out, PacketType::PubAck, 2)?;
        out.extend_from_slice(&self.packet_id.to_be_bytes());
        Ok(())
    }
}
