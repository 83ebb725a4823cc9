// PINGREQ / PINGRESP. Both carry an empty body; the original broker's readPing
// rejects a non-zero remaining length rather than ignoring the extra bytes.

use crate::error::Error;
use crate::header::{write_fixed_header, PacketType};

pub fn decode_ping_req(remaining_length: u32) -> Result<(), Error> {
    if remaining_length != 0 {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

pub fn encode_ping_resp(out: &mut Vec<u8>) -> Result<(), Error> {
    write_fixed_header(out, PacketType::PingResp, 0)
}
