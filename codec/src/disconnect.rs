// DISCONNECT carries an empty body; the client never needs to send one back.

use crate::error::Error;

pub fn decode_disconnect(remaining_length: u32) -> Result<(), Error> {
    if remaining_length != 0 {
        return Err(Error::OutOfRange);
    }
    Ok(())
}
