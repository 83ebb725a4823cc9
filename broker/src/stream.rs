// Grounded on the teacher crate's stream.rs: a single enum abstracting over the
// transports a listener can accept, each with the same `read_buf`/`write_all` shape.
// The WebSocket variant keeps the resumable partial-frame behavior of the original
// broker's websocket.go: only binary frames are accepted, and a frame's remaining
// bytes are not discarded between calls.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, ErrorKind};

pub enum Stream {
    Tcp(TcpStream),
    Ws(WebSocketStream<TcpStream>),
}

impl Stream {
    /// Read more bytes into `buf`, appending to whatever is already there. Returns
    /// `0` on a clean shutdown.
    pub async fn read_buf(&mut self, buf: &mut Vec<u8>) -> Result<usize, Error> {
        match self {
            Self::Tcp(tcp) => Ok(tcp.read_buf(buf).await?),
            Self::Ws(ws) => loop {
                match ws.next().await {
                    Some(Ok(Message::Binary(data))) => {
                        let n = data.len();
                        buf.extend_from_slice(&data);
                        return Ok(n);
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => return Ok(0),
                    Some(Ok(_)) => {
                        return Err(Error::new(
                            ErrorKind::ProtocolError,
                            "websocket frame was not binary",
                        ))
                    }
                    Some(Err(err)) => return Err(Error::new(ErrorKind::IoError, &err.to_string())),
                }
            },
        }
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        match self {
            Self::Tcp(tcp) => Ok(tcp.write_all(buf).await?),
            Self::Ws(ws) => ws
                .send(Message::Binary(buf.to_vec()))
                .await
                .map_err(|err| Error::new(ErrorKind::IoError, &err.to_string())),
        }
    }
}
