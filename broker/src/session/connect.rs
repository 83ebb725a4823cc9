// CONNECT handling: decode, authenticate, register, acknowledge. Only a bad protocol
// name closes the connection without a CONNACK, matching the original broker's
// readConnect returning before any handling could begin; a bad protocol version or
// missing mandatory connect flags still get a CONNACK (codes 1 and 5 respectively)
// before the connection is torn down. Once decoded, every rejection gets a CONNACK.

use posthorn_codec::{ConnAckPacket, ConnectPacket, ConnectReturnCode, Error as CodecError};

use crate::error::{Error, ErrorKind};
use crate::types::{User, CLIENTS_SET};

use super::{Session, Status};

struct ConnectOutcome {
    return_code: ConnectReturnCode,
    client_id: Option<String>,
    user: Option<User>,
}

impl Session {
    pub async fn handle_connect(&mut self, body: &[u8]) -> Result<(), Error> {
        if self.status != Status::Unregistered {
            // A second CONNECT on an already-registered connection is a protocol
            // violation; drop the connection without acknowledging it.
            return Err(Error::new(ErrorKind::ProtocolError, "CONNECT received twice"));
        }

        let packet = match ConnectPacket::decode(body) {
            Ok(packet) => packet,
            Err(CodecError::InvalidProtocolName) => {
                return Err(Error::new(ErrorKind::ProtocolError, "bad protocol name"));
            }
            Err(CodecError::InvalidProtocolLevel) => {
                self.send_connack(ConnectReturnCode::UnacceptableProtocolVersion)
                    .await?;
                return Err(Error::new(ErrorKind::ProtocolError, "bad protocol version"));
            }
            Err(CodecError::EmptyField("connect flags")) => {
                self.send_connack(ConnectReturnCode::NotAuthorized).await?;
                return Err(Error::new(
                    ErrorKind::NotAuthorized,
                    "missing required connect flags",
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = self.authenticate_and_register(&packet).await;
        self.send_connack(outcome.return_code).await?;

        if outcome.return_code != ConnectReturnCode::Accepted {
            return Err(Error::new(ErrorKind::NotAuthorized, "CONNECT rejected"));
        }

        self.client_id = outcome.client_id;
        self.user = outcome.user;
        self.status = Status::Registered;
        log::info!("client {:?} connected", self.client_id);
        Ok(())
    }

    async fn send_connack(&mut self, return_code: ConnectReturnCode) -> Result<(), Error> {
        let mut out = Vec::new();
        ConnAckPacket::new(return_code).encode(&mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn authenticate_and_register(&self, packet: &ConnectPacket) -> ConnectOutcome {
        let user = match self
            .authenticator
            .authenticate(&packet.username, &packet.password)
            .await
        {
            Ok(user) => user,
            Err(_) => {
                return ConnectOutcome {
                    return_code: ConnectReturnCode::IdentifierRejected,
                    client_id: None,
                    user: None,
                }
            }
        };

        match self.store.set().add(CLIENTS_SET, &packet.client_id).await {
            Ok(()) => ConnectOutcome {
                return_code: ConnectReturnCode::Accepted,
                client_id: Some(packet.client_id.clone()),
                user: Some(user),
            },
            Err(_) => ConnectOutcome {
                return_code: ConnectReturnCode::ServerUnavailable,
                client_id: None,
                user: None,
            },
        }
    }
}
