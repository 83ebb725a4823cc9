// Top-level wiring: build the store and authenticator from config, then run one
// accept loop per configured listener. Grounded on the teacher crate's
// listener/run.rs accept loop, collapsed to spawn a `Session` directly instead of
// routing through a separate dispatcher/auth actor.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use posthorn_store::memory::MemoryStore;
use posthorn_store::Store;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::auth::Authenticator;
use crate::config::{Config, Protocol};
use crate::error::Error;
use crate::session::Session;
use crate::stream::Stream;

#[cfg(feature = "redis_conn")]
use posthorn_store::redis_backend::RedisStore;

pub async fn build_store(config: &Config) -> Result<Arc<dyn Store>, Error> {
    match config.storage().backend() {
        crate::config::StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        crate::config::StorageBackend::Redis => {
            #[cfg(feature = "redis_conn")]
            {
                let store = RedisStore::connect(config.storage().redis_url()).await?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis_conn"))]
            {
                Err(Error::new(
                    crate::error::ErrorKind::ConfigError,
                    "storage.backend = \"redis\" requires the redis_conn feature",
                ))
            }
        }
    }
}

pub struct Broker {
    config: Config,
    store: Arc<dyn Store>,
    authenticator: Arc<Authenticator>,
    next_session_id: AtomicU64,
}

impl Broker {
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let authenticator = Arc::new(Authenticator::new(store.clone()));
        Self {
            config,
            store,
            authenticator,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Run every configured listener's accept loop until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if any listener fails to bind.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), Error> {
        tokio::pin!(shutdown);

        let mut accept_loops = Vec::new();
        for listener in self.config.listeners() {
            let tcp = TcpListener::bind(listener.address()).await?;
            log::info!("listening on {} ({:?})", listener.address(), listener.protocol());
            accept_loops.push(self.accept_loop(tcp, listener.protocol()));
        }

        let accept_loops = futures_util::future::join_all(accept_loops);
        tokio::pin!(accept_loops);
        tokio::select! {
            () = &mut shutdown => {
                log::info!("shutting down");
            }
            _ = &mut accept_loops => {}
        }
        Ok(())
    }

    async fn accept_loop(&self, tcp: TcpListener, protocol: Protocol) {
        loop {
            let (socket, peer_addr) = match tcp.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    log::warn!("accept failed: {err}");
                    continue;
                }
            };
            log::debug!("accepted connection from {peer_addr}");

            let stream = match protocol {
                Protocol::Mqtt => Stream::Tcp(socket),
                Protocol::Ws => match accept_async(socket).await {
                    Ok(ws) => Stream::Ws(ws),
                    Err(err) => {
                        log::warn!("websocket handshake with {peer_addr} failed: {err}");
                        continue;
                    }
                },
            };

            let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
            let session = Session::new(
                session_id,
                stream,
                self.store.clone(),
                self.authenticator.clone(),
                *self.config.session(),
            );
            tokio::spawn(session.run());
        }
    }
}
