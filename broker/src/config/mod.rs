// Modeled on the teacher crate's `Config`: one struct per concern, each with
// `#[serde(default = ...)]` fields so a partial TOML file is always valid.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, ErrorKind};

mod listener;
mod log;
mod session;
mod storage;

pub use listener::{Listener, Protocol};
pub use log::{Log, LogLevel};
pub use session::Session;
pub use storage::{Storage, StorageBackend};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "Listener::default_listeners")]
    listeners: Vec<Listener>,

    #[serde(default = "Storage::default")]
    storage: Storage,

    #[serde(default = "Session::default")]
    session: Session,

    #[serde(default = "Log::default")]
    log: Log,
}

impl Config {
    #[must_use]
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn log(&self) -> &Log {
        &self.log
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or fails
    /// [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config.
    ///
    /// # Errors
    ///
    /// Returns an error if no listeners are configured, or a Redis storage backend
    /// is selected without a connection URL.
    pub fn validate(&self) -> Result<(), Error> {
        if self.listeners.is_empty() {
            return Err(Error::new(
                ErrorKind::ConfigError,
                "at least one listener must be configured",
            ));
        }
        if self.storage.backend() == StorageBackend::Redis && self.storage.redis_url().is_empty()
        {
            return Err(Error::new(
                ErrorKind::ConfigError,
                "storage.redis_url is required when storage.backend = \"redis\"",
            ));
        }
        Ok(())
    }
}
