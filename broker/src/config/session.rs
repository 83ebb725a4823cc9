use serde::Deserialize;

/// Timing knobs for the per-connection state machine and its delivery loop.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Session {
    /// A connection with no traffic for this many seconds is dropped.
    ///
    /// Default is 3600 (one hour).
    #[serde(default = "Session::default_connection_deadline_secs")]
    connection_deadline_secs: u64,

    /// Minimum time between two PINGREQ packets before the extra one is rejected.
    ///
    /// Default is 20.
    #[serde(default = "Session::default_min_ping_interval_secs")]
    min_ping_interval_secs: u64,

    /// How long the feeder waits on an empty notify queue before scanning the
    /// unacked-message map for redelivery candidates.
    ///
    /// Default is 5.
    #[serde(default = "Session::default_redelivery_idle_secs")]
    redelivery_idle_secs: u64,
}

impl Session {
    fn default_connection_deadline_secs() -> u64 {
        3600
    }

    fn default_min_ping_interval_secs() -> u64 {
        20
    }

    fn default_redelivery_idle_secs() -> u64 {
        5
    }

    #[must_use]
    pub const fn connection_deadline_secs(&self) -> u64 {
        self.connection_deadline_secs
    }

    #[must_use]
    pub const fn min_ping_interval_secs(&self) -> u64 {
        self.min_ping_interval_secs
    }

    #[must_use]
    pub const fn redelivery_idle_secs(&self) -> u64 {
        self.redelivery_idle_secs
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            connection_deadline_secs: Self::default_connection_deadline_secs(),
            min_ping_interval_secs: Self::default_min_ping_interval_secs(),
            redelivery_idle_secs: Self::default_redelivery_idle_secs(),
        }
    }
}
