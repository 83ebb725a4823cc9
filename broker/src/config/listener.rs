use serde::Deserialize;

/// Binding protocol for a listener.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Raw MQTT over TCP.
    #[serde(alias = "mqtt")]
    Mqtt,

    /// MQTT framed inside binary WebSocket messages.
    #[serde(alias = "ws")]
    Ws,
}

/// One bound address and the protocol spoken on it.
#[derive(Debug, Deserialize, Clone)]
pub struct Listener {
    /// Default is [`Protocol::Mqtt`].
    #[serde(default = "Listener::default_protocol")]
    protocol: Protocol,

    /// Default is "0.0.0.0:2883".
    #[serde(default = "Listener::default_address")]
    address: String,
}

impl Listener {
    fn default_protocol() -> Protocol {
        Protocol::Mqtt
    }

    fn default_address() -> String {
        "0.0.0.0:2883".to_string()
    }

    #[must_use]
    pub fn default_listeners() -> Vec<Self> {
        vec![Self {
            protocol: Self::default_protocol(),
            address: Self::default_address(),
        }]
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}
