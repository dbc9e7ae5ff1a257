use std::net::SocketAddr;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the vehicle socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to send a datagram.
    #[error("failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to receive a datagram.
    #[error("failed to receive datagram: {0}")]
    Receive(std::io::Error),

    /// The broker address could not be parsed.
    #[error("invalid broker address {0:?}")]
    InvalidBroker(String),

    /// The broker could not be reached or refused the connection.
    #[error("failed to connect to broker {broker}: {reason}")]
    BrokerConnect { broker: String, reason: String },

    /// The subscription request could not be queued.
    #[error("failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    /// A message could not be handed to the bus.
    #[error("failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },

    /// The bus connection was lost.
    #[error("bus disconnected: {0}")]
    Disconnected(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
