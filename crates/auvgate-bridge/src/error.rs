use auvgate_control::ControlError;
use auvgate_transport::TransportError;

/// Errors that end a gateway run.
///
/// Everything else (bad frames, rejected control messages, failed
/// publishes or replies) is logged and recovered in place.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The gateway was configured with unusable control settings.
    #[error("invalid control config: {0}")]
    Config(#[from] ControlError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
