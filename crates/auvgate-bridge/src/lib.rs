//! The gateway proper.
//!
//! Two loops share one [`StateHandle`]:
//!
//! - [`ControlLoop`] merges operator messages from the bus into the
//!   vehicle state
//! - [`Responder`] answers every vehicle datagram with exactly one frame
//!   and forwards decoded telemetry to the bus
//!
//! [`Gateway`] wires both to their transports and runs them until either
//! ends or the shutdown token is cancelled.

pub mod config;
pub mod control_loop;
pub mod error;
pub mod gateway;
pub mod responder;
pub mod state;

pub use config::{
    GatewayConfig, DEFAULT_CONTROL_TOPIC, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_DATAGRAM,
    DEFAULT_REPLY_PORT, DEFAULT_TELEMETRY_TOPIC,
};
pub use control_loop::ControlLoop;
pub use error::{BridgeError, Result};
pub use gateway::Gateway;
pub use responder::Responder;
pub use state::StateHandle;
