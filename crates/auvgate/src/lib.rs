//! MQTT to UDP gateway for autonomous underwater vehicles.
//!
//! Operators publish JSON control messages on an MQTT topic; the vehicle
//! polls the gateway over UDP with telemetry frames and gets the current
//! control state back in each reply. Telemetry is republished as JSON.
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP vehicle socket and MQTT / in-memory bus adapters
//! - [`frame`]: binary frame codec, opcodes and flag groups
//! - [`control`]: vehicle state, control message validation and merge
//! - [`bridge`]: the gateway loops (behind `bridge` feature)

/// Re-export transport types.
pub mod transport {
    pub use auvgate_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use auvgate_frame::*;
}

/// Re-export control types.
pub mod control {
    pub use auvgate_control::*;
}

/// Re-export bridge types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod bridge {
    pub use auvgate_bridge::*;
}
