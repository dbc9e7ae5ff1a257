//! Transports on both sides of the gateway.
//!
//! - [`VehicleSocket`]: the UDP link to the vehicle
//! - [`Publisher`] / [`ControlSource`]: the two halves of the message bus,
//!   implemented over MQTT ([`mqtt`]) and in-process channels ([`memory`])
//!
//! This is the lowest layer of auvgate. The bridge only sees these types.

pub mod error;
pub mod memory;
pub mod mqtt;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use memory::{MemoryPublisher, MemorySubscription};
pub use mqtt::{MqttConfig, MqttPublisher, MqttSubscription, DEFAULT_MQTT_PORT};
pub use traits::{ControlSource, Publisher};
pub use udp::VehicleSocket;
