use std::net::{Ipv4Addr, SocketAddr};

use auvgate_control::ControlConfig;

/// Default address the vehicle sends datagrams to.
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 9000);

/// Default port the vehicle listens on for replies.
pub const DEFAULT_REPLY_PORT: u16 = 2030;

pub const DEFAULT_TELEMETRY_TOPIC: &str = "auv/telemetry";
pub const DEFAULT_CONTROL_TOPIC: &str = "auv/control";

/// Receive buffer size. Every frame on this link is well below it.
pub const DEFAULT_MAX_DATAGRAM: usize = 1024;

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Local UDP address for vehicle datagrams.
    pub listen: SocketAddr,
    /// Replies go to the sender's IP on this port.
    pub reply_port: u16,
    pub telemetry_topic: String,
    pub control_topic: String,
    pub max_datagram: usize,
    pub control: ControlConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR,
            reply_port: DEFAULT_REPLY_PORT,
            telemetry_topic: DEFAULT_TELEMETRY_TOPIC.to_string(),
            control_topic: DEFAULT_CONTROL_TOPIC.to_string(),
            max_datagram: DEFAULT_MAX_DATAGRAM,
            control: ControlConfig::default(),
        }
    }
}
