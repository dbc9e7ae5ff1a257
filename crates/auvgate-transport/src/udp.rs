use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{info, trace};

use crate::error::{Result, TransportError};

/// UDP socket facing the vehicle.
///
/// The vehicle polls: it sends telemetry to the bound address and listens
/// for the reply on a fixed port of its own, so replies go to the sender's
/// IP but not necessarily to the sender's source port.
#[derive(Debug)]
pub struct VehicleSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl VehicleSocket {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(addr = %local_addr, "listening for vehicle datagrams");

        Ok(Self { socket, local_addr })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the next datagram.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let (len, peer) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(TransportError::Receive)?;
        trace!(%peer, len, "datagram received");
        Ok((len, peer))
    }

    /// Send one datagram.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize> {
        self.socket
            .send_to(data, addr)
            .await
            .map_err(|source| TransportError::Send { addr, source })
    }

    /// Where the reply to a datagram from `peer` must go.
    pub fn reply_addr(peer: SocketAddr, reply_port: u16) -> SocketAddr {
        SocketAddr::new(peer.ip(), reply_port)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp"
    }
}
