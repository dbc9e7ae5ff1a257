use std::net::SocketAddr;

use auvgate_control::Parcel;
use auvgate_frame::{decode, Telemetry};
use auvgate_transport::{Publisher, VehicleSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::state::StateHandle;

/// Answers vehicle datagrams.
///
/// Each datagram gets exactly one reply, whether or not it decoded. The
/// vehicle drives the exchange; nothing is sent unsolicited.
pub struct Responder<P> {
    socket: VehicleSocket,
    publisher: P,
    state: StateHandle,
    telemetry_topic: String,
    reply_port: u16,
    max_datagram: usize,
}

impl<P: Publisher> Responder<P> {
    pub fn new(
        socket: VehicleSocket,
        publisher: P,
        state: StateHandle,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            socket,
            publisher,
            state,
            telemetry_topic: config.telemetry_topic.clone(),
            reply_port: config.reply_port,
            max_datagram: config.max_datagram,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Serve datagrams until `shutdown` is cancelled or the socket fails.
    pub async fn run(&self, shutdown: &CancellationToken) -> Result<()> {
        let mut buf = vec![0u8; self.max_datagram];
        debug!(addr = %self.socket.local_addr(), reply_port = self.reply_port, "responder listening");

        loop {
            let (len, peer) = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("responder stopping");
                    return Ok(());
                }
                received = self.socket.recv_from(&mut buf) => received?,
            };
            self.handle_datagram(&buf[..len], peer).await;
        }
    }

    /// Process one datagram from `peer`.
    ///
    /// Returns the parcel that was sent, or `None` if the reply could not
    /// be sent (it stays pending for the next datagram).
    pub async fn handle_datagram(&self, data: &[u8], peer: SocketAddr) -> Option<Parcel> {
        if let Some(telemetry) = decode(data) {
            self.forward_telemetry(&telemetry).await;
        }

        let (parcel, frame) = self.state.next_reply().await;
        let target = VehicleSocket::reply_addr(peer, self.reply_port);

        match self.socket.send_to(&frame, target).await {
            Ok(_) => {
                self.state.acknowledge(&parcel).await;
                trace!(peer = %target, kind = parcel.kind(), len = frame.len(), "reply sent");
                Some(parcel)
            }
            Err(err) => {
                warn!(peer = %target, kind = parcel.kind(), error = %err, "reply send failed");
                None
            }
        }
    }

    async fn forward_telemetry(&self, telemetry: &Telemetry) {
        let payload = match serde_json::to_vec(telemetry) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "telemetry serialization failed");
                return;
            }
        };

        if let Err(err) = self.publisher.publish(&self.telemetry_topic, payload).await {
            warn!(topic = %self.telemetry_topic, error = %err, "telemetry publish failed");
        }
    }
}
