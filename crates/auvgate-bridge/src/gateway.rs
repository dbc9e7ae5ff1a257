use std::net::SocketAddr;

use auvgate_transport::{ControlSource, Publisher, VehicleSocket};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GatewayConfig;
use crate::control_loop::ControlLoop;
use crate::error::Result;
use crate::responder::Responder;
use crate::state::StateHandle;

/// A gateway assembled from its transports.
///
/// The socket and both bus halves are supplied by the caller, so the same
/// gateway runs over MQTT in production and over in-memory channels in
/// tests.
pub struct Gateway<P, S> {
    config: GatewayConfig,
    socket: VehicleSocket,
    publisher: P,
    source: S,
    state: StateHandle,
}

impl<P: Publisher, S: ControlSource> Gateway<P, S> {
    pub fn new(config: GatewayConfig, socket: VehicleSocket, publisher: P, source: S) -> Self {
        Self {
            config,
            socket,
            publisher,
            source,
            state: StateHandle::new(),
        }
    }

    /// Start from an existing state instead of a zeroed one.
    pub fn with_state(mut self, state: StateHandle) -> Self {
        self.state = state;
        self
    }

    /// Handle to the live state. Clones observe the running gateway.
    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run both loops until `shutdown` is cancelled or either loop ends.
    ///
    /// The control config is checked before anything starts. When one
    /// loop stops the other is cancelled and awaited. Both bus halves are
    /// closed before returning. The first loop error, if any, is returned.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        self.config.control.validate()?;

        let Gateway {
            config,
            socket,
            publisher,
            source,
            state,
        } = self;

        let token = shutdown.child_token();
        let responder = Responder::new(socket, publisher, state.clone(), &config);
        let mut control = ControlLoop::new(source, state, config.control);

        info!(
            listen = %responder.local_addr(),
            reply_port = config.reply_port,
            telemetry_topic = %config.telemetry_topic,
            control_topic = %config.control_topic,
            "gateway started"
        );

        let (responded, controlled) = tokio::join!(
            async {
                let result = responder.run(&token).await;
                token.cancel();
                result
            },
            async {
                let result = control.run(&token).await;
                token.cancel();
                result
            },
        );

        responder.publisher().close().await;
        control.into_source().close().await;
        info!("gateway stopped");

        responded?;
        controlled
    }
}
