use auvgate_control::ControlConfig;
use auvgate_transport::ControlSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::state::StateHandle;

/// Applies operator messages to the vehicle state in receipt order.
pub struct ControlLoop<S> {
    source: S,
    state: StateHandle,
    config: ControlConfig,
}

impl<S: ControlSource> ControlLoop<S> {
    pub fn new(source: S, state: StateHandle, config: ControlConfig) -> Self {
        Self {
            source,
            state,
            config,
        }
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Consume messages until the source closes, fails, or `shutdown` is
    /// cancelled. A closed source is a clean stop.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> Result<()> {
        loop {
            let message = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("control loop stopping");
                    return Ok(());
                }
                message = self.source.next_message() => message,
            };

            match message {
                Some(Ok(payload)) => {
                    self.handle_message(&payload).await;
                }
                Some(Err(err)) => return Err(err.into()),
                None => {
                    info!("control stream closed");
                    return Ok(());
                }
            }
        }
    }

    /// Merge one message. Returns whether it was accepted; a rejected
    /// message has already halted the vehicle.
    pub async fn handle_message(&self, payload: &[u8]) -> bool {
        match self.state.merge(payload, &self.config).await {
            Ok(()) => {
                debug!(len = payload.len(), "control update applied");
                true
            }
            Err(err) => {
                error!(error = %err, "control update rejected, vehicle halted");
                false
            }
        }
    }
}
