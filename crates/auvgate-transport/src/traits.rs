use std::future::Future;

use crate::error::Result;

/// Outbound half of the message bus.
pub trait Publisher: Send + Sync {
    /// Hand `payload` to the bus for `topic`. Fire and forget.
    fn publish(&self, topic: &str, payload: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Release the connection. Defaults to nothing.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Inbound control messages from one subscription.
pub trait ControlSource: Send {
    /// Wait for the next message payload.
    ///
    /// Returns `None` once the subscription has ended cleanly.
    fn next_message(&mut self) -> impl Future<Output = Option<Result<Vec<u8>>>> + Send;

    /// Finish the subscription after the publisher was closed. Defaults
    /// to nothing.
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
