//! In-process bus, for embedding the gateway and for tests.

use tokio::sync::mpsc;

use crate::error::{Result, TransportError};
use crate::traits::{ControlSource, Publisher};

/// Publisher that forwards `(topic, payload)` pairs to a channel.
#[derive(Debug, Clone)]
pub struct MemoryPublisher {
    tx: mpsc::UnboundedSender<(String, Vec<u8>)>,
}

impl MemoryPublisher {
    /// Create a publisher and the receiver that observes what it publishes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Vec<u8>)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.tx
            .send((topic.to_string(), payload))
            .map_err(|_| TransportError::Publish {
                topic: topic.to_string(),
                reason: "receiver dropped".to_string(),
            })
    }
}

/// Control source fed from a channel. Ends when every sender is dropped.
#[derive(Debug)]
pub struct MemorySubscription {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl MemorySubscription {
    /// Create a subscription and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl ControlSource for MemorySubscription {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        self.rx.recv().await.map(Ok)
    }
}
