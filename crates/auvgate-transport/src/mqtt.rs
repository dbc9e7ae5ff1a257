//! MQTT bus adapter over `rumqttc`.
//!
//! One connection serves both directions: the [`MqttSubscription`] owns
//! the event loop and must be polled for outgoing publishes to flush.

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{ControlSource, Publisher};

/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// How long [`MqttSubscription::close`] keeps flushing for the DISCONNECT.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    /// How long to wait for the broker's CONNACK at startup.
    pub connect_timeout: Duration,
    /// Request queue depth between the client handle and the event loop.
    pub channel_capacity: usize,
}

impl MqttConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: format!("auvgate-{}", std::process::id()),
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            channel_capacity: 64,
        }
    }

    /// Parse `host`, `host:port`, `mqtt://host[:port]` or `tcp://host[:port]`.
    /// IPv6 literals are written in brackets: `[::1]:1883`.
    pub fn from_url(url: &str) -> Result<Self> {
        let invalid = || TransportError::InvalidBroker(url.to_string());

        let trimmed = url.trim();
        let rest = match trimmed.split_once("://") {
            Some(("mqtt" | "tcp", rest)) => rest,
            Some(_) => return Err(invalid()),
            None => trimmed,
        };
        // Credentials and paths are not supported.
        if rest.contains('@') || rest.contains('/') {
            return Err(invalid());
        }

        let (host, port) = match rest.strip_prefix('[') {
            Some(bracketed) => {
                let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
                match after {
                    "" => (host, DEFAULT_MQTT_PORT),
                    _ => {
                        let port = after.strip_prefix(':').ok_or_else(invalid)?;
                        (host, port.parse::<u16>().map_err(|_| invalid())?)
                    }
                }
            }
            None => match rest.rsplit_once(':') {
                Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
                None => (rest, DEFAULT_MQTT_PORT),
            },
        };
        // An unbracketed IPv6 literal is ambiguous with `host:port`.
        let bracketed = rest.starts_with('[');
        if host.is_empty() || host.contains(['[', ']']) || (!bracketed && host.contains(':')) {
            return Err(invalid());
        }

        Ok(Self::new(host, port))
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// `host:port`, for logs and errors.
    pub fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect, subscribe to `control_topic`, and wait for the broker to
    /// accept the session.
    pub async fn connect(&self, control_topic: &str) -> Result<(MqttPublisher, MqttSubscription)> {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);

        let (client, mut eventloop) = AsyncClient::new(options, self.channel_capacity);

        client
            .subscribe(control_topic, QoS::AtLeastOnce)
            .await
            .map_err(|err| TransportError::Subscribe {
                topic: control_topic.to_string(),
                reason: err.to_string(),
            })?;

        let broker = self.broker();
        match tokio::time::timeout(self.connect_timeout, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(TransportError::BrokerConnect { broker, reason }),
            Err(_) => {
                return Err(TransportError::BrokerConnect {
                    broker,
                    reason: format!("no CONNACK within {:?}", self.connect_timeout),
                })
            }
        }

        info!(%broker, topic = control_topic, "connected to broker");

        Ok((
            MqttPublisher { client },
            MqttSubscription {
                eventloop,
                topic: control_topic.to_string(),
            },
        ))
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> std::result::Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(format!("connection refused: {:?}", ack.code))
                };
            }
            Ok(_) => continue,
            Err(err) => return Err(err.to_string()),
        }
    }
}

/// Publishing half of an MQTT connection.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl Publisher for MqttPublisher {
    /// Queue without waiting. The request queue only drains while the
    /// subscription is polled, so a full queue is reported instead of
    /// blocking the caller.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|err| TransportError::Publish {
                topic: topic.to_string(),
                reason: err.to_string(),
            })
    }

    /// Queue a DISCONNECT. It goes out when the subscription is
    /// [closed](MqttSubscription::close).
    async fn close(&self) {
        if let Err(err) = self.client.try_disconnect() {
            debug!(error = %err, "broker disconnect request failed");
        }
    }
}

/// Subscription half of an MQTT connection. Drives the event loop.
pub struct MqttSubscription {
    eventloop: EventLoop,
    topic: String,
}

impl MqttSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl ControlSource for MqttSubscription {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    trace!(topic = %publish.topic, len = publish.payload.len(), "control message");
                    return Some(Ok(publish.payload.to_vec()));
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    debug!("broker closed the session");
                    return None;
                }
                Ok(_) => {}
                Err(err) => return Some(Err(TransportError::Disconnected(err.to_string()))),
            }
        }
    }

    /// Flush queued requests until the DISCONNECT is written, the
    /// connection fails, or [`DISCONNECT_TIMEOUT`] passes.
    async fn close(&mut self) {
        let flush = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => return true,
                    Ok(_) => {}
                    Err(err) => {
                        debug!(error = %err, "connection ended before disconnect");
                        return false;
                    }
                }
            }
        };

        match tokio::time::timeout(DISCONNECT_TIMEOUT, flush).await {
            Ok(true) => debug!(topic = %self.topic, "disconnected from broker"),
            Ok(false) => {}
            Err(_) => debug!("broker disconnect timed out"),
        }
    }
}
