use std::net::SocketAddr;

use auvgate_bridge::{Gateway, GatewayConfig};
use auvgate_control::{ControlConfig, RangePolicy};
use auvgate_transport::{MqttConfig, VehicleSocket};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::RunArgs;
use crate::exit::{bridge_error, io_error, transport_error, CliResult, SUCCESS};

pub fn run(args: RunArgs) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;
    runtime.block_on(serve(args))
}

async fn serve(args: RunArgs) -> CliResult<i32> {
    let config = gateway_config(&args);

    let mut mqtt = MqttConfig::from_url(&args.broker)
        .map_err(|err| transport_error("invalid broker", err))?;
    if let Some(client_id) = &args.client_id {
        mqtt = mqtt.with_client_id(client_id.as_str());
    }

    let socket = VehicleSocket::bind(config.listen)
        .await
        .map_err(|err| transport_error("bind failed", err))?;
    let (publisher, subscription) = mqtt
        .connect(&config.control_topic)
        .await
        .map_err(|err| transport_error("broker connect failed", err))?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested");
        signal_token.cancel();
    });

    Gateway::new(config, socket, publisher, subscription)
        .run(shutdown)
        .await
        .map_err(|err| bridge_error("gateway stopped", err))?;

    Ok(SUCCESS)
}

fn gateway_config(args: &RunArgs) -> GatewayConfig {
    GatewayConfig {
        listen: SocketAddr::new(args.host, args.port),
        reply_port: args.reply_port,
        telemetry_topic: args.telemetry_topic.clone(),
        control_topic: args.control_topic.clone(),
        control: ControlConfig {
            range_policy: if args.clamp_thrust {
                RangePolicy::Clamp
            } else {
                RangePolicy::Reject
            },
            ..ControlConfig::default()
        },
        ..GatewayConfig::default()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "SIGTERM handler unavailable, waiting for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            broker: "localhost".to_string(),
            host: "0.0.0.0".parse().unwrap(),
            port: 9100,
            reply_port: 2031,
            telemetry_topic: "t".to_string(),
            control_topic: "c".to_string(),
            client_id: None,
            clamp_thrust: false,
        }
    }

    #[test]
    fn builds_gateway_config_from_args() {
        let config = gateway_config(&args());
        assert_eq!(config.listen.to_string(), "0.0.0.0:9100");
        assert_eq!(config.reply_port, 2031);
        assert_eq!(config.telemetry_topic, "t");
        assert_eq!(config.control_topic, "c");
        assert_eq!(config.control.range_policy, RangePolicy::Reject);
    }

    #[test]
    fn clamp_flag_selects_clamp_policy() {
        let config = gateway_config(&RunArgs {
            clamp_thrust: true,
            ..args()
        });
        assert_eq!(config.control.range_policy, RangePolicy::Clamp);
    }
}
