use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use auvgate_bridge::{
    DEFAULT_CONTROL_TOPIC, DEFAULT_LISTEN_ADDR, DEFAULT_REPLY_PORT, DEFAULT_TELEMETRY_TOPIC,
};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod run;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gateway between the MQTT broker and the vehicle.
    Run(RunArgs),
    /// Act as the vehicle: send telemetry to a gateway and print its replies.
    Simulate(SimulateArgs),
    /// Apply a control message to a fresh state and print the reply frame.
    Encode(EncodeArgs),
    /// Decode a hex frame.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// MQTT broker: host, host:port, mqtt://host[:port] or tcp://host[:port].
    #[arg(long, env = "MQTT_BROKER")]
    pub broker: String,
    /// Local IP to receive vehicle datagrams on.
    #[arg(long, env = "HOST_IP", default_value_t = DEFAULT_LISTEN_ADDR.ip())]
    pub host: IpAddr,
    /// Local UDP port to receive vehicle datagrams on.
    #[arg(long, env = "HOST_PORT", default_value_t = DEFAULT_LISTEN_ADDR.port())]
    pub port: u16,
    /// Vehicle port that replies are sent to.
    #[arg(long, env = "REPLY_PORT", default_value_t = DEFAULT_REPLY_PORT)]
    pub reply_port: u16,
    #[arg(long, env = "TELEMETRY_TOPIC", default_value = DEFAULT_TELEMETRY_TOPIC)]
    pub telemetry_topic: String,
    #[arg(long, env = "CONTROL_TOPIC", default_value = DEFAULT_CONTROL_TOPIC)]
    pub control_topic: String,
    /// MQTT client id. Default: auvgate-<pid>.
    #[arg(long, env = "MQTT_CLIENT_ID")]
    pub client_id: Option<String>,
    /// Saturate out-of-range thrust instead of rejecting the message.
    #[arg(long)]
    pub clamp_thrust: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Gateway address to send telemetry to.
    #[arg(long, default_value_t = DEFAULT_LISTEN_ADDR)]
    pub gateway: SocketAddr,
    /// Local IP to bind the reply port on.
    #[arg(long, default_value_t = DEFAULT_LISTEN_ADDR.ip())]
    pub bind: IpAddr,
    /// Port to send from and receive replies on.
    #[arg(long, default_value_t = DEFAULT_REPLY_PORT)]
    pub reply_port: u16,
    /// Telemetry as JSON; missing fields are zero.
    #[arg(long)]
    pub telemetry: Option<String>,
    /// Number of datagrams to send.
    #[arg(long, default_value = "1")]
    pub count: u32,
    /// Delay between datagrams (e.g. 1s, 200ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Maximum time to wait for each reply (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Control message JSON.
    #[arg(long)]
    pub json: String,
    /// Print every pending frame in reply order, not just the next one.
    #[arg(long)]
    pub all: bool,
    /// Saturate out-of-range thrust instead of rejecting the message.
    #[arg(long)]
    pub clamp_thrust: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FrameKind {
    /// Vehicle to gateway.
    #[default]
    Telemetry,
    /// Gateway to vehicle (state, tuning or save).
    Command,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex. Whitespace and a 0x prefix are ignored.
    pub hex: String,
    #[arg(long, value_enum, default_value_t = FrameKind::Telemetry)]
    pub kind: FrameKind,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
