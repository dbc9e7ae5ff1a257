mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "auvgate", version, about = "MQTT to UDP gateway for underwater vehicles")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "auvgate",
            "run",
            "--broker",
            "mqtt://localhost:1883",
            "--port",
            "9001",
            "--clamp-thrust",
        ])
        .expect("run args should parse");

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.port, 9001);
        assert!(args.clamp_thrust);
        assert_eq!(args.reply_port, 2030);
    }

    #[test]
    fn decode_kind_is_validated() {
        let err = Cli::try_parse_from(["auvgate", "decode", "00e6", "--kind", "bogus"])
            .expect_err("unknown kind should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_simulate_defaults() {
        let cli = Cli::try_parse_from(["auvgate", "simulate", "--count", "3"])
            .expect("simulate args should parse");
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.count, 3);
        assert_eq!(args.gateway.to_string(), "127.0.0.1:9000");
        assert_eq!(args.interval, "1s");
    }
}
