use std::net::{SocketAddr, UdpSocket};
use std::thread;

use auvgate_frame::{decode_command, encode_telemetry, Telemetry};
use bytes::BytesMut;

use crate::cmd::{parse_duration, SimulateArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_command, OutputFormat};

/// Large enough for any gateway reply.
const REPLY_BUF: usize = 256;

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let timeout = parse_duration(&args.timeout)?;
    let telemetry = resolve_telemetry(args.telemetry.as_deref())?;

    let mut frame = BytesMut::new();
    encode_telemetry(&telemetry, &mut frame);

    let bind = SocketAddr::new(args.bind, args.reply_port);
    let socket =
        UdpSocket::bind(bind).map_err(|err| io_error(&format!("bind {bind} failed"), err))?;
    socket
        .set_read_timeout(Some(timeout))
        .map_err(|err| io_error("failed to set reply timeout", err))?;

    let mut buf = [0u8; REPLY_BUF];
    for sent in 0..args.count {
        if sent > 0 {
            thread::sleep(interval);
        }

        socket
            .send_to(&frame, args.gateway)
            .map_err(|err| io_error(&format!("send to {} failed", args.gateway), err))?;

        let (len, _) = socket
            .recv_from(&mut buf)
            .map_err(|err| io_error("no reply from gateway", err))?;
        let reply = &buf[..len];
        let command = decode_command(reply).map_err(|err| frame_error("bad reply", err))?;
        print_command(&command, reply, format);
    }

    Ok(SUCCESS)
}

fn resolve_telemetry(json: Option<&str>) -> CliResult<Telemetry> {
    match json {
        Some(json) => serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--telemetry is not valid: {err}"))),
        None => Ok(Telemetry::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_defaults_to_zero() {
        assert_eq!(resolve_telemetry(None).unwrap(), Telemetry::default());
    }

    #[test]
    fn telemetry_from_partial_json() {
        let telemetry = resolve_telemetry(Some(r#"{"depth": 1.25, "leak": true}"#)).unwrap();
        assert_eq!(telemetry.depth, 1.25);
        assert!(telemetry.leak);
    }

    #[test]
    fn telemetry_rejects_unknown_types() {
        let err = resolve_telemetry(Some(r#"{"depth": "deep"}"#)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
