use auvgate_frame::{decode_command, decode_telemetry};

use crate::cmd::{DecodeArgs, FrameKind};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_command, print_telemetry, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;

    match args.kind {
        FrameKind::Telemetry => {
            let telemetry =
                decode_telemetry(&frame).map_err(|err| frame_error("decode failed", err))?;
            print_telemetry(&telemetry, &frame, format);
        }
        FrameKind::Command => {
            let command = decode_command(&frame).map_err(|err| frame_error("decode failed", err))?;
            print_command(&command, &frame, format);
        }
    }

    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.is_empty() {
        return Err(CliError::new(USAGE, "frame must not be empty"));
    }
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex frame: {err}")))
}
