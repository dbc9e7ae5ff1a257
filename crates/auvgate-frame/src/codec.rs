use bytes::{Buf, BufMut, BytesMut};
use tracing::debug;

use crate::checksum::{checksum, verify_checksum, CHECKSUM_LEN};
use crate::command::{Command, StateFrame, TuningFrame};
use crate::error::{FrameError, Result};
use crate::flags::{ControllerFlags, FlagGroup, PayloadFlags, SensorErrors};
use crate::opcode::{TuningChannel, SAVE_TUNING, STATE, TELEMETRY};
use crate::telemetry::Telemetry;

/// Frame header: reserved (1) + opcode (1) = 2 bytes.
pub const HEADER_LEN: usize = 2;

/// Header + 4 × i8 + 5 × f32 + 3 × u8 + reserved (2 × f32 + u8) + checksum.
pub const STATE_FRAME_LEN: usize = 40;

/// Header + 3 × f32 + checksum.
pub const TUNING_FRAME_LEN: usize = 16;

/// Fixed 8-byte body + checksum.
pub const SAVE_FRAME_LEN: usize = 10;

/// Header + 12 × f32 + 4 × u8 + f32 + checksum.
pub const TELEMETRY_FRAME_LEN: usize = 60;

const RESERVED: u8 = 0;

/// Body of the save command. Byte 5 is the firmware's "save" switch.
const SAVE_BODY: [u8; 8] = [RESERVED, SAVE_TUNING, 0, 0, 0, 1, 0, 0];

/// Encode a command frame into the wire format.
///
/// State frame layout:
/// ```text
/// ┌────────┬────────┬──────────────┬──────────────────────┬─────┬─────┬─────┬──────────┬─────────┐
/// │ 0x00   │ 230    │ thrust x/y/  │ depth, altitude, yaw,│ pid │ pay │ nav │ reserved │ CRC-16  │
/// │        │        │ w/z (4 × i8) │ vel x, vel y (5×f32) │ u8  │ u8  │ u8  │ 9 bytes  │ (2B BE) │
/// └────────┴────────┴──────────────┴──────────────────────┴─────┴─────┴─────┴──────────┴─────────┘
/// ```
///
/// Appends to `dst`; the checksum covers only the bytes of this frame.
pub fn encode_command(command: &Command, dst: &mut BytesMut) {
    let start = dst.len();
    match command {
        Command::State(state) => {
            dst.reserve(STATE_FRAME_LEN);
            dst.put_u8(RESERVED);
            dst.put_u8(STATE);
            dst.put_i8(state.thrust_x);
            dst.put_i8(state.thrust_y);
            dst.put_i8(state.thrust_w);
            dst.put_i8(state.thrust_z);
            dst.put_f32(state.depth);
            dst.put_f32(state.altitude);
            dst.put_f32(state.yaw);
            dst.put_f32(state.velocity_x);
            dst.put_f32(state.velocity_y);
            dst.put_u8(state.controllers.to_byte());
            dst.put_u8(state.payload.to_byte());
            dst.put_u8(u8::from(state.navigation));
            dst.put_f32(0.0);
            dst.put_f32(0.0);
            dst.put_u8(RESERVED);
        }
        Command::Tuning(tuning) => {
            dst.reserve(TUNING_FRAME_LEN);
            dst.put_u8(RESERVED);
            dst.put_u8(tuning.channel.code());
            dst.put_f32(tuning.p);
            dst.put_f32(tuning.i);
            dst.put_f32(tuning.d);
        }
        Command::SaveTuning => {
            dst.reserve(SAVE_FRAME_LEN);
            dst.put_slice(&SAVE_BODY);
        }
    }
    let crc = checksum(&dst[start..]);
    dst.put_u16(crc);
}

/// Decode a command frame (gateway → vehicle direction).
///
/// The gateway never receives these; the simulator and diagnostics do.
pub fn decode_command(frame: &[u8]) -> Result<Command> {
    let body = verify_checksum(frame)?;
    if body.len() < HEADER_LEN {
        return Err(FrameError::LengthMismatch {
            kind: "command",
            expected: HEADER_LEN + CHECKSUM_LEN,
            actual: frame.len(),
        });
    }

    match body[1] {
        STATE => {
            expect_len(frame, "state", STATE_FRAME_LEN)?;
            let mut buf = &body[HEADER_LEN..];
            let state = StateFrame {
                thrust_x: buf.get_i8(),
                thrust_y: buf.get_i8(),
                thrust_w: buf.get_i8(),
                thrust_z: buf.get_i8(),
                depth: buf.get_f32(),
                altitude: buf.get_f32(),
                yaw: buf.get_f32(),
                velocity_x: buf.get_f32(),
                velocity_y: buf.get_f32(),
                controllers: ControllerFlags::from_byte(buf.get_u8()),
                payload: PayloadFlags::from_byte(buf.get_u8()),
                navigation: buf.get_u8() != 0,
            };
            Ok(Command::State(state))
        }
        SAVE_TUNING => {
            expect_len(frame, "save", SAVE_FRAME_LEN)?;
            Ok(Command::SaveTuning)
        }
        opcode => {
            let channel = TuningChannel::from_code(opcode).ok_or(FrameError::UnknownOpcode(opcode))?;
            expect_len(frame, "tuning", TUNING_FRAME_LEN)?;
            let mut buf = &body[HEADER_LEN..];
            Ok(Command::Tuning(TuningFrame {
                channel,
                p: buf.get_f32(),
                i: buf.get_f32(),
                d: buf.get_f32(),
            }))
        }
    }
}

/// Encode a telemetry frame (vehicle → gateway direction).
pub fn encode_telemetry(telemetry: &Telemetry, dst: &mut BytesMut) {
    let start = dst.len();
    dst.reserve(TELEMETRY_FRAME_LEN);
    dst.put_u8(RESERVED);
    dst.put_u8(TELEMETRY);
    for value in [
        telemetry.roll,
        telemetry.pitch,
        telemetry.yaw,
        telemetry.gyro_z,
        telemetry.depth,
        telemetry.altitude,
        telemetry.velocity_x,
        telemetry.velocity_y,
        telemetry.pos_x,
        telemetry.pos_y,
        telemetry.voltage,
        telemetry.current,
    ] {
        dst.put_f32(value);
    }
    dst.put_u8(telemetry.pid.to_byte());
    dst.put_u8(telemetry.payload.to_byte());
    dst.put_u8(u8::from(telemetry.leak));
    dst.put_u8(telemetry.errors.to_byte());
    dst.put_f32(telemetry.temperature);
    let crc = checksum(&dst[start..]);
    dst.put_u16(crc);
}

/// Decode a telemetry frame. The header bytes are not interpreted.
pub fn decode_telemetry(frame: &[u8]) -> Result<Telemetry> {
    let body = verify_checksum(frame)?;
    expect_len(frame, "telemetry", TELEMETRY_FRAME_LEN)?;

    let mut buf = &body[HEADER_LEN..];
    Ok(Telemetry {
        roll: buf.get_f32(),
        pitch: buf.get_f32(),
        yaw: buf.get_f32(),
        gyro_z: buf.get_f32(),
        depth: buf.get_f32(),
        altitude: buf.get_f32(),
        velocity_x: buf.get_f32(),
        velocity_y: buf.get_f32(),
        pos_x: buf.get_f32(),
        pos_y: buf.get_f32(),
        voltage: buf.get_f32(),
        current: buf.get_f32(),
        pid: ControllerFlags::from_byte(buf.get_u8()),
        payload: PayloadFlags::from_byte(buf.get_u8()),
        leak: buf.get_u8() != 0,
        errors: SensorErrors::from_byte(buf.get_u8()),
        temperature: buf.get_f32(),
    })
}

/// Decode telemetry, dropping bad frames.
///
/// Short, corrupted and mis-sized frames produce `None` and a debug log line.
pub fn decode(frame: &[u8]) -> Option<Telemetry> {
    match decode_telemetry(frame) {
        Ok(telemetry) => Some(telemetry),
        Err(err) => {
            debug!(error = %err, len = frame.len(), "dropping telemetry frame");
            None
        }
    }
}

fn expect_len(frame: &[u8], kind: &'static str, expected: usize) -> Result<()> {
    if frame.len() != expected {
        return Err(FrameError::LengthMismatch {
            kind,
            expected,
            actual: frame.len(),
        });
    }
    Ok(())
}
