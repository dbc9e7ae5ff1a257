//! Fixed-layout binary framing for the vehicle link.
//!
//! Every frame exchanged with the vehicle has the same envelope:
//! - A 2-byte header: a reserved zero byte followed by an opcode
//! - A fixed-width, big-endian payload selected by the opcode
//! - A 2-byte big-endian CRC-16 over every preceding byte
//!
//! Boolean groups travel as single bytes, one bit per flag, least
//! significant bit first. See [`flags`] for the order tables.

pub mod checksum;
pub mod codec;
pub mod command;
pub mod error;
pub mod flags;
pub mod opcode;
pub mod telemetry;

pub use checksum::{checksum, verify_checksum, CHECKSUM_LEN};
pub use codec::{
    decode, decode_command, decode_telemetry, encode_command, encode_telemetry, HEADER_LEN,
    SAVE_FRAME_LEN, STATE_FRAME_LEN, TELEMETRY_FRAME_LEN, TUNING_FRAME_LEN,
};
pub use command::{Command, StateFrame, TuningFrame};
pub use error::{FrameError, Result};
pub use flags::{ControllerFlags, FlagGroup, PayloadFlags, SensorErrors};
pub use opcode::{opcode_name, TuningChannel, SAVE_TUNING, STATE, TELEMETRY};
pub use telemetry::Telemetry;
