//! Opcode table.
//!
//! The second header byte of every frame selects its layout. Tuning
//! frames reuse the channel code as their opcode.

use serde::{Deserialize, Serialize};

/// Full vehicle state (gateway → vehicle).
pub const STATE: u8 = 230;

/// Persist the current controller tuning on the vehicle (gateway → vehicle).
pub const SAVE_TUNING: u8 = 133;

/// Telemetry (vehicle → gateway). The gateway ignores this byte on decode.
pub const TELEMETRY: u8 = 0;

/// Controller channel addressed by a tuning frame.
///
/// Codes are fixed by the vehicle firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TuningChannel {
    Depth = 110,
    Altitude = 111,
    Roll = 112,
    Pitch = 113,
    Yaw = 114,
    VelocityX = 115,
    VelocityY = 116,
    GyroP = 117,
}

impl TuningChannel {
    pub const ALL: [TuningChannel; 8] = [
        TuningChannel::Depth,
        TuningChannel::Altitude,
        TuningChannel::Roll,
        TuningChannel::Pitch,
        TuningChannel::Yaw,
        TuningChannel::VelocityX,
        TuningChannel::VelocityY,
        TuningChannel::GyroP,
    ];

    /// Wire code, also the opcode of this channel's tuning frame.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.code() == code)
    }

    /// Name used in control JSON.
    pub fn name(self) -> &'static str {
        match self {
            TuningChannel::Depth => "depth",
            TuningChannel::Altitude => "altitude",
            TuningChannel::Roll => "roll",
            TuningChannel::Pitch => "pitch",
            TuningChannel::Yaw => "yaw",
            TuningChannel::VelocityX => "velocity_x",
            TuningChannel::VelocityY => "velocity_y",
            TuningChannel::GyroP => "gyro_p",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.name() == name)
    }
}

impl std::fmt::Display for TuningChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns a human-readable name for a command opcode.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        STATE => "STATE",
        SAVE_TUNING => "SAVE_TUNING",
        110..=117 => "TUNING",
        _ => "UNKNOWN",
    }
}
