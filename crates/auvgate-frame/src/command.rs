use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::flags::{ControllerFlags, PayloadFlags};
use crate::opcode::{TuningChannel, SAVE_TUNING, STATE};

/// Snapshot of the control intent as it travels in a state frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFrame {
    pub thrust_x: i8,
    pub thrust_y: i8,
    pub thrust_w: i8,
    pub thrust_z: i8,
    pub depth: f32,
    pub altitude: f32,
    pub yaw: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub controllers: ControllerFlags,
    pub payload: PayloadFlags,
    pub navigation: bool,
}

/// New gains for one controller channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningFrame {
    pub channel: TuningChannel,
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

/// A frame sent from the gateway to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    State(StateFrame),
    Tuning(TuningFrame),
    SaveTuning,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Command::State(_) => STATE,
            Command::Tuning(tuning) => tuning.channel.code(),
            Command::SaveTuning => SAVE_TUNING,
        }
    }

    /// Encode into a standalone buffer, checksum included.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        crate::codec::encode_command(self, &mut buf);
        buf.freeze()
    }
}
