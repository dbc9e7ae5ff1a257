use serde::{Deserialize, Serialize};

use crate::flags::{ControllerFlags, PayloadFlags, SensorErrors};

/// One decoded telemetry frame.
///
/// Field names are the JSON names published on the telemetry topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Angular rate around the vertical axis.
    pub gyro_z: f32,
    pub depth: f32,
    pub altitude: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub pos_x: f32,
    pub pos_y: f32,
    /// Bus voltage.
    pub voltage: f32,
    /// Bus current.
    pub current: f32,
    /// Controllers actually running on the vehicle.
    pub pid: ControllerFlags,
    pub payload: PayloadFlags,
    pub leak: bool,
    pub errors: SensorErrors,
    pub temperature: f32,
}
