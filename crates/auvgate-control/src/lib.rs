//! Live control state of the vehicle and the rules for changing it.
//!
//! Operators send partial JSON updates. Each update is validated in full
//! against a fixed key table before anything is applied; any rejection
//! halts the vehicle (zero thrust, controllers off) instead of running
//! with a half-understood command.

pub mod config;
pub mod error;
pub mod state;
pub mod tuning;
pub mod update;

pub use config::{ControlConfig, RangePolicy};
pub use error::{ControlError, Result};
pub use state::{Parcel, VehicleState};
pub use tuning::{TuningEntry, TuningTable};
pub use update::{ControlUpdate, FlagsUpdate, TuningUpdate, CONTROL_KEYS, TUNING_KEYS};
