use auvgate_frame::{Command, ControllerFlags, PayloadFlags, StateFrame, TuningFrame};
use bytes::Bytes;
use tracing::debug;

use crate::config::ControlConfig;
use crate::error::Result;
use crate::tuning::TuningTable;
use crate::update::ControlUpdate;

/// The frame chosen to answer one datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parcel {
    State(StateFrame),
    Tuning { frame: TuningFrame, revision: u64 },
    SaveTuning,
}

impl Parcel {
    pub fn command(&self) -> Command {
        match self {
            Parcel::State(state) => Command::State(*state),
            Parcel::Tuning { frame, .. } => Command::Tuning(*frame),
            Parcel::SaveTuning => Command::SaveTuning,
        }
    }

    pub fn encode(&self) -> Bytes {
        self.command().to_bytes()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Parcel::State(_) => "state",
            Parcel::Tuning { .. } => "tuning",
            Parcel::SaveTuning => "save",
        }
    }
}

/// Control intent for the vehicle, as last requested by operators.
///
/// Created zeroed at startup and mutated in place by every accepted
/// update. Readers take a [`snapshot`](Self::snapshot) or a
/// [`Parcel`]; neither mutates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
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
    pub tuning: TuningTable,
    /// The vehicle should persist its tuning on the next free reply.
    pub save_pending: bool,
    dirty: bool,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, validate and apply a raw control message.
    ///
    /// Nothing is applied unless the whole message validates. On any
    /// error the vehicle is halted before the error is returned.
    pub fn merge(&mut self, payload: &[u8], config: &ControlConfig) -> Result<()> {
        match ControlUpdate::from_slice(payload, config) {
            Ok(update) => {
                self.apply(&update);
                Ok(())
            }
            Err(err) => {
                self.halt();
                Err(err)
            }
        }
    }

    /// Apply an already-validated update. Last write wins per field.
    ///
    /// Thrust in a [`ControlUpdate`] is always within the bound it was
    /// validated against.
    pub fn apply(&mut self, update: &ControlUpdate) {
        if update.is_empty() {
            return;
        }

        set(&mut self.thrust_x, update.thrust_x);
        set(&mut self.thrust_y, update.thrust_y);
        set(&mut self.thrust_w, update.thrust_w);
        set(&mut self.thrust_z, update.thrust_z);
        set(&mut self.depth, update.depth);
        set(&mut self.altitude, update.altitude);
        set(&mut self.yaw, update.yaw);
        set(&mut self.velocity_x, update.velocity_x);
        set(&mut self.velocity_y, update.velocity_y);
        set(&mut self.navigation, update.navigation);
        set(&mut self.save_pending, update.save_tuning);

        if let Some(controllers) = &update.controllers {
            controllers.apply_to(&mut self.controllers);
        }
        if let Some(payload) = &update.payload {
            payload.apply_to(&mut self.payload);
        }
        for tuning in &update.tuning {
            self.tuning
                .upsert(tuning.channel, tuning.p, tuning.i, tuning.d);
        }

        self.dirty = true;
    }

    /// Fail-safe stop: zero all thrust and disable every controller.
    ///
    /// Setpoints, payload, navigation and tuning are left as they are.
    pub fn halt(&mut self) {
        self.thrust_x = 0;
        self.thrust_y = 0;
        self.thrust_w = 0;
        self.thrust_z = 0;
        self.controllers = ControllerFlags::default();
        self.dirty = true;
    }

    pub fn is_halted(&self) -> bool {
        self.thrust_x == 0
            && self.thrust_y == 0
            && self.thrust_w == 0
            && self.thrust_z == 0
            && self.controllers == ControllerFlags::default()
    }

    /// Changed since the last acknowledged state frame. Diagnostic only;
    /// the state is sent regardless.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn snapshot(&self) -> StateFrame {
        StateFrame {
            thrust_x: self.thrust_x,
            thrust_y: self.thrust_y,
            thrust_w: self.thrust_w,
            thrust_z: self.thrust_z,
            depth: self.depth,
            altitude: self.altitude,
            yaw: self.yaw,
            velocity_x: self.velocity_x,
            velocity_y: self.velocity_y,
            controllers: self.controllers,
            payload: self.payload,
            navigation: self.navigation,
        }
    }

    /// Choose the single frame for the next reply.
    ///
    /// Pending tuning goes first, one channel per reply; a save request
    /// waits until every tuning entry went out; otherwise the full state.
    pub fn next_parcel(&self) -> Parcel {
        if let Some(entry) = self.tuning.first_dirty() {
            return Parcel::Tuning {
                frame: entry.frame(),
                revision: entry.revision(),
            };
        }
        if self.save_pending {
            return Parcel::SaveTuning;
        }
        Parcel::State(self.snapshot())
    }

    /// Record that `parcel` reached the socket.
    pub fn acknowledge(&mut self, parcel: &Parcel) {
        match parcel {
            Parcel::State(_) => self.dirty = false,
            Parcel::Tuning { frame, revision } => {
                if !self.tuning.mark_sent(frame.channel, *revision) {
                    debug!(channel = %frame.channel, "tuning changed since send; keeping it pending");
                }
            }
            Parcel::SaveTuning => self.save_pending = false,
        }
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use auvgate_frame::{decode_command, FlagGroup, TuningChannel};
    use serde_json::json;

    use super::*;
    use crate::config::RangePolicy;
    use crate::error::ControlError;

    fn merge(state: &mut VehicleState, value: serde_json::Value) -> Result<()> {
        let payload = serde_json::to_vec(&value).unwrap();
        state.merge(&payload, &ControlConfig::default())
    }

    fn running_state() -> VehicleState {
        let mut state = VehicleState::new();
        merge(
            &mut state,
            json!({
                "thrust_x": 40, "thrust_y": -30, "thrust_w": 20, "thrust_z": 10,
                "depth": 3.0, "yaw": 45.0, "navigation": true,
                "pid": { "roll": true, "pitch": true, "depth": true, "altitude": true,
                         "yaw": true, "speed_x": true, "speed_y": true },
                "payload": { "magnet_1": true }
            }),
        )
        .unwrap();
        state
    }

    #[test]
    fn starts_zeroed() {
        let state = VehicleState::new();
        assert!(state.is_halted());
        assert!(!state.is_dirty());
        assert!(state.tuning.is_empty());
        assert_eq!(state.snapshot(), StateFrame::default());
    }

    #[test]
    fn merge_sets_depth_and_flag_only() {
        let mut state = VehicleState::new();
        merge(&mut state, json!({ "depth": 2.5, "pid": { "depth": true } })).unwrap();

        let expected = VehicleState {
            depth: 2.5,
            controllers: ControllerFlags {
                depth: true,
                ..ControllerFlags::default()
            },
            ..VehicleState::new()
        };
        assert_eq!(state.snapshot(), expected.snapshot());
        assert!(state.is_dirty());
    }

    #[test]
    fn later_update_wins() {
        let mut state = VehicleState::new();
        merge(&mut state, json!({ "thrust_x": 10 })).unwrap();
        merge(&mut state, json!({ "thrust_x": 60, "yaw": 12.0 })).unwrap();
        assert_eq!(state.thrust_x, 60);
        assert_eq!(state.yaw, 12.0);
    }

    #[test]
    fn nested_merge_keeps_unmentioned_flags() {
        let mut state = running_state();
        merge(&mut state, json!({ "pid": { "yaw": false } })).unwrap();
        assert!(!state.controllers.yaw);
        assert!(state.controllers.roll);
        assert!(state.controllers.depth);
    }

    #[test]
    fn unparsable_json_halts() {
        let mut state = running_state();
        let err = state
            .merge(b"{\"thrust_x\": 5,,}", &ControlConfig::default())
            .unwrap_err();

        assert!(matches!(err, ControlError::InvalidJson(_)));
        assert!(state.is_halted());
        assert_eq!(state.controllers.to_byte(), 0);
    }

    #[test]
    fn unknown_key_halts_and_leaves_other_fields() {
        let mut state = running_state();
        let before = state.clone();

        let err = merge(&mut state, json!({ "depth": 9.0, "bogus": 1 })).unwrap_err();
        assert!(matches!(err, ControlError::UnknownField { .. }));

        assert!(state.is_halted());
        assert_eq!(state.depth, before.depth, "no partial apply");
        assert_eq!(state.yaw, before.yaw);
        assert_eq!(state.payload, before.payload);
        assert_eq!(state.navigation, before.navigation);
        assert_eq!(state.tuning, before.tuning);
    }

    #[test]
    fn coercion_failure_halts() {
        let mut state = running_state();
        assert!(merge(&mut state, json!({ "altitude": "high" })).is_err());
        assert!(state.is_halted());
        assert_eq!(state.altitude, 0.0);
    }

    #[test]
    fn out_of_range_thrust_halts() {
        let mut state = running_state();
        assert!(matches!(
            merge(&mut state, json!({ "thrust_x": 120 })),
            Err(ControlError::OutOfRange { .. })
        ));
        assert!(state.is_halted());
    }

    #[test]
    fn applied_thrust_stays_within_bound() {
        let config = ControlConfig {
            range_policy: RangePolicy::Clamp,
            ..ControlConfig::default()
        };
        let update = ControlUpdate::from_slice(
            br#"{"thrust_x": 127, "thrust_y": -128, "thrust_w": "1000", "thrust_z": 99}"#,
            &config,
        )
        .unwrap();

        let mut state = VehicleState::new();
        state.apply(&update);
        assert_eq!(state.thrust_x, 100);
        assert_eq!(state.thrust_y, -100);
        assert_eq!(state.thrust_w, 100);
        assert_eq!(state.thrust_z, 99);
    }

    #[test]
    fn inverted_bound_halts_instead_of_panicking() {
        let mut state = running_state();
        let config = ControlConfig {
            thrust_min: 50,
            thrust_max: -50,
            range_policy: RangePolicy::Clamp,
        };
        let err = state.merge(br#"{"thrust_x": 10}"#, &config).unwrap_err();
        assert!(matches!(err, ControlError::InvalidBound { .. }));
        assert!(state.is_halted());
    }

    #[test]
    fn halt_leaves_setpoints() {
        let mut state = running_state();
        state.halt();
        assert!(state.is_halted());
        assert_eq!(state.depth, 3.0);
        assert!(state.payload.magnet_1);
        assert!(state.navigation);
    }

    #[test]
    fn empty_update_does_not_mark_dirty() {
        let mut state = VehicleState::new();
        merge(&mut state, json!({})).unwrap();
        assert!(!state.is_dirty());
    }

    #[test]
    fn two_tuning_updates_leave_one_entry() {
        let mut state = VehicleState::new();
        merge(
            &mut state,
            json!({ "tuning": [{ "type": "depth", "p": 1.0, "i": 1.0, "d": 1.0 }] }),
        )
        .unwrap();
        merge(
            &mut state,
            json!({ "tuning": [{ "type": 110, "p": 2.0, "i": 3.0, "d": 4.0 }] }),
        )
        .unwrap();

        assert_eq!(state.tuning.len(), 1);
        let entry = state.tuning.get(TuningChannel::Depth).unwrap();
        assert_eq!((entry.p, entry.i, entry.d), (2.0, 3.0, 4.0));
    }

    #[test]
    fn parcel_defaults_to_state() {
        let state = running_state();
        let parcel = state.next_parcel();
        assert_eq!(parcel, Parcel::State(state.snapshot()));

        let frame = parcel.encode();
        assert_eq!(&frame[..2], &[0, 230]);
        assert_eq!(decode_command(&frame).unwrap(), parcel.command());
    }

    #[test]
    fn tuning_goes_out_before_state_then_clears_on_ack() {
        let mut state = running_state();
        merge(
            &mut state,
            json!({ "tuning": [
                { "type": "yaw", "p": 1.0, "i": 0.0, "d": 0.0 },
                { "type": "roll", "p": 2.0, "i": 0.0, "d": 0.0 }
            ] }),
        )
        .unwrap();

        let first = state.next_parcel();
        assert!(matches!(first, Parcel::Tuning { frame, .. } if frame.channel == TuningChannel::Yaw));
        assert_eq!(state.next_parcel(), first, "selection does not mutate");
        state.acknowledge(&first);

        let second = state.next_parcel();
        assert!(matches!(second, Parcel::Tuning { frame, .. } if frame.channel == TuningChannel::Roll));
        state.acknowledge(&second);

        assert!(matches!(state.next_parcel(), Parcel::State(_)));
    }

    #[test]
    fn unacknowledged_tuning_is_resent() {
        let mut state = VehicleState::new();
        merge(
            &mut state,
            json!({ "tuning": [{ "type": "pitch", "p": 1.0, "i": 0.0, "d": 0.0 }] }),
        )
        .unwrap();

        let first = state.next_parcel();
        let again = state.next_parcel();
        assert_eq!(first, again);
    }

    #[test]
    fn update_between_select_and_ack_is_not_lost() {
        let mut state = VehicleState::new();
        merge(
            &mut state,
            json!({ "tuning": [{ "type": "pitch", "p": 1.0, "i": 0.0, "d": 0.0 }] }),
        )
        .unwrap();
        let sent = state.next_parcel();

        merge(
            &mut state,
            json!({ "tuning": [{ "type": "pitch", "p": 5.0, "i": 0.0, "d": 0.0 }] }),
        )
        .unwrap();
        state.acknowledge(&sent);

        match state.next_parcel() {
            Parcel::Tuning { frame, .. } => assert_eq!(frame.p, 5.0),
            other => panic!("expected tuning parcel, got {other:?}"),
        }
    }

    #[test]
    fn save_waits_for_tuning_and_clears_on_ack() {
        let mut state = VehicleState::new();
        merge(
            &mut state,
            json!({
                "tuning": [{ "type": "depth", "p": 1.0, "i": 0.0, "d": 0.0 }],
                "save_tuning": true
            }),
        )
        .unwrap();

        let tuning = state.next_parcel();
        assert_eq!(tuning.kind(), "tuning");
        state.acknowledge(&tuning);

        let save = state.next_parcel();
        assert_eq!(save, Parcel::SaveTuning);
        assert_eq!(&save.encode()[..2], &[0, 133]);
        state.acknowledge(&save);

        assert!(!state.save_pending);
        assert_eq!(state.next_parcel().kind(), "state");
    }

    #[test]
    fn state_ack_clears_dirty() {
        let mut state = running_state();
        assert!(state.is_dirty());
        let parcel = state.next_parcel();
        state.acknowledge(&parcel);
        assert!(!state.is_dirty());
    }
}
