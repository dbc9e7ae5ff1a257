use std::marker::PhantomData;

use auvgate_frame::{ControllerFlags, FlagGroup, PayloadFlags, TuningChannel};
use serde_json::{Map, Value};

use crate::config::{ControlConfig, RangePolicy};
use crate::error::{ControlError, Result};

const CONTROL: &str = "control";
const PID: &str = "pid";
const PAYLOAD: &str = "payload";
const TUNING: &str = "tuning";

/// Top-level keys accepted in a control message.
pub const CONTROL_KEYS: &[&str] = &[
    "thrust_x",
    "thrust_y",
    "thrust_w",
    "thrust_z",
    "depth",
    "altitude",
    "yaw",
    "velocity_x",
    "velocity_y",
    "navigation",
    PID,
    PAYLOAD,
    TUNING,
    "save_tuning",
];

/// Keys of one entry in the `tuning` list.
pub const TUNING_KEYS: &[&str] = &["type", "p", "i", "d"];

/// A validated partial update. `None` / empty means "leave as is".
///
/// Only [`from_slice`](Self::from_slice) and
/// [`from_value`](Self::from_value) build a non-empty update, so every
/// thrust value in one lies within the bound it was validated against.
///
/// ```compile_fail
/// let update = auvgate_control::ControlUpdate {
///     thrust_x: Some(127),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlUpdate {
    pub(crate) thrust_x: Option<i8>,
    pub(crate) thrust_y: Option<i8>,
    pub(crate) thrust_w: Option<i8>,
    pub(crate) thrust_z: Option<i8>,
    pub(crate) depth: Option<f32>,
    pub(crate) altitude: Option<f32>,
    pub(crate) yaw: Option<f32>,
    pub(crate) velocity_x: Option<f32>,
    pub(crate) velocity_y: Option<f32>,
    pub(crate) navigation: Option<bool>,
    pub(crate) controllers: Option<FlagsUpdate<ControllerFlags>>,
    pub(crate) payload: Option<FlagsUpdate<PayloadFlags>>,
    pub(crate) tuning: Vec<TuningUpdate>,
    pub(crate) save_tuning: Option<bool>,
}

/// New gains for one channel, as requested by an operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningUpdate {
    pub channel: TuningChannel,
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

/// Partial assignment to a flag group, as `(bit index, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagsUpdate<G> {
    changes: Vec<(usize, bool)>,
    _group: PhantomData<G>,
}

impl<G: FlagGroup> FlagsUpdate<G> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            _group: PhantomData,
        }
    }

    /// Add an assignment by flag name.
    pub fn with(mut self, name: &str, value: bool) -> Option<Self> {
        let index = G::index_of(name)?;
        self.changes.push((index, value));
        Some(self)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply_to(&self, group: &mut G) {
        for &(index, value) in &self.changes {
            group.set(index, value);
        }
    }

    fn from_value(record: &'static str, value: &Value) -> Result<Self> {
        let object = as_object(record, value)?;
        check_keys(record, object, G::NAMES)?;

        let mut update = Self::new();
        for (key, value) in object {
            // Keys were checked against G::NAMES above.
            if let Some(index) = G::index_of(key) {
                let field = format!("{record}.{key}");
                update.changes.push((index, boolean(&field, value)?));
            }
        }
        Ok(update)
    }
}

impl<G: FlagGroup> Default for FlagsUpdate<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlUpdate {
    /// Parse and validate a raw control message.
    pub fn from_slice(payload: &[u8], config: &ControlConfig) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_value(&value, config)
    }

    /// Validate an already-parsed control message.
    ///
    /// The key set is checked first, so an unknown key is reported even
    /// when another field also carries a bad value.
    pub fn from_value(value: &Value, config: &ControlConfig) -> Result<Self> {
        config.validate()?;
        let object = as_object(CONTROL, value)?;
        check_keys(CONTROL, object, CONTROL_KEYS)?;

        let mut update = ControlUpdate::default();
        for (key, value) in object {
            match key.as_str() {
                "thrust_x" => update.thrust_x = Some(thrust(key, value, config)?),
                "thrust_y" => update.thrust_y = Some(thrust(key, value, config)?),
                "thrust_w" => update.thrust_w = Some(thrust(key, value, config)?),
                "thrust_z" => update.thrust_z = Some(thrust(key, value, config)?),
                "depth" => update.depth = Some(float(key, value)?),
                "altitude" => update.altitude = Some(float(key, value)?),
                "yaw" => update.yaw = Some(float(key, value)?),
                "velocity_x" => update.velocity_x = Some(float(key, value)?),
                "velocity_y" => update.velocity_y = Some(float(key, value)?),
                "navigation" => update.navigation = Some(boolean(key, value)?),
                PID => update.controllers = Some(FlagsUpdate::from_value(PID, value)?),
                PAYLOAD => update.payload = Some(FlagsUpdate::from_value(PAYLOAD, value)?),
                TUNING => update.tuning = tuning_list(value)?,
                "save_tuning" => update.save_tuning = Some(boolean(key, value)?),
                _ => {
                    return Err(ControlError::UnknownField {
                        record: CONTROL,
                        key: key.clone(),
                    })
                }
            }
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        *self == ControlUpdate::default()
    }

    /// Requested thrust as `[x, y, w, z]`.
    pub fn thrust(&self) -> [Option<i8>; 4] {
        [self.thrust_x, self.thrust_y, self.thrust_w, self.thrust_z]
    }

    pub fn tuning(&self) -> &[TuningUpdate] {
        &self.tuning
    }
}

fn as_object<'a>(record: &'static str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or(ControlError::NotAnObject { record })
}

fn check_keys(record: &'static str, object: &Map<String, Value>, known: &[&str]) -> Result<()> {
    match object.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(ControlError::UnknownField {
            record,
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ControlError {
    ControlError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn float(field: &str, value: &Value) -> Result<f32> {
    let parsed = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| invalid(field, "number is not representable"))?,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(field, format!("{text:?} is not a number")))?,
        other => return Err(invalid(field, format!("expected a number, got {other}"))),
    };

    let narrowed = parsed as f32;
    if !narrowed.is_finite() {
        return Err(invalid(field, format!("{parsed} is not a finite f32")));
    }
    Ok(narrowed)
}

fn integer(field: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            match number.as_f64() {
                Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => Ok(float as i64),
                _ => Err(invalid(field, format!("{number} is not an integer"))),
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(field, format!("{text:?} is not an integer"))),
        other => Err(invalid(field, format!("expected an integer, got {other}"))),
    }
}

fn thrust(field: &str, value: &Value, config: &ControlConfig) -> Result<i8> {
    let raw = integer(field, value)?;
    let min = i64::from(config.thrust_min);
    let max = i64::from(config.thrust_max);
    if (min..=max).contains(&raw) {
        return Ok(raw as i8);
    }
    match config.range_policy {
        RangePolicy::Reject => Err(ControlError::OutOfRange {
            field: field.to_string(),
            value: raw,
            min,
            max,
        }),
        RangePolicy::Clamp => Ok(raw.clamp(min, max) as i8),
    }
}

fn boolean(field: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid(field, format!("{number} is not 0 or 1"))),
        },
        other => Err(invalid(field, format!("expected a boolean, got {other}"))),
    }
}

fn tuning_list(value: &Value) -> Result<Vec<TuningUpdate>> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(TUNING, "expected a list of tuning entries"))?;
    items.iter().map(tuning_entry).collect()
}

fn tuning_entry(value: &Value) -> Result<TuningUpdate> {
    let object = as_object(TUNING, value)?;
    check_keys(TUNING, object, TUNING_KEYS)?;

    let required = |key: &str| {
        object
            .get(key)
            .ok_or_else(|| invalid(&format!("{TUNING}.{key}"), "missing"))
    };

    Ok(TuningUpdate {
        channel: tuning_channel(required("type")?)?,
        p: float("tuning.p", required("p")?)?,
        i: float("tuning.i", required("i")?)?,
        d: float("tuning.d", required("d")?)?,
    })
}

fn tuning_channel(value: &Value) -> Result<TuningChannel> {
    let field = "tuning.type";
    let channel = match value {
        Value::String(text) => TuningChannel::from_name(text.trim()).or_else(|| {
            text.trim()
                .parse::<u8>()
                .ok()
                .and_then(TuningChannel::from_code)
        }),
        Value::Number(number) => number
            .as_u64()
            .and_then(|code| u8::try_from(code).ok())
            .and_then(TuningChannel::from_code),
        other => return Err(invalid(field, format!("expected a channel, got {other}"))),
    };
    channel.ok_or_else(|| invalid(field, format!("{value} is not a tuning channel")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> Result<ControlUpdate> {
        ControlUpdate::from_value(&value, &ControlConfig::default())
    }

    #[test]
    fn parses_scalars_and_flags() {
        let update = parse(json!({
            "thrust_x": 50,
            "depth": 2.5,
            "navigation": true,
            "pid": { "depth": true, "yaw": false },
            "payload": { "magnet_2": 1 }
        }))
        .unwrap();

        assert_eq!(update.thrust_x, Some(50));
        assert_eq!(update.thrust_y, None);
        assert_eq!(update.depth, Some(2.5));
        assert_eq!(update.navigation, Some(true));

        let mut controllers = ControllerFlags {
            yaw: true,
            ..ControllerFlags::default()
        };
        update.controllers.unwrap().apply_to(&mut controllers);
        assert!(controllers.depth);
        assert!(!controllers.yaw);

        let mut payload = PayloadFlags::default();
        update.payload.unwrap().apply_to(&mut payload);
        assert!(payload.magnet_2);
        assert!(!payload.magnet_1);
    }

    #[test]
    fn coerces_numeric_strings() {
        let update = parse(json!({ "yaw": " 90.5 ", "thrust_z": "-40" })).unwrap();
        assert_eq!(update.yaw, Some(90.5));
        assert_eq!(update.thrust_z, Some(-40));
    }

    #[test]
    fn integral_float_is_accepted_for_thrust() {
        let update = parse(json!({ "thrust_w": 30.0 })).unwrap();
        assert_eq!(update.thrust_w, Some(30));
    }

    #[test]
    fn rejects_uncoercible_values() {
        assert!(matches!(
            parse(json!({ "depth": "deep" })),
            Err(ControlError::InvalidValue { field, .. }) if field == "depth"
        ));
        assert!(matches!(
            parse(json!({ "thrust_x": 12.5 })),
            Err(ControlError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(json!({ "navigation": "yes" })),
            Err(ControlError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(json!({ "pid": { "roll": 2 } })),
            Err(ControlError::InvalidValue { field, .. }) if field == "pid.roll"
        ));
        assert!(matches!(
            parse(json!({ "depth": null })),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_narrowing() {
        assert!(matches!(
            parse(json!({ "altitude": 1e300 })),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_top_level_key_names_record() {
        let err = parse(json!({ "depth": 1.0, "warp": 9 })).unwrap_err();
        match err {
            ControlError::UnknownField { record, key } => {
                assert_eq!(record, "control");
                assert_eq!(key, "warp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_key_wins_over_bad_value() {
        let err = parse(json!({ "depth": "deep", "warp": 9 })).unwrap_err();
        assert!(matches!(err, ControlError::UnknownField { .. }));
    }

    #[test]
    fn unknown_nested_flag_names_record() {
        let err = parse(json!({ "pid": { "heave": true } })).unwrap_err();
        assert!(matches!(
            err,
            ControlError::UnknownField { record: "pid", ref key } if key == "heave"
        ));

        let err = parse(json!({ "payload": { "magnet_3": true } })).unwrap_err();
        assert!(matches!(err, ControlError::UnknownField { record: "payload", .. }));
    }

    #[test]
    fn nested_record_must_be_object() {
        assert!(matches!(
            parse(json!({ "pid": true })),
            Err(ControlError::NotAnObject { record: "pid" })
        ));
        assert!(matches!(
            parse(json!([1, 2])),
            Err(ControlError::NotAnObject { record: "control" })
        ));
    }

    #[test]
    fn thrust_out_of_range_is_rejected_by_default() {
        let err = parse(json!({ "thrust_x": 101 })).unwrap_err();
        assert!(matches!(
            err,
            ControlError::OutOfRange { value: 101, min: -100, max: 100, .. }
        ));
        assert!(parse(json!({ "thrust_y": -101 })).is_err());
        assert!(parse(json!({ "thrust_y": 1000 })).is_err());
    }

    #[test]
    fn thrust_is_clamped_when_configured() {
        let config = ControlConfig {
            range_policy: RangePolicy::Clamp,
            ..ControlConfig::default()
        };
        let update =
            ControlUpdate::from_value(&json!({ "thrust_x": 250, "thrust_y": -7000 }), &config)
                .unwrap();
        assert_eq!(update.thrust_x, Some(100));
        assert_eq!(update.thrust_y, Some(-100));
    }

    #[test]
    fn narrower_bound_is_honoured() {
        let config = ControlConfig {
            thrust_min: 0,
            thrust_max: 100,
            range_policy: RangePolicy::Reject,
        };
        assert!(ControlUpdate::from_value(&json!({ "thrust_x": -1 }), &config).is_err());
        assert!(ControlUpdate::from_value(&json!({ "thrust_x": 0 }), &config).is_ok());
    }

    #[test]
    fn inverted_bound_is_an_error_not_a_panic() {
        let config = ControlConfig {
            thrust_min: 50,
            thrust_max: -50,
            range_policy: RangePolicy::Clamp,
        };
        let err = ControlUpdate::from_slice(br#"{"thrust_x": 10}"#, &config).unwrap_err();
        assert!(matches!(err, ControlError::InvalidBound { min: 50, max: -50 }));
    }

    #[test]
    fn parses_tuning_by_name_and_code() {
        let update = parse(json!({
            "tuning": [
                { "type": "depth", "p": 1.0, "i": 0.5, "d": 0.1 },
                { "type": 114, "p": "2", "i": 0, "d": 0 },
                { "type": "117", "p": 3, "i": 0, "d": 0 }
            ]
        }))
        .unwrap();

        let channels: Vec<_> = update.tuning.iter().map(|t| t.channel).collect();
        assert_eq!(
            channels,
            vec![TuningChannel::Depth, TuningChannel::Yaw, TuningChannel::GyroP]
        );
        assert_eq!(update.tuning[1].p, 2.0);
    }

    #[test]
    fn rejects_bad_tuning_entries() {
        assert!(matches!(
            parse(json!({ "tuning": [{ "type": 42, "p": 1, "i": 0, "d": 0 }] })),
            Err(ControlError::InvalidValue { field, .. }) if field == "tuning.type"
        ));
        assert!(matches!(
            parse(json!({ "tuning": [{ "type": "yaw", "p": 1, "i": 0 }] })),
            Err(ControlError::InvalidValue { field, .. }) if field == "tuning.d"
        ));
        assert!(matches!(
            parse(json!({ "tuning": [{ "type": "yaw", "p": 1, "i": 0, "d": 0, "f": 1 }] })),
            Err(ControlError::UnknownField { record: "tuning", .. })
        ));
        assert!(matches!(
            parse(json!({ "tuning": { "type": "yaw" } })),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn empty_object_is_an_empty_update() {
        assert!(parse(json!({})).unwrap().is_empty());
        assert!(!parse(json!({ "save_tuning": false })).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_text_is_reported() {
        let err = ControlUpdate::from_slice(b"{not json", &ControlConfig::default()).unwrap_err();
        assert!(matches!(err, ControlError::InvalidJson(_)));
    }

    #[test]
    fn flags_update_builder() {
        let update = FlagsUpdate::<ControllerFlags>::new()
            .with("roll", true)
            .and_then(|u| u.with("speed_y", true))
            .unwrap();
        let mut flags = ControllerFlags::default();
        update.apply_to(&mut flags);
        assert_eq!(flags.to_byte(), 0b0100_0001);

        assert!(FlagsUpdate::<PayloadFlags>::new().with("roll", true).is_none());
    }
}
