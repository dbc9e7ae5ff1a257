/// Reasons a control update is refused.
///
/// Every variant leaves the vehicle halted when produced by
/// [`VehicleState::merge`](crate::VehicleState::merge).
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The payload is not valid JSON.
    #[error("control payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A record that must be a JSON object is something else.
    #[error("{record} must be a JSON object")]
    NotAnObject { record: &'static str },

    /// A key that the record does not declare.
    #[error("unknown field {record}.{key}")]
    UnknownField { record: &'static str, key: String },

    /// A value that cannot be coerced to the field's type.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A thrust value outside the configured bound.
    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The configured thrust bound is empty.
    #[error("thrust bound [{min}, {max}] is empty")]
    InvalidBound { min: i8, max: i8 },
}

pub type Result<T> = std::result::Result<T, ControlError>;
