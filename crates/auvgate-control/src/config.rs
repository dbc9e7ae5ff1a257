use crate::error::{ControlError, Result};

/// What to do with a thrust value outside the configured bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Reject the whole update (and halt).
    #[default]
    Reject,
    /// Saturate to the nearest bound.
    Clamp,
}

/// Controls how control updates are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    /// Lowest accepted thrust value.
    pub thrust_min: i8,
    /// Highest accepted thrust value.
    pub thrust_max: i8,
    pub range_policy: RangePolicy,
}

impl ControlConfig {
    /// Build a config, refusing an inverted thrust bound.
    pub fn new(thrust_min: i8, thrust_max: i8, range_policy: RangePolicy) -> Result<Self> {
        let config = Self {
            thrust_min,
            thrust_max,
            range_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// The thrust bound must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.thrust_min > self.thrust_max {
            return Err(ControlError::InvalidBound {
                min: self.thrust_min,
                max: self.thrust_max,
            });
        }
        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            thrust_min: -100,
            thrust_max: 100,
            range_policy: RangePolicy::Reject,
        }
    }
}
