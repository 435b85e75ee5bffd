// Range mapping from chaos-game coordinates to note parameters.
//
// `map_range` is an integer linear map with clamping. Division truncates
// towards zero, and that truncation is part of the sound: reproducing an
// existing composition depends on it, so do not switch to rounding.
//
// `pitch_from_x` and `duration_from_y` are the two fixed mappings the
// generator applies to each chaos-game point:
// - pitch: |x| * 100, rounded, clamped to 0..=100, mapped onto piano keys
//   25..=88 (extreme registers are left out).
// - duration: |y| truncated, clamped to 0..=10, mapped onto 100..=1375 ticks.

use crate::error::ConfigError;
use crate::note::{DURATION_MAX, DURATION_MIN, PITCH_MAX, PITCH_MIN};

/// Upper end of the pitch scale domain.
pub const PITCH_SCALE_MAX: i64 = 100;

/// Upper end of the duration domain.
pub const DURATION_SCALE_MAX: i64 = 10;

/// Pitch scale 0..=100 onto piano keys.
const PITCH_MAP: LinearMap = LinearMap {
    from_low: 0,
    from_high: PITCH_SCALE_MAX,
    to_low: PITCH_MIN as i64,
    to_high: PITCH_MAX as i64,
};

/// Whole |y| units 0..=10 onto ticks.
const DURATION_MAP: LinearMap = LinearMap {
    from_low: 0,
    from_high: DURATION_SCALE_MAX,
    to_low: DURATION_MIN as i64,
    to_high: DURATION_MAX as i64,
};

/// A validated integer linear map from `[from_low, from_high]` to
/// `[to_low, to_high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearMap {
    from_low: i64,
    from_high: i64,
    to_low: i64,
    to_high: i64,
}

impl LinearMap {
    /// Fails with `DegenerateDomain` when `from_low == from_high`.
    pub fn new(
        from_low: i64,
        from_high: i64,
        to_low: i64,
        to_high: i64,
    ) -> Result<Self, ConfigError> {
        if from_high == from_low {
            return Err(ConfigError::DegenerateDomain { bound: from_low });
        }
        Ok(LinearMap {
            from_low,
            from_high,
            to_low,
            to_high,
        })
    }

    /// Map `value`, clamping it into the source domain first.
    ///
    /// Clamping is `max` then `min`, so an inverted domain clamps to
    /// `from_high` instead of panicking.
    pub fn apply(&self, value: i64) -> i64 {
        let value = value.max(self.from_low).min(self.from_high);
        self.to_low
            + (value - self.from_low) * (self.to_high - self.to_low)
                / (self.from_high - self.from_low)
    }
}

/// One-shot form of `LinearMap::new(..)?.apply(value)`.
pub fn map_range(
    value: i64,
    from_low: i64,
    from_high: i64,
    to_low: i64,
    to_high: i64,
) -> Result<i64, ConfigError> {
    Ok(LinearMap::new(from_low, from_high, to_low, to_high)?.apply(value))
}

/// Piano key for chaos-game coordinate `x`.
pub fn pitch_from_x(x: f32) -> u8 {
    let scale = (x.abs() * 100.0).round().clamp(0.0, PITCH_SCALE_MAX as f32) as i64;
    PITCH_MAP.apply(scale) as u8
}

/// Duration in ticks for chaos-game coordinate `y`.
pub fn duration_from_y(y: f32) -> u32 {
    // `as` saturates, so infinities land on the domain edges.
    let whole = y.abs().trunc() as i64;
    DURATION_MAP.apply(whole) as u32
}
