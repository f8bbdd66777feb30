//! Clamped linear mapping from an input range onto an output range.

use crate::error::{Error, Result};

/// A validated `[low_in, high_in] -> [low_out, high_out]` map.
///
/// Either range may be inverted (`low > high`); the effect tables rely on
/// an inverted output range to fade intensities out as a face approaches.
/// Only a zero-width or non-finite input range is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    low_in: f64,
    high_in: f64,
    low_out: f64,
    high_out: f64,
}

impl LinearMap {
    pub fn new(low_in: f64, high_in: f64, low_out: f64, high_out: f64) -> Result<Self> {
        if !(low_in.is_finite() && high_in.is_finite()) || high_in == low_in {
            return Err(Error::DegenerateRange {
                low: low_in,
                high: high_in,
            });
        }
        Ok(Self {
            low_in,
            high_in,
            low_out,
            high_out,
        })
    }

    pub fn apply(&self, value: f64) -> f64 {
        // NaN compares false everywhere; pin it to the low end
        let v = if value.is_nan() {
            self.low_in
        } else {
            value.clamp(self.low_in.min(self.high_in), self.low_in.max(self.high_in))
        };
        let t = (v - self.low_in) / (self.high_in - self.low_in);
        self.low_out + (self.high_out - self.low_out) * t
    }
}

/// Clamp `value` into `[low_in, high_in]` and interpolate into
/// `[low_out, high_out]`.
pub fn map_range(value: f64, low_in: f64, high_in: f64, low_out: f64, high_out: f64) -> Result<f64> {
    Ok(LinearMap::new(low_in, high_in, low_out, high_out)?.apply(value))
}
