//! Transform trait definition
//!
//! Base trait for every DSP transform. A transform never mutates its input:
//! it reads one buffer and returns a new one.

use std::fmt;

use serde_json::Value;

use crate::engine::ChannelBuffer;
use crate::error::{PcmError, Result};

/// Base trait for all DSP transforms
pub trait Transform: Send + Sync + fmt::Debug {
    /// Produce a new buffer from `buffer`
    ///
    /// `sample_rate` converts durations to sample offsets; transforms that
    /// are not time-aware ignore it.
    fn apply(&self, buffer: &ChannelBuffer, sample_rate: u32) -> Result<ChannelBuffer>;

    /// Get the transform type identifier
    fn name(&self) -> &'static str;

    /// Get all parameters as JSON (for logging)
    fn params(&self) -> Value;

    /// Clone the transform into a boxed trait object
    fn box_clone(&self) -> Box<dyn Transform>;
}

impl Clone for Box<dyn Transform> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Convert a duration to a whole number of samples: `round(sample_rate * seconds)`
///
/// Rounds half to even. Callers validate `seconds` first.
#[inline]
pub fn seconds_to_samples(sample_rate: u32, seconds: f64) -> usize {
    (sample_rate as f64 * seconds).round_ties_even().max(0.0) as usize
}

// ============================================================================
// Parameter checks
// ============================================================================

pub(crate) fn ensure_finite(param: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PcmError::invalid_param(param, value, "must be finite"))
    }
}

pub(crate) fn ensure_duration(param: &str, seconds: f64) -> Result<()> {
    ensure_finite(param, seconds)?;
    if seconds < 0.0 {
        return Err(PcmError::invalid_param(param, seconds, "must not be negative"));
    }
    Ok(())
}

pub(crate) fn ensure_sample_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(PcmError::invalid_param(
            "sample_rate",
            0.0,
            "time-based transforms need a positive sample rate",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_samples_rounds() {
        assert_eq!(seconds_to_samples(44100, 0.5), 22050);
        assert_eq!(seconds_to_samples(1000, 0.0016), 2);
        assert_eq!(seconds_to_samples(1000, 0.0014), 1);
        // 2.5 rounds to the even neighbour
        assert_eq!(seconds_to_samples(10, 0.25), 2);
        assert_eq!(seconds_to_samples(48000, 0.0), 0);
    }

    #[test]
    fn test_ensure_duration() {
        assert!(ensure_duration("dt", 0.0).is_ok());
        assert!(ensure_duration("dt", -0.1).is_err());
        assert!(ensure_duration("dt", f64::NAN).is_err());
        assert!(ensure_duration("dt", f64::INFINITY).is_err());
    }

    #[test]
    fn test_ensure_sample_rate() {
        assert!(ensure_sample_rate(0).is_err());
        assert!(ensure_sample_rate(8000).is_ok());
    }
}
