//! Time-stretch by resampling
//!
//! Naive nearest-earlier-sample resampling (no interpolation, no
//! band-limiting) and a fixed 2:1 averaging decimator.

use serde_json::{json, Value};

use crate::dsp::transform::{ensure_finite, Transform};
use crate::engine::ChannelBuffer;
use crate::error::{PcmError, Result};

/// Upper bound on samples per channel a speed change may produce
const MAX_OUTPUT_SAMPLES: f64 = u32::MAX as f64;

/// Resample by `factor`: `factor > 1` shortens (speeds up), `factor < 1` lengthens
///
/// Output length is `floor(len / factor)`; output sample `i` is
/// `input[floor(i * factor)]`.
pub fn speed_change(buffer: &ChannelBuffer, factor: f64) -> Result<ChannelBuffer> {
    ensure_finite("factor", factor)?;
    if factor <= 0.0 {
        return Err(PcmError::invalid_param("factor", factor, "must be > 0"));
    }

    let longest = buffer.channels().iter().map(Vec::len).max().unwrap_or(0);
    if longest as f64 / factor > MAX_OUTPUT_SAMPLES {
        return Err(PcmError::invalid_param(
            "factor",
            factor,
            "output would exceed 2^32 samples per channel",
        ));
    }

    Ok(buffer.map_channels(|input| {
        let out_len = (input.len() as f64 / factor).floor() as usize;
        (0..out_len)
            .map(|i| {
                let src = ((i as f64 * factor).floor() as usize).min(input.len() - 1);
                input[src]
            })
            .collect()
    }))
}

/// Halve the length by averaging adjacent pairs
///
/// Output length is `len / 2`; a trailing odd sample is dropped.
pub fn half_speed_average(buffer: &ChannelBuffer) -> ChannelBuffer {
    buffer.map_channels(|input| {
        input
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect()
    })
}

/// Speed change transform
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedChange {
    factor: f64,
}

impl SpeedChange {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Transform for SpeedChange {
    fn apply(&self, buffer: &ChannelBuffer, _sample_rate: u32) -> Result<ChannelBuffer> {
        speed_change(buffer, self.factor)
    }

    fn name(&self) -> &'static str {
        "speed"
    }

    fn params(&self) -> Value {
        json!({ "factor": self.factor })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}

/// 2:1 averaging decimator transform
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HalfSpeedAverage;

impl Transform for HalfSpeedAverage {
    fn apply(&self, buffer: &ChannelBuffer, _sample_rate: u32) -> Result<ChannelBuffer> {
        Ok(half_speed_average(buffer))
    }

    fn name(&self) -> &'static str {
        "half-speed"
    }

    fn params(&self) -> Value {
        json!({})
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ramp(len: usize) -> ChannelBuffer {
        ChannelBuffer::new(vec![(0..len).map(|i| i as f64 / 10.0).collect()])
    }

    #[test]
    fn test_speed_up_takes_even_samples() {
        let input = ramp(10);
        let result = speed_change(&input, 2.0).unwrap();
        let expected: Vec<f64> = (0..5).map(|i| input.channel(0)[2 * i]).collect();
        assert_eq!(result.channel(0), expected.as_slice());
    }

    #[test]
    fn test_slow_down_repeats_samples() {
        let input = ramp(10);
        let result = speed_change(&input, 0.5).unwrap();
        assert_eq!(result.len(), 20);
        for (i, &sample) in result.channel(0).iter().enumerate() {
            assert_eq!(sample, input.channel(0)[i / 2]);
        }
    }

    #[test]
    fn test_fractional_factor_length() {
        let result = speed_change(&ramp(100), 0.67).unwrap();
        assert_eq!(result.len(), (100.0_f64 / 0.67).floor() as usize);
    }

    #[test]
    fn test_unity_factor_is_identity() {
        let input = ramp(7);
        assert_eq!(speed_change(&input, 1.0).unwrap(), input);
    }

    #[test]
    fn test_speed_change_empty_channel() {
        let input = ChannelBuffer::new(vec![vec![], vec![]]);
        let result = speed_change(&input, 0.5).unwrap();
        assert_eq!(result.num_channels(), 2);
        assert!(result.is_empty());
    }

    #[test]
    fn test_speed_change_invalid_factor() {
        let input = ramp(4);
        assert!(speed_change(&input, 0.0).is_err());
        assert!(speed_change(&input, -1.0).is_err());
        assert!(speed_change(&input, f64::NAN).is_err());
        assert!(speed_change(&input, 1e-300).is_err());
    }

    #[test]
    fn test_half_speed_average() {
        let input = ChannelBuffer::new(vec![vec![0.0, 1.0, 0.5, 0.5, 0.25], vec![1.0; 5]]);
        let result = half_speed_average(&input);
        assert_eq!(result.channel(0), &[0.5, 0.5]);
        assert_eq!(result.channel(1), &[1.0, 1.0]);
    }

    #[test]
    fn test_transform_names() {
        assert_eq!(SpeedChange::new(2.0).name(), "speed");
        assert_eq!(HalfSpeedAverage.name(), "half-speed");
        let out = HalfSpeedAverage.apply(&ramp(4), 44100).unwrap();
        assert_eq!(out.len(), 2);
    }
}
