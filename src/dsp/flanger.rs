//! Flanger
//!
//! Mixes the signal with a copy whose delay sweeps between 0 and `dt`
//! seconds, driven by a sine LFO at `freq` Hz. The delay is recomputed for
//! every sample; before the start of the signal the late copy is silent.

use std::f64::consts::PI;

use serde_json::{json, Value};

use crate::dsp::transform::{ensure_duration, ensure_finite, ensure_sample_rate, Transform};
use crate::engine::ChannelBuffer;
use crate::error::Result;

/// Sine low-frequency oscillator, in [-1, 1]
#[inline]
pub fn lfo(t: f64, freq: f64) -> f64 {
    (freq * t * 2.0 * PI).sin()
}

/// Delay in samples at index `i`: `round(sample_rate * dt * (lfo + 1) / 2)`
#[inline]
fn shift_at(i: usize, sample_rate: u32, dt: f64, freq: f64) -> usize {
    let rate = sample_rate as f64;
    let phase = lfo(i as f64 / rate, freq);
    (rate * dt * (phase + 1.0) / 2.0).round_ties_even().max(0.0) as usize
}

/// LFO-modulated delay
///
/// `out[i] = in[i] + in[i - shift(i)]`, with the delayed term 0 when
/// `i - shift(i) < 0`.
pub fn flanger(buffer: &ChannelBuffer, sample_rate: u32, dt: f64, freq: f64) -> Result<ChannelBuffer> {
    ensure_sample_rate(sample_rate)?;
    ensure_duration("dt", dt)?;
    ensure_finite("freq", freq)?;

    Ok(buffer.map_channels(|input| {
        input
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                let shift = shift_at(i, sample_rate, dt, freq);
                let past = if i >= shift { input[i - shift] } else { 0.0 };
                sample + past
            })
            .collect()
    }))
}

/// Flanger transform
#[derive(Debug, Clone, PartialEq)]
pub struct Flanger {
    /// Maximum delay in seconds
    dt: f64,
    /// LFO frequency in Hz
    freq: f64,
}

impl Flanger {
    pub fn new(dt: f64, freq: f64) -> Self {
        Self { dt, freq }
    }
}

impl Transform for Flanger {
    fn apply(&self, buffer: &ChannelBuffer, sample_rate: u32) -> Result<ChannelBuffer> {
        flanger(buffer, sample_rate, self.dt, self.freq)
    }

    fn name(&self) -> &'static str {
        "flanger"
    }

    fn params(&self) -> Value {
        json!({ "dt": self.dt, "freq": self.freq })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lfo_range() {
        assert_abs_diff_eq!(lfo(0.0, 1.0), 0.0);
        assert_abs_diff_eq!(lfo(0.25, 1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lfo(0.75, 1.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shift_sweeps_between_zero_and_max() {
        // 100 Hz, 0.1 s max delay -> 0..=10 samples, LFO at 1 Hz
        assert_eq!(shift_at(0, 100, 0.1, 1.0), 5);
        assert_eq!(shift_at(25, 100, 0.1, 1.0), 10);
        assert_eq!(shift_at(75, 100, 0.1, 1.0), 0);
    }

    #[test]
    fn test_delayed_term_is_zero_before_start() {
        // constant signal: while i < shift, out == in
        let buffer = ChannelBuffer::new(vec![vec![0.25; 8]]);
        let result = flanger(&buffer, 100, 0.1, 1.0).unwrap();
        let out = result.channel(0);

        // shift(0) = 5, so index 0..=4 sees no delayed copy
        for (i, &sample) in out.iter().enumerate().take(5) {
            assert_eq!(sample, 0.25, "index {}", i);
        }
    }

    #[test]
    fn test_zero_shift_doubles_signal() {
        // dt = 0 means the delayed copy is the current sample
        let buffer = ChannelBuffer::new(vec![vec![0.1, -0.2, 0.3]]);
        let result = flanger(&buffer, 44100, 0.0, 1.0).unwrap();
        assert_eq!(result.channel(0), &[0.2, -0.4, 0.6]);
    }

    #[test]
    fn test_preserves_shape() {
        let buffer = ChannelBuffer::silent(2, 50);
        let result = flanger(&buffer, 8000, 0.003, 1.0).unwrap();
        assert_eq!(result.num_channels(), 2);
        assert_eq!(result.len(), 50);
    }

    #[test]
    fn test_invalid_params() {
        let buffer = ChannelBuffer::silent(1, 4);
        assert!(flanger(&buffer, 8000, -0.003, 1.0).is_err());
        assert!(flanger(&buffer, 8000, 0.003, f64::INFINITY).is_err());
        assert!(flanger(&buffer, 0, 0.003, 1.0).is_err());
    }
}
