//! Delay and Echo
//!
//! Both add a copy of the signal `dt` seconds late, scaled by `decay`.
//! - `Delay` is feed-forward: the late copy is read from the input, giving
//!   a single reflection.
//! - `Echo` is feedback: the late copy is read from the output already
//!   produced, giving a train of repeats with amplitude `decay^n` at
//!   `n * offset`.

use serde_json::{json, Value};

use crate::dsp::transform::{
    ensure_duration, ensure_finite, ensure_sample_rate, seconds_to_samples, Transform,
};
use crate::engine::ChannelBuffer;
use crate::error::Result;

fn check_params(sample_rate: u32, dt: f64, decay: f64) -> Result<usize> {
    ensure_sample_rate(sample_rate)?;
    ensure_duration("dt", dt)?;
    ensure_finite("decay", decay)?;
    Ok(seconds_to_samples(sample_rate, dt))
}

/// Single-tap feed-forward delay
///
/// `out[i] = in[i] + decay * in[i - d]`, with `in[i - d] = 0` before the start.
pub fn delay(buffer: &ChannelBuffer, sample_rate: u32, dt: f64, decay: f64) -> Result<ChannelBuffer> {
    let offset = check_params(sample_rate, dt, decay)?;

    Ok(buffer.map_channels(|input| {
        input
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                let past = if i >= offset { input[i - offset] } else { 0.0 };
                sample + decay * past
            })
            .collect()
    }))
}

/// Recursive feedback echo
///
/// `out[i] = in[i] + decay * out[i - d]`. Each channel is evaluated in
/// increasing index order since every output depends on an earlier output.
/// A zero offset reads an output that does not exist yet and contributes 0.
pub fn echo(buffer: &ChannelBuffer, sample_rate: u32, dt: f64, decay: f64) -> Result<ChannelBuffer> {
    let offset = check_params(sample_rate, dt, decay)?;

    Ok(buffer.map_channels(|input| {
        let mut output: Vec<f64> = Vec::with_capacity(input.len());
        for (i, &sample) in input.iter().enumerate() {
            let past = if offset > 0 && i >= offset {
                output[i - offset]
            } else {
                0.0
            };
            output.push(sample + decay * past);
        }
        output
    }))
}

/// Feed-forward delay transform
#[derive(Debug, Clone, PartialEq)]
pub struct Delay {
    /// Delay time in seconds
    dt: f64,
    /// Gain of the delayed copy
    decay: f64,
}

impl Delay {
    pub fn new(dt: f64, decay: f64) -> Self {
        Self { dt, decay }
    }
}

impl Transform for Delay {
    fn apply(&self, buffer: &ChannelBuffer, sample_rate: u32) -> Result<ChannelBuffer> {
        delay(buffer, sample_rate, self.dt, self.decay)
    }

    fn name(&self) -> &'static str {
        "delay"
    }

    fn params(&self) -> Value {
        json!({ "dt": self.dt, "decay": self.decay })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}

/// Feedback echo transform
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    /// Time between repeats in seconds
    dt: f64,
    /// Gain applied on every pass through the feedback path
    decay: f64,
}

impl Echo {
    pub fn new(dt: f64, decay: f64) -> Self {
        Self { dt, decay }
    }
}

impl Transform for Echo {
    fn apply(&self, buffer: &ChannelBuffer, sample_rate: u32) -> Result<ChannelBuffer> {
        echo(buffer, sample_rate, self.dt, self.decay)
    }

    fn name(&self) -> &'static str {
        "echo"
    }

    fn params(&self) -> Value {
        json!({ "dt": self.dt, "decay": self.decay })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}
