//! Amplitude transforms
//!
//! Constant-factor scaling and peak normalization.

use log::debug;
use serde_json::{json, Value};

use crate::dsp::transform::{ensure_finite, Transform};
use crate::engine::{db_to_power, ChannelBuffer};
use crate::error::{PcmError, Result};

/// Multiply every sample by `factor`
pub fn change_amp(buffer: &ChannelBuffer, factor: f64) -> Result<ChannelBuffer> {
    ensure_finite("factor", factor)?;
    Ok(buffer.map_channels(|input| input.iter().map(|s| s * factor).collect()))
}

/// Scale the whole buffer so its peak lands on `db`
///
/// The target is a power ratio, `10^(db / 10)`, and the same factor
/// `target / peak` is applied to every channel.
///
/// # Errors
/// * `DegenerateInput` - the buffer is silent (peak of 0) or its peak is not finite
pub fn normalize(buffer: &ChannelBuffer, db: f64) -> Result<ChannelBuffer> {
    ensure_finite("db", db)?;

    let target = db_to_power(db);
    let peak = buffer.peak();

    if peak == 0.0 {
        return Err(PcmError::DegenerateInput {
            reason: "cannot normalize silent audio (peak is 0)".to_string(),
        });
    }
    if !peak.is_finite() {
        return Err(PcmError::DegenerateInput {
            reason: format!("cannot normalize audio with peak {}", peak),
        });
    }

    debug!("Normalizing peak {:.6} to {:.6} ({} dB)", peak, target, db);
    Ok(buffer.map_channels(|input| input.iter().map(|s| s * target / peak).collect()))
}

/// Constant gain transform
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeAmp {
    factor: f64,
}

impl ChangeAmp {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Transform for ChangeAmp {
    fn apply(&self, buffer: &ChannelBuffer, _sample_rate: u32) -> Result<ChannelBuffer> {
        change_amp(buffer, self.factor)
    }

    fn name(&self) -> &'static str {
        "amp"
    }

    fn params(&self) -> Value {
        json!({ "factor": self.factor })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}

/// Peak normalization transform
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    db: f64,
}

impl Normalize {
    /// Create a normalizer targeting `db` decibels of peak power
    pub fn new(db: f64) -> Self {
        Self { db }
    }

    pub fn db(&self) -> f64 {
        self.db
    }
}

impl Transform for Normalize {
    fn apply(&self, buffer: &ChannelBuffer, _sample_rate: u32) -> Result<ChannelBuffer> {
        normalize(buffer, self.db)
    }

    fn name(&self) -> &'static str {
        "normalize"
    }

    fn params(&self) -> Value {
        json!({ "db": self.db })
    }

    fn box_clone(&self) -> Box<dyn Transform> {
        Box::new(self.clone())
    }
}
