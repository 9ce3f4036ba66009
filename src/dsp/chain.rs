//! Transform chains
//!
//! Transforms compose by sequential application: each one's output is the
//! next one's input. A chain is built from [`TransformSpec`] values, which
//! come from a pipeline file (JSON) or a compact command-line syntax:
//!
//! | Syntax             | Transform                      |
//! |--------------------|--------------------------------|
//! | `amp:0.5`          | multiply by 0.5                |
//! | `normalize:-2`     | peak to -2 dB                  |
//! | `delay:0.25,0.5`   | 0.25 s feed-forward, decay 0.5 |
//! | `echo:0.25,0.5`    | 0.25 s feedback, decay 0.5     |
//! | `flanger:0.003,1`  | 3 ms sweep at 1 Hz             |
//! | `speed:0.67`       | resample by factor 0.67        |
//! | `half-speed`       | 2:1 averaging decimation       |

use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dsp::delay::{Delay, Echo};
use crate::dsp::flanger::Flanger;
use crate::dsp::gain::{ChangeAmp, Normalize};
use crate::dsp::speed::{HalfSpeedAverage, SpeedChange};
use crate::dsp::transform::Transform;
use crate::engine::ChannelBuffer;
use crate::error::{PcmError, Result};

/// Serializable description of one transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransformSpec {
    Amp { factor: f64 },
    Normalize { db: f64 },
    Delay { dt: f64, decay: f64 },
    Echo { dt: f64, decay: f64 },
    Flanger { dt: f64, freq: f64 },
    Speed { factor: f64 },
    HalfSpeed,
}

impl TransformSpec {
    /// Instantiate the described transform
    pub fn build(&self) -> Box<dyn Transform> {
        match *self {
            TransformSpec::Amp { factor } => Box::new(ChangeAmp::new(factor)),
            TransformSpec::Normalize { db } => Box::new(Normalize::new(db)),
            TransformSpec::Delay { dt, decay } => Box::new(Delay::new(dt, decay)),
            TransformSpec::Echo { dt, decay } => Box::new(Echo::new(dt, decay)),
            TransformSpec::Flanger { dt, freq } => Box::new(Flanger::new(dt, freq)),
            TransformSpec::Speed { factor } => Box::new(SpeedChange::new(factor)),
            TransformSpec::HalfSpeed => Box::new(HalfSpeedAverage),
        }
    }
}

impl FromStr for TransformSpec {
    type Err = PcmError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let (name, args) = match input.split_once(':') {
            Some((name, args)) => (name.trim(), args),
            None => (input, ""),
        };

        let syntax_error = |reason: String| PcmError::InvalidTransformSyntax {
            input: s.to_string(),
            reason,
        };

        let values = args
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| {
                a.parse::<f64>()
                    .map_err(|_| syntax_error(format!("'{}' is not a number", a)))
            })
            .collect::<Result<Vec<f64>>>()?;

        let expect = |count: usize| -> Result<()> {
            if values.len() == count {
                Ok(())
            } else {
                Err(syntax_error(format!(
                    "'{}' takes {} argument(s), got {}",
                    name,
                    count,
                    values.len()
                )))
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "amp" | "gain" => {
                expect(1)?;
                Ok(TransformSpec::Amp { factor: values[0] })
            }
            "normalize" => {
                expect(1)?;
                Ok(TransformSpec::Normalize { db: values[0] })
            }
            "delay" => {
                expect(2)?;
                Ok(TransformSpec::Delay {
                    dt: values[0],
                    decay: values[1],
                })
            }
            "echo" => {
                expect(2)?;
                Ok(TransformSpec::Echo {
                    dt: values[0],
                    decay: values[1],
                })
            }
            "flanger" => {
                expect(2)?;
                Ok(TransformSpec::Flanger {
                    dt: values[0],
                    freq: values[1],
                })
            }
            "speed" => {
                expect(1)?;
                Ok(TransformSpec::Speed { factor: values[0] })
            }
            "half-speed" | "speed2x" => {
                expect(0)?;
                Ok(TransformSpec::HalfSpeed)
            }
            _ => Err(syntax_error(format!("unknown transform '{}'", name))),
        }
    }
}

/// Ordered sequence of transforms
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Build a chain from specs, in order
    pub fn from_specs(specs: &[TransformSpec]) -> Self {
        Self {
            transforms: specs.iter().map(TransformSpec::build).collect(),
        }
    }

    /// Append a transform to the end of the chain
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Get the number of transforms in the chain
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Iterate over transforms
    pub fn iter(&self) -> impl Iterator<Item = &dyn Transform> {
        self.transforms.iter().map(|t| t.as_ref())
    }

    /// Run every transform in order
    ///
    /// An empty chain returns a copy of the input. The first failing
    /// transform aborts the chain.
    pub fn apply(&self, buffer: &ChannelBuffer, sample_rate: u32) -> Result<ChannelBuffer> {
        let mut current = buffer.clone();

        for (step, transform) in self.transforms.iter().enumerate() {
            info!(
                "Applying {} ({}/{}) {}",
                transform.name(),
                step + 1,
                self.transforms.len(),
                transform.params()
            );
            current = transform.apply(&current, sample_rate)?;
            debug!(
                "{} produced {} channel(s) of {} samples",
                transform.name(),
                current.num_channels(),
                current.len()
            );
        }

        Ok(current)
    }
}
