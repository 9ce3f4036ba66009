//! Pipeline configuration
//!
//! A pipeline file is JSON:
//!
//! ```json
//! {
//!   "transforms": [
//!     { "type": "flanger", "dt": 0.003, "freq": 1.0 },
//!     { "type": "normalize", "db": -2.0 }
//!   ],
//!   "overflow": "clamp",
//!   "output_width": 2
//! }
//! ```
//!
//! Every field is optional. Transforms given on the command line run after
//! the ones from the file.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dsp::{TransformChain, TransformSpec};
use crate::engine::{OverflowPolicy, SampleWidth};
use crate::error::Result;

/// Everything the driver needs besides input and output paths
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Transforms, applied in order
    pub transforms: Vec<TransformSpec>,
    /// What encode does with samples beyond [-1, 1]
    pub overflow: OverflowPolicy,
    /// Output sample width in bytes; defaults to the input's
    pub output_width: Option<usize>,
}

impl PipelineConfig {
    /// Parse a pipeline from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a pipeline file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading pipeline config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the transform chain
    pub fn build_chain(&self) -> TransformChain {
        TransformChain::from_specs(&self.transforms)
    }

    /// Output width, falling back to `input_width`
    pub fn output_width(&self, input_width: SampleWidth) -> Result<SampleWidth> {
        match self.output_width {
            Some(bytes) => SampleWidth::new(bytes),
            None => Ok(input_width),
        }
    }
}
