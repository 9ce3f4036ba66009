//! Output validation
//!
//! Structural checks run on a transform's output before it is encoded.
//! A buffer must have at least one channel, every channel must be as long
//! as channel 0, and every sample must be finite. Samples beyond [-1, 1]
//! are counted but left to the encoder's overflow policy.

use log::warn;

use crate::engine::buffer::ChannelBuffer;
use crate::error::{PcmError, Result};

/// A channel whose length differs from channel 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub channel: usize,
    pub expected: usize,
    pub actual: usize,
}

/// Location of the first NaN or infinite sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonFinite {
    pub channel: usize,
    pub index: usize,
}

/// Results of all validation checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of channels in the buffer
    pub num_channels: usize,
    /// Length of channel 0
    pub expected_len: usize,
    /// First channel whose length differs from channel 0
    pub mismatch: Option<LengthMismatch>,
    /// First non-finite sample
    pub non_finite: Option<NonFinite>,
    /// Finite samples with magnitude above 1.0
    pub out_of_range: usize,
}

impl ValidationReport {
    /// Check if the buffer may be encoded
    pub fn is_valid(&self) -> bool {
        self.num_channels > 0 && self.mismatch.is_none() && self.non_finite.is_none()
    }

    /// Get a list of failed validation criteria
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failures = Vec::new();
        if self.num_channels == 0 {
            failures.push("no channels");
        }
        if self.mismatch.is_some() {
            failures.push("channel length mismatch");
        }
        if self.non_finite.is_some() {
            failures.push("non-finite sample");
        }
        failures
    }

    /// Convert the report into the first failing check's error
    pub fn into_result(self) -> Result<()> {
        if self.num_channels == 0 {
            return Err(PcmError::NoChannels);
        }

        if let Some(LengthMismatch {
            channel,
            expected,
            actual,
        }) = self.mismatch
        {
            return Err(PcmError::ChannelLengthMismatch {
                channel,
                expected,
                actual,
            });
        }

        if let Some(NonFinite { channel, index }) = self.non_finite {
            return Err(PcmError::NonFiniteSample { channel, index });
        }

        Ok(())
    }
}

/// Run every check and collect the results
pub fn inspect(buffer: &ChannelBuffer) -> ValidationReport {
    let expected_len = buffer.len();

    let mismatch = buffer
        .channels()
        .iter()
        .enumerate()
        .find(|(_, ch)| ch.len() != expected_len)
        .map(|(channel, ch)| LengthMismatch {
            channel,
            expected: expected_len,
            actual: ch.len(),
        });

    let mut non_finite = None;
    let mut out_of_range = 0;
    for (channel, samples) in buffer.channels().iter().enumerate() {
        for (index, sample) in samples.iter().enumerate() {
            if !sample.is_finite() {
                non_finite.get_or_insert(NonFinite { channel, index });
            } else if sample.abs() > 1.0 {
                out_of_range += 1;
            }
        }
    }

    ValidationReport {
        num_channels: buffer.num_channels(),
        expected_len,
        mismatch,
        non_finite,
        out_of_range,
    }
}

/// Validate a buffer intended for encoding
///
/// # Errors
/// * `NoChannels` - if the buffer has no channels
/// * `ChannelLengthMismatch` - naming the first channel whose length differs
///   from channel 0
/// * `NonFiniteSample` - if any sample is NaN or infinite
pub fn validate(buffer: &ChannelBuffer) -> Result<()> {
    let report = inspect(buffer);

    if report.is_valid() && report.out_of_range > 0 {
        warn!(
            "{} sample(s) exceed [-1, 1] and will not fit the integer range",
            report.out_of_range
        );
    }

    report.into_result()
}
