//! Channel Buffer
//!
//! The in-memory representation every transform consumes and produces:
//! a list of channels, each a list of normalized `f64` samples.
//!
//! Equal channel length is a precondition, not a construction-time
//! invariant. Transforms may build uneven buffers by mistake; the
//! validator is the single place that catches it before encoding.

use crate::error::{PcmError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to a power ratio: `10^(db / 10)`
#[inline]
pub fn db_to_power(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Convert a power ratio to decibels
///
/// Returns -f64::INFINITY for zero input.
#[inline]
pub fn power_to_db(ratio: f64) -> f64 {
    if ratio <= 0.0 {
        f64::NEG_INFINITY
    } else {
        10.0 * ratio.log10()
    }
}

// ============================================================================
// Channel Buffer
// ============================================================================

/// Channel-major buffer of normalized samples
///
/// # Example
/// ```
/// use pcmfx::engine::ChannelBuffer;
///
/// let buffer = ChannelBuffer::silent(2, 48000);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelBuffer {
    channels: Vec<Vec<f64>>,
}

impl ChannelBuffer {
    /// Wrap per-channel sample vectors
    ///
    /// Channel lengths are not checked here; see [`crate::engine::validate`].
    pub fn new(channels: Vec<Vec<f64>>) -> Self {
        Self { channels }
    }

    /// Create a buffer of `num_channels` channels of zeros
    pub fn silent(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
        }
    }

    /// Create a buffer from interleaved samples (L, R, L, R, ... for stereo)
    pub fn from_interleaved(interleaved: &[f64], num_channels: usize) -> Result<Self> {
        if num_channels == 0 {
            return Err(PcmError::Decode {
                reason: "channel count must be at least 1".to_string(),
            });
        }

        if interleaved.len() % num_channels != 0 {
            return Err(PcmError::Decode {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        Ok(Self::new(crate::engine::codec::deinterleave(
            interleaved,
            num_channels,
        )))
    }

    /// Convert the buffer to interleaved order
    pub fn to_interleaved(&self) -> Vec<f64> {
        crate::engine::codec::interleave(&self.channels)
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples in channel 0
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds at the given sample rate
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / sample_rate as f64
    }

    /// Get a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.channels[index]
    }

    /// All channels
    #[inline]
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Consume the buffer, returning the channel vectors
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Get a sample, or None if out of bounds
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f64> {
        self.channels
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Largest absolute sample value across all channels
    ///
    /// NaN samples are ignored. Returns 0.0 for empty buffers.
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|s| s.abs())
            .fold(0.0_f64, f64::max)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Build a new buffer by applying `f` to each channel independently
    ///
    /// With the `parallel` feature channels are processed on the rayon pool.
    pub fn map_channels<F>(&self, f: F) -> ChannelBuffer
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        let channels = {
            use rayon::prelude::*;
            self.channels
                .par_iter()
                .map(|channel| f(channel.as_slice()))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let channels = self
            .channels
            .iter()
            .map(|channel| f(channel.as_slice()))
            .collect();

        ChannelBuffer::new(channels)
    }
}

impl From<Vec<Vec<f64>>> for ChannelBuffer {
    fn from(channels: Vec<Vec<f64>>) -> Self {
        Self::new(channels)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_to_power() {
        assert_relative_eq!(db_to_power(0.0), 1.0);
        assert_relative_eq!(db_to_power(-10.0), 0.1, max_relative = 1e-12);
        assert_relative_eq!(db_to_power(-2.0), 10.0_f64.powf(-0.2));
    }

    #[test]
    fn test_power_db_roundtrip() {
        for &val in &[0.1, 0.5, 1.0, 0.001] {
            assert_relative_eq!(db_to_power(power_to_db(val)), val, max_relative = 1e-12);
        }
        assert!(power_to_db(0.0).is_infinite());
    }

    #[test]
    fn test_silent() {
        let buffer = ChannelBuffer::silent(2, 100);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_from_interleaved_stereo() {
        let buffer = ChannelBuffer::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 2).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get_sample(0, 1), Some(0.3));
        assert_eq!(buffer.get_sample(1, 2), Some(0.6));
        assert_eq!(buffer.get_sample(2, 0), None);
    }

    #[test]
    fn test_from_interleaved_invalid() {
        assert!(ChannelBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2).is_err());
        assert!(ChannelBuffer::from_interleaved(&[0.1], 0).is_err());
    }

    #[test]
    fn test_interleaved_roundtrip() {
        let original = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        let buffer = ChannelBuffer::from_interleaved(&original, 4).unwrap();
        assert_eq!(buffer.to_interleaved(), original);
    }

    #[test]
    fn test_peak_across_channels() {
        let buffer = ChannelBuffer::new(vec![vec![0.1, -0.2], vec![0.3, -0.7]]);
        assert_eq!(buffer.peak(), 0.7);
    }

    #[test]
    fn test_duration() {
        let buffer = ChannelBuffer::silent(1, 44100);
        assert_relative_eq!(buffer.duration_secs(44100), 1.0);
        assert_eq!(buffer.duration_secs(0), 0.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(ChannelBuffer::new(vec![vec![0.5; 10]]).is_finite());
        assert!(!ChannelBuffer::new(vec![vec![f64::NAN]]).is_finite());
        assert!(!ChannelBuffer::new(vec![vec![f64::INFINITY]]).is_finite());
    }

    #[test]
    fn test_map_channels_preserves_order() {
        let buffer = ChannelBuffer::new(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let doubled = buffer.map_channels(|ch| ch.iter().map(|s| s * 2.0).collect());
        assert_eq!(doubled.channels(), &[vec![2.0], vec![4.0], vec![6.0]]);
    }

    #[test]
    fn test_channel_mut() {
        let mut buffer = ChannelBuffer::silent(1, 4);
        buffer.channel_mut(0)[2] = 0.75;
        assert_eq!(buffer.channel(0), &[0.0, 0.0, 0.75, 0.0]);
    }
}
