//! PCM Sample Codec
//!
//! Maps fixed-width signed little-endian integer samples to normalized
//! `f64` samples in [-1.0, 1.0] and back.
//!
//! The mapping is affine over the full integer range of the sample width:
//! `mn -> -1.0` and `mx -> 1.0` exactly. Zero is therefore not guaranteed
//! to land on exactly 0.0, but it is off by at most one quantization step.
//!
//! Rounding uses ties-to-even so quantized values are bit-exact with other
//! tools that follow IEEE "round half to even".

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::buffer::ChannelBuffer;
use crate::engine::validation;
use crate::error::{PcmError, Result};

/// Widest raw sample supported (bytes). Raw values are held in `i128`.
pub const MAX_SAMPLE_WIDTH: usize = 16;

// ============================================================================
// Sample Width
// ============================================================================

/// Byte width of one raw sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleWidth(usize);

impl SampleWidth {
    /// 8-bit samples
    pub const BYTE: SampleWidth = SampleWidth(1);
    /// 16-bit samples (CD audio)
    pub const WORD: SampleWidth = SampleWidth(2);

    /// Create a sample width from a byte count (1..=16)
    pub fn new(bytes: usize) -> Result<Self> {
        if bytes == 0 || bytes > MAX_SAMPLE_WIDTH {
            return Err(PcmError::UnsupportedFormat {
                details: format!(
                    "{}-byte samples (supported: 1..={} bytes)",
                    bytes, MAX_SAMPLE_WIDTH
                ),
            });
        }
        Ok(SampleWidth(bytes))
    }

    /// Create a sample width from a bit depth, which must be a multiple of 8
    pub fn from_bits(bits: u16) -> Result<Self> {
        if bits % 8 != 0 {
            return Err(PcmError::UnsupportedFormat {
                details: format!("{}-bit samples (bit depth must be a multiple of 8)", bits),
            });
        }
        Self::new(bits as usize / 8)
    }

    /// Number of bytes per raw sample
    #[inline]
    pub fn bytes(self) -> usize {
        self.0
    }

    /// Number of bits per raw sample
    #[inline]
    pub fn bits(self) -> u32 {
        self.0 as u32 * 8
    }

    /// Integer range `(mn, mx)` = `(-2^(8w-1), 2^(8w-1) - 1)`
    #[inline]
    pub fn bounds(self) -> (i128, i128) {
        // 16-byte samples span the whole i128 range
        if self.bits() == 128 {
            return (i128::MIN, i128::MAX);
        }
        let power = 1_i128 << (self.bits() - 1);
        (-power, power - 1)
    }

    /// Smallest representable difference between two normalized samples
    pub fn quantization_step(self) -> f64 {
        let (mn, mx) = self.bounds();
        2.0 / span(mn, mx)
    }
}

impl fmt::Display for SampleWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// `mx - mn` as a float, computed without overflowing `i128`
#[inline]
fn span(mn: i128, mx: i128) -> f64 {
    mx as f64 - mn as f64
}

// ============================================================================
// Overflow Policy
// ============================================================================

/// What encode does with samples that do not fit the integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Refuse to encode; nothing is written
    #[default]
    Fail,
    /// Clamp samples to [-1.0, 1.0] before quantizing
    Clamp,
}

// ============================================================================
// Per-sample mapping
// ============================================================================

/// Map a raw integer sample to a normalized float
///
/// `(s - mn) / (mx - mn) * 2 - 1`
#[inline]
pub fn normalize_sample(raw: i128, width: SampleWidth) -> f64 {
    let (mn, mx) = width.bounds();
    (raw as f64 - mn as f64) / span(mn, mx) * 2.0 - 1.0
}

/// Map a normalized float back to a raw integer sample
///
/// `round((sample + 1) / 2 * (mx - mn) + mn)`, failing if the rounded value
/// is outside the representable range.
pub fn quantize_sample(sample: f64, width: SampleWidth) -> Result<i128> {
    let (mn, mx) = width.bounds();
    let scaled = ((sample + 1.0) / 2.0 * span(mn, mx) + mn as f64).round_ties_even();

    if !scaled.is_finite() || scaled < mn as f64 || scaled > mx as f64 {
        return Err(PcmError::Encode {
            reason: format!(
                "sample {} quantizes to {} outside [{}, {}] for {} audio",
                sample, scaled, mn, mx, width
            ),
        });
    }

    // Wide samples lose precision in f64; the cast saturates and the clamp
    // keeps the result inside the integer range.
    Ok((scaled as i128).clamp(mn, mx))
}

// ============================================================================
// Interleaving
// ============================================================================

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
///
/// Sample `i` lands in channel `i % channels` at position `i / channels`.
pub fn deinterleave(samples: &[f64], channels: usize) -> Vec<Vec<f64>> {
    let frames = samples.len() / channels.max(1);
    let mut result = vec![Vec::with_capacity(frames); channels];

    for (i, sample) in samples.iter().enumerate() {
        result[i % channels].push(*sample);
    }

    result
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
///
/// Channels are assumed to have equal length; frames stop at the shortest.
pub fn interleave(channels: &[Vec<f64>]) -> Vec<f64> {
    if channels.is_empty() {
        return Vec::new();
    }

    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut result = Vec::with_capacity(frames * channels.len());

    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }

    result
}

// ============================================================================
// Decode
// ============================================================================

/// Normalize interleaved raw integer samples into a channel buffer
///
/// Fails if the sample count is not a whole number of frames.
pub fn decode_samples(raw: &[i128], channels: usize, width: SampleWidth) -> Result<ChannelBuffer> {
    if channels == 0 {
        return Err(PcmError::Decode {
            reason: "channel count must be at least 1".to_string(),
        });
    }

    if raw.len() % channels != 0 {
        return Err(PcmError::Decode {
            reason: format!(
                "{} samples is not a whole number of {}-channel frames (partial final frame)",
                raw.len(),
                channels
            ),
        });
    }

    let normalized: Vec<f64> = raw.iter().map(|&s| normalize_sample(s, width)).collect();
    Ok(ChannelBuffer::new(deinterleave(&normalized, channels)))
}

/// Decode a raw little-endian frame stream into a channel buffer
pub fn decode_frames(bytes: &[u8], channels: usize, width: SampleWidth) -> Result<ChannelBuffer> {
    let w = width.bytes();

    if bytes.len() % w != 0 {
        return Err(PcmError::Decode {
            reason: format!(
                "{} bytes is not a multiple of the {}-byte sample width",
                bytes.len(),
                w
            ),
        });
    }

    let raw: Vec<i128> = bytes.chunks_exact(w).map(read_le_signed).collect();
    debug!(
        "Decoding {} raw {} samples across {} channel(s)",
        raw.len(),
        width,
        channels
    );

    decode_samples(&raw, channels, width)
}

/// Read one little-endian two's complement integer of `chunk.len()` bytes
fn read_le_signed(chunk: &[u8]) -> i128 {
    let unsigned = chunk
        .iter()
        .rev()
        .fold(0_u128, |acc, &byte| (acc << 8) | byte as u128);
    let shift = 128 - (chunk.len() as u32 * 8);
    // sign-extend from the top bit of the sample
    ((unsigned << shift) as i128) >> shift
}

// ============================================================================
// Encode
// ============================================================================

/// Quantize a channel buffer into interleaved raw integer samples
///
/// Refuses buffers that fail validation. Under [`OverflowPolicy::Fail`] the
/// first out-of-range sample aborts the whole operation.
pub fn encode_samples(
    buffer: &ChannelBuffer,
    width: SampleWidth,
    policy: OverflowPolicy,
) -> Result<Vec<i128>> {
    validation::validate(buffer)?;

    let interleaved = buffer.to_interleaved();
    let mut clamped = 0_usize;

    let raw = interleaved
        .iter()
        .map(|&sample| {
            let sample = match policy {
                OverflowPolicy::Fail => sample,
                OverflowPolicy::Clamp => {
                    if sample.abs() > 1.0 {
                        clamped += 1;
                    }
                    sample.clamp(-1.0, 1.0)
                }
            };
            quantize_sample(sample, width)
        })
        .collect::<Result<Vec<i128>>>()?;

    if clamped > 0 {
        warn!(
            "Clamped {} of {} samples to [-1, 1] before quantizing",
            clamped,
            interleaved.len()
        );
    }

    Ok(raw)
}

/// Encode a channel buffer as a raw little-endian frame stream
pub fn encode_frames(
    buffer: &ChannelBuffer,
    width: SampleWidth,
    policy: OverflowPolicy,
) -> Result<Vec<u8>> {
    let raw = encode_samples(buffer, width, policy)?;
    let w = width.bytes();

    let mut bytes = Vec::with_capacity(raw.len() * w);
    for value in raw {
        bytes.extend_from_slice(&value.to_le_bytes()[..w]);
    }

    debug!("Encoded {} bytes of {} frames", bytes.len(), width);
    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn width(bytes: usize) -> SampleWidth {
        SampleWidth::new(bytes).unwrap()
    }

    #[test_case(1, -128, 127 ; "8-bit")]
    #[test_case(2, -32768, 32767 ; "16-bit")]
    #[test_case(3, -8388608, 8388607 ; "24-bit")]
    #[test_case(4, -2147483648, 2147483647 ; "32-bit")]
    fn test_bounds(bytes: usize, mn: i128, mx: i128) {
        assert_eq!(width(bytes).bounds(), (mn, mx));
    }

    #[test]
    fn test_bounds_widest() {
        assert_eq!(width(16).bounds(), (i128::MIN, i128::MAX));
        assert_eq!(width(8).bounds(), (i64::MIN as i128, i64::MAX as i128));
    }

    #[test]
    fn test_width_rejects_zero_and_too_wide() {
        assert!(SampleWidth::new(0).is_err());
        assert!(SampleWidth::new(MAX_SAMPLE_WIDTH + 1).is_err());
        assert!(SampleWidth::from_bits(12).is_err());
        assert_eq!(SampleWidth::from_bits(24).unwrap().bytes(), 3);
    }

    #[test_case(1 ; "8-bit")]
    #[test_case(2 ; "16-bit")]
    #[test_case(3 ; "24-bit")]
    #[test_case(4 ; "32-bit")]
    fn test_extremes_map_exactly(bytes: usize) {
        let w = width(bytes);
        let (mn, mx) = w.bounds();
        assert_eq!(normalize_sample(mn, w), -1.0);
        assert_eq!(normalize_sample(mx, w), 1.0);
        assert_eq!(quantize_sample(-1.0, w).unwrap(), mn);
        assert_eq!(quantize_sample(1.0, w).unwrap(), mx);
    }

    #[test]
    fn test_zero_is_within_one_step() {
        for bytes in 1..=4 {
            let w = width(bytes);
            assert!(normalize_sample(0, w).abs() <= w.quantization_step());
        }
    }

    #[test]
    fn test_quantization_levels_round_trip() {
        let w = width(2);
        for raw in [-32768, -1000, -1, 0, 1, 12345, 32767] {
            let sample = normalize_sample(raw, w);
            assert_eq!(quantize_sample(sample, w).unwrap(), raw);
        }
    }

    #[test]
    fn test_quantize_rounds_half_to_even() {
        // (0 + 1) / 2 * 65535 - 32768 = -0.5
        assert_eq!(quantize_sample(0.0, width(2)).unwrap(), 0);
    }

    #[test]
    fn test_quantize_out_of_range_fails() {
        let result = quantize_sample(1.5, width(2));
        assert!(matches!(result, Err(PcmError::Encode { .. })));

        let result = quantize_sample(f64::NAN, width(2));
        assert!(matches!(result, Err(PcmError::Encode { .. })));
    }

    #[test]
    fn test_read_le_signed() {
        assert_eq!(read_le_signed(&[0xff]), -1);
        assert_eq!(read_le_signed(&[0x7f]), 127);
        assert_eq!(read_le_signed(&[0x00, 0x80]), -32768);
        assert_eq!(read_le_signed(&[0x01, 0x00, 0x80]), -8388607);
        assert_eq!(read_le_signed(&[0xff, 0xff, 0x7f]), 8388607);
        assert_eq!(read_le_signed(&[0xff; 16]), -1);
    }

    #[test]
    fn test_interleave_deinterleave() {
        let left = vec![1.0, 2.0, 3.0];
        let right = vec![4.0, 5.0, 6.0];
        let interleaved = interleave(&[left.clone(), right.clone()]);
        assert_eq!(interleaved, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let channels = deinterleave(&interleaved, 2);
        assert_eq!(channels, vec![left, right]);
    }

    #[test]
    fn test_decode_frames_stereo_16bit() {
        // frame 0: L = 32767, R = -32768; frame 1: L = -32768, R = 32767
        let bytes = [0xff, 0x7f, 0x00, 0x80, 0x00, 0x80, 0xff, 0x7f];
        let buffer = decode_frames(&bytes, 2, width(2)).unwrap();

        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.channel(0), &[1.0, -1.0]);
        assert_eq!(buffer.channel(1), &[-1.0, 1.0]);
    }

    #[test]
    fn test_decode_frames_rejects_partial_sample() {
        let result = decode_frames(&[0, 0, 0], 1, width(2));
        assert!(matches!(result, Err(PcmError::Decode { .. })));
    }

    #[test]
    fn test_decode_frames_rejects_partial_frame() {
        // 3 whole 16-bit samples cannot form stereo frames
        let result = decode_frames(&[0; 6], 2, width(2));
        assert!(matches!(result, Err(PcmError::Decode { .. })));
    }

    #[test]
    fn test_decode_frames_rejects_zero_channels() {
        let result = decode_frames(&[0; 4], 0, width(2));
        assert!(matches!(result, Err(PcmError::Decode { .. })));
    }

    #[test]
    fn test_decode_empty_stream() {
        let buffer = decode_frames(&[], 2, width(2)).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert!(buffer.is_empty());
    }

    #[test_case(1 ; "8-bit")]
    #[test_case(3 ; "24-bit")]
    #[test_case(5 ; "40-bit")]
    fn test_frames_round_trip(bytes: usize) {
        let w = width(bytes);
        let (mn, mx) = w.bounds();
        let raw: Vec<u8> = [mn, -1, 0, 1, mx, mx / 3]
            .iter()
            .flat_map(|v| v.to_le_bytes()[..bytes].to_vec())
            .collect();

        let buffer = decode_frames(&raw, 2, w).unwrap();
        let encoded = encode_frames(&buffer, w, OverflowPolicy::Fail).unwrap();
        assert_eq!(encoded, raw);
    }

    #[test]
    fn test_encode_interleaves_frames() {
        let buffer = ChannelBuffer::new(vec![vec![1.0, -1.0], vec![-1.0, 1.0]]);
        let bytes = encode_frames(&buffer, width(2), OverflowPolicy::Fail).unwrap();
        assert_eq!(bytes, vec![0xff, 0x7f, 0x00, 0x80, 0x00, 0x80, 0xff, 0x7f]);
    }

    #[test]
    fn test_encode_fail_policy_rejects_overflow() {
        let buffer = ChannelBuffer::new(vec![vec![0.5, 1.2]]);
        let result = encode_frames(&buffer, width(2), OverflowPolicy::Fail);
        assert!(matches!(result, Err(PcmError::Encode { .. })));
    }

    #[test]
    fn test_encode_clamp_policy() {
        let buffer = ChannelBuffer::new(vec![vec![1.2, -3.0]]);
        let raw = encode_samples(&buffer, width(2), OverflowPolicy::Clamp).unwrap();
        assert_eq!(raw, vec![32767, -32768]);
    }

    #[test]
    fn test_encode_rejects_mismatched_channels() {
        let buffer = ChannelBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]]);
        let result = encode_frames(&buffer, width(2), OverflowPolicy::Clamp);
        assert!(matches!(
            result,
            Err(PcmError::ChannelLengthMismatch { channel: 1, .. })
        ));
    }

    #[test]
    fn test_decode_encode_error_bound() {
        let w = width(1);
        let step = 1.0 / 128.0;
        let buffer = ChannelBuffer::new(vec![vec![-0.9, -0.33, 0.0, 0.25, 0.77]]);
        let bytes = encode_frames(&buffer, w, OverflowPolicy::Fail).unwrap();
        let decoded = decode_frames(&bytes, 1, w).unwrap();

        for (orig, back) in buffer.channel(0).iter().zip(decoded.channel(0)) {
            assert_abs_diff_eq!(orig, back, epsilon = step);
        }
    }
}
