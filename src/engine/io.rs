//! Audio file I/O for pcmfx
//!
//! Two containers are supported:
//! - WAV (integer PCM, 8/16/24/32-bit) through `hound`
//! - headerless raw PCM, interleaved little-endian, any width up to 16 bytes
//!
//! Decoding normalizes samples with the codec in [`crate::engine::codec`].
//! Encoding quantizes the whole buffer before a single byte is written, and
//! file output goes through a `.partial` file that is renamed into place
//! only on success, so a failed run never leaves a truncated destination.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};

use crate::engine::buffer::ChannelBuffer;
use crate::engine::codec::{self, OverflowPolicy, SampleWidth};
use crate::error::{PcmError, Result};

/// Widest sample the WAV container is written with
const MAX_WAV_SAMPLE_WIDTH: usize = 4;

// ============================================================================
// Formats
// ============================================================================

/// Layout of a PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Channel count (at least 1)
    pub channels: usize,
    /// Bytes per raw sample
    pub sample_width: SampleWidth,
    /// Samples per second per channel
    pub sample_rate: u32,
}

impl PcmFormat {
    /// Create a format, rejecting zero channels or a zero sample rate
    pub fn new(channels: usize, sample_width: SampleWidth, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(PcmError::UnsupportedFormat {
                details: "0-channel audio".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(PcmError::UnsupportedFormat {
                details: "sample rate of 0 Hz".to_string(),
            });
        }
        Ok(Self {
            channels,
            sample_width,
            sample_rate,
        })
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} channel(s), {} ({} byte(s)), {} Hz",
            self.channels,
            self.sample_width,
            self.sample_width.bytes(),
            self.sample_rate
        )
    }
}

/// A decoded stream: samples plus what is needed to encode them again
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub buffer: ChannelBuffer,
    pub sample_rate: u32,
    pub sample_width: SampleWidth,
}

impl DecodedAudio {
    /// Format of the decoded stream
    pub fn format(&self) -> PcmFormat {
        PcmFormat {
            channels: self.buffer.num_channels(),
            sample_width: self.sample_width,
            sample_rate: self.sample_rate,
        }
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.buffer.len()
    }
}

/// On-disk container, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Wav,
    Raw,
}

impl Container {
    /// Pick the container from a path's extension (`.wav`/`.wave`, `.raw`/`.pcm`)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("wav") | Some("wave") => Ok(Container::Wav),
            Some("raw") | Some("pcm") => Ok(Container::Raw),
            other => Err(PcmError::UnsupportedFormat {
                details: format!(
                    "file extension {:?} of {} (expected .wav, .raw or .pcm)",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Decode a WAV stream
///
/// # Errors
/// * `UnsupportedFormat` - floating-point or non-byte-aligned samples
/// * `Decode` - malformed header or truncated frame data
pub fn decode_wav<R: Read>(reader: R) -> Result<DecodedAudio> {
    let reader = WavReader::new(reader).map_err(|e| PcmError::Decode {
        reason: format!("Failed to parse WAV header: {}", e),
    })?;
    decode_wav_reader(reader)
}

fn decode_wav_reader<R: Read>(reader: WavReader<R>) -> Result<DecodedAudio> {
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int {
        return Err(PcmError::UnsupportedFormat {
            details: format!("{}-bit floating-point samples", spec.bits_per_sample),
        });
    }

    let format = PcmFormat::new(
        spec.channels as usize,
        SampleWidth::from_bits(spec.bits_per_sample)?,
        spec.sample_rate,
    )?;
    info!(
        "Channels: {}, sample width: {} byte(s), sample rate: {} Hz, frames: {}",
        format.channels,
        format.sample_width.bytes(),
        format.sample_rate,
        reader.duration()
    );

    let raw = reader
        .into_samples::<i32>()
        .map(|s| {
            s.map(i128::from).map_err(|e| PcmError::Decode {
                reason: format!("Failed to read {} samples: {}", format.sample_width, e),
            })
        })
        .collect::<Result<Vec<i128>>>()?;

    let buffer = codec::decode_samples(&raw, format.channels, format.sample_width)?;

    Ok(DecodedAudio {
        buffer,
        sample_rate: format.sample_rate,
        sample_width: format.sample_width,
    })
}

/// Decode a headerless raw PCM stream of the given format
pub fn decode_raw<R: Read>(mut reader: R, format: &PcmFormat) -> Result<DecodedAudio> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    info!("Reading {} bytes of raw PCM ({})", bytes.len(), format);
    let buffer = codec::decode_frames(&bytes, format.channels, format.sample_width)?;

    Ok(DecodedAudio {
        buffer,
        sample_rate: format.sample_rate,
        sample_width: format.sample_width,
    })
}

/// Read and decode an audio file
///
/// `raw_format` describes the stream when the file is raw PCM; it is
/// ignored for WAV files, whose header carries the format.
pub fn read_audio(path: &Path, raw_format: Option<&PcmFormat>) -> Result<DecodedAudio> {
    debug!("Reading {}", path.display());

    match Container::from_path(path)? {
        Container::Wav => {
            let reader = WavReader::open(path).map_err(|e| PcmError::AudioReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            decode_wav_reader(reader)
        }
        Container::Raw => {
            let format = raw_format.ok_or_else(|| PcmError::UnsupportedFormat {
                details: format!(
                    "raw PCM input {} needs an explicit channel count, sample width and rate",
                    path.display()
                ),
            })?;
            decode_raw(BufReader::new(File::open(path)?), format)
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

fn wav_spec(buffer: &ChannelBuffer, sample_rate: u32, width: SampleWidth) -> Result<WavSpec> {
    if width.bytes() > MAX_WAV_SAMPLE_WIDTH {
        return Err(PcmError::UnsupportedFormat {
            details: format!("{} samples in a WAV container (max 32-bit)", width),
        });
    }

    let channels = u16::try_from(buffer.num_channels()).map_err(|_| PcmError::UnsupportedFormat {
        details: format!("{}-channel WAV", buffer.num_channels()),
    })?;

    Ok(WavSpec {
        channels,
        sample_rate,
        bits_per_sample: width.bits() as u16,
        sample_format: SampleFormat::Int,
    })
}

fn write_wav_samples<W: Write + Seek>(writer: W, spec: WavSpec, raw: &[i128]) -> hound::Result<()> {
    let mut writer = WavWriter::new(writer, spec)?;
    for &value in raw {
        // widths up to 32-bit always fit
        writer.write_sample(value as i32)?;
    }
    writer.finalize()
}

/// Encode a buffer as a WAV stream
///
/// # Errors
/// * `NoChannels` / `ChannelLengthMismatch` - buffer fails validation
/// * `Encode` - a sample falls outside the integer range under `OverflowPolicy::Fail`
/// * `UnsupportedFormat` - width above 32-bit
pub fn encode_wav<W: Write + Seek>(
    buffer: &ChannelBuffer,
    sample_rate: u32,
    width: SampleWidth,
    policy: OverflowPolicy,
    writer: W,
) -> Result<()> {
    let spec = wav_spec(buffer, sample_rate, width)?;
    let raw = codec::encode_samples(buffer, width, policy)?;

    write_wav_samples(writer, spec, &raw).map_err(|e| PcmError::Encode {
        reason: format!("Failed to write WAV stream: {}", e),
    })
}

/// Encode a buffer as a headerless raw PCM stream
pub fn encode_raw<W: Write>(
    buffer: &ChannelBuffer,
    width: SampleWidth,
    policy: OverflowPolicy,
    mut writer: W,
) -> Result<()> {
    let bytes = codec::encode_frames(buffer, width, policy)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Encode a buffer and write it to `path`
///
/// The container follows the path's extension. Nothing is created at `path`
/// unless encoding succeeds.
pub fn write_audio(
    path: &Path,
    buffer: &ChannelBuffer,
    sample_rate: u32,
    width: SampleWidth,
    policy: OverflowPolicy,
) -> Result<()> {
    let container = Container::from_path(path)?;
    info!(
        "Writing {} ({} channel(s), {} frames, {}, {} Hz)",
        path.display(),
        buffer.num_channels(),
        buffer.len(),
        width,
        sample_rate
    );

    match container {
        Container::Wav => {
            let spec = wav_spec(buffer, sample_rate, width)?;
            let raw = codec::encode_samples(buffer, width, policy)?;
            write_atomically(path, |file| {
                write_wav_samples(file, spec, &raw).map_err(|e| PcmError::AudioWriteError {
                    path: path.display().to_string(),
                    source: e,
                })
            })
        }
        Container::Raw => {
            let bytes = codec::encode_frames(buffer, width, policy)?;
            write_atomically(path, |mut file| {
                file.write_all(&bytes)?;
                file.flush()?;
                Ok(())
            })
        }
    }
}

/// Write through `<path>.partial` and rename into place on success
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<()>,
{
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let file = File::create(&partial)?;
    if let Err(e) = write(BufWriter::new(file)) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path)?;
    Ok(())
}

// ============================================================================
// Test signals
// ============================================================================

/// Generate a sine tone on every channel
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of identical channels
pub fn generate_test_tone(
    frequency: f64,
    amplitude: f64,
    duration_secs: f64,
    sample_rate: u32,
    channels: usize,
) -> ChannelBuffer {
    let num_samples = (duration_secs * sample_rate as f64) as usize;
    let angular_freq = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;

    let tone: Vec<f64> = (0..num_samples)
        .map(|i| amplitude * (angular_freq * i as f64).sin())
        .collect();

    ChannelBuffer::new(vec![tone; channels])
}

// ============================================================================
// Tests
// ============================================================================
