//! CLI Module
//!
//! Command-line interface for pcmfx.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dsp::TransformSpec;
use crate::engine::{PcmFormat, SampleWidth};
use crate::error::{PcmError, Result};

/// pcmfx - offline PCM audio transforms
#[derive(Parser, Debug)]
#[command(name = "pcmfx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode, transform, validate and encode one file
    #[command(name = "process")]
    Process(ProcessArgs),

    /// Print the format of an audio file
    #[command(name = "info")]
    Info {
        /// Input audio file (.wav, .raw or .pcm)
        input: PathBuf,

        #[command(flatten)]
        raw: RawArgs,
    },

    /// Write a sine test tone
    #[command(name = "tone")]
    Tone(ToneArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Input audio file (.wav, .raw or .pcm)
    pub input: PathBuf,

    /// Output audio file (.wav, .raw or .pcm)
    pub output: PathBuf,

    /// Transform to apply, e.g. `echo:0.25,0.5`; repeat to chain
    #[arg(short = 't', long = "transform", value_name = "SPEC")]
    pub transforms: Vec<TransformSpec>,

    /// JSON pipeline file; its transforms run before any given with -t
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Clamp out-of-range samples instead of failing
    #[arg(long)]
    pub clamp: bool,

    /// Output sample width in bytes (defaults to the input's)
    #[arg(long, value_name = "BYTES")]
    pub out_width: Option<usize>,

    #[command(flatten)]
    pub raw: RawArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ToneArgs {
    /// Output audio file (.wav, .raw or .pcm)
    pub output: PathBuf,

    /// Tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    pub frequency: f64,

    /// Peak amplitude (0.0 to 1.0)
    #[arg(long, default_value_t = 0.5)]
    pub amplitude: f64,

    /// Duration in seconds
    #[arg(long, default_value_t = 1.0)]
    pub duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub rate: u32,

    /// Sample width in bytes
    #[arg(long, default_value_t = 2)]
    pub width: usize,

    /// Number of channels
    #[arg(long, default_value_t = 1)]
    pub channels: usize,
}

/// Stream layout of headerless raw PCM input
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RawArgs {
    /// Raw input: channel count
    #[arg(long = "channels", value_name = "N")]
    pub channels: Option<usize>,

    /// Raw input: sample width in bytes
    #[arg(long = "width", value_name = "BYTES")]
    pub width: Option<usize>,

    /// Raw input: sample rate in Hz
    #[arg(long = "rate", value_name = "HZ")]
    pub rate: Option<u32>,
}

impl RawArgs {
    /// The raw stream format, if any raw option was given
    ///
    /// Either all three options are given or none.
    pub fn format(&self) -> Result<Option<PcmFormat>> {
        match (self.channels, self.width, self.rate) {
            (None, None, None) => Ok(None),
            (Some(channels), Some(width), Some(rate)) => Ok(Some(PcmFormat::new(
                channels,
                SampleWidth::new(width)?,
                rate,
            )?)),
            _ => Err(PcmError::UnsupportedFormat {
                details: "raw PCM needs all of --channels, --width and --rate".to_string(),
            }),
        }
    }
}
