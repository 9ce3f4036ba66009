//! pcmfx - Offline PCM Audio Transforms
//!
//! pcmfx decodes interleaved integer PCM into per-channel floating-point
//! buffers in [-1, 1], runs them through a chain of time-domain transforms,
//! validates the result and encodes it back to integer PCM.
//!
//! # Architecture
//!
//! - [`engine`]: sample codec, channel buffers, validation and WAV/raw I/O
//! - [`dsp`]: transforms (gain, normalize, delay, echo, flanger, speed) and chains
//! - [`config`]: JSON pipeline files
//! - [`cli`]: the `pcmfx` command-line driver
//!
//! ```
//! use pcmfx::dsp::{TransformChain, TransformSpec};
//! use pcmfx::engine::{decode_samples, encode_samples, OverflowPolicy, SampleWidth};
//!
//! let buffer = decode_samples(&[0, 16384, -16384, 0], 2, SampleWidth::WORD).unwrap();
//! let chain = TransformChain::from_specs(&[TransformSpec::Amp { factor: 0.5 }]);
//! let output = chain.apply(&buffer, 44100).unwrap();
//! let raw = encode_samples(&output, SampleWidth::WORD, OverflowPolicy::Fail).unwrap();
//! assert_eq!(raw.len(), 4);
//! ```

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use error::{PcmError, Result, Stage};
