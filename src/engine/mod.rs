//! Audio Engine Module
//!
//! Core of the codec side of pcmfx:
//! - Channel buffer representation
//! - PCM sample codec
//! - Output validation
//! - File I/O operations

pub mod buffer;
pub mod codec;
pub mod io;
pub mod validation;

pub use buffer::{db_to_power, power_to_db, ChannelBuffer};
pub use codec::{
    decode_frames, decode_samples, encode_frames, encode_samples, OverflowPolicy, SampleWidth,
};
pub use io::{
    decode_raw, decode_wav, encode_raw, encode_wav, generate_test_tone, read_audio, write_audio,
    Container, DecodedAudio, PcmFormat,
};
pub use validation::{inspect, validate, ValidationReport};
