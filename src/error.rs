//! Error handling for pcmfx
//!
//! Every failure is terminal for the current run. Errors carry the pipeline
//! stage they belong to so the driver can report where a run stopped.

use std::fmt;

use thiserror::Error;

/// Result type alias for pcmfx operations
pub type Result<T> = std::result::Result<T, PcmError>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Transform,
    Validate,
    Encode,
    Config,
    Io,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Transform => "transform",
            Stage::Validate => "validate",
            Stage::Encode => "encode",
            Stage::Config => "config",
            Stage::Io => "io",
        };
        f.write_str(name)
    }
}

/// Main error type for pcmfx operations
#[derive(Error, Debug)]
pub enum PcmError {
    // Codec errors
    #[error("Decode error: {reason}")]
    Decode { reason: String },

    #[error("Encode error: {reason}")]
    Encode { reason: String },

    // Validation errors
    #[error("Result contains 0 channels")]
    NoChannels,

    #[error(
        "Sample count mismatch: channel 0 has {expected} samples, channel {channel} has {actual}"
    )]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Channel {channel} contains a non-finite sample at index {index}")]
    NonFiniteSample { channel: usize, index: usize },

    // Transform errors
    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("Invalid parameter: {param} = {value} ({reason})")]
    InvalidParameter {
        param: String,
        value: f64,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid transform '{input}': {reason}")]
    InvalidTransformSyntax { input: String, reason: String },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    // Container I/O errors
    #[error("Failed to read audio file: {path}")]
    AudioReadError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PcmError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_param(param: &str, value: f64, reason: &str) -> Self {
        PcmError::InvalidParameter {
            param: param.to_string(),
            value,
            reason: reason.to_string(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PcmError::Decode { .. } => "DECODE_ERROR",
            PcmError::Encode { .. } => "ENCODE_ERROR",
            PcmError::NoChannels => "NO_CHANNELS",
            PcmError::ChannelLengthMismatch { .. } => "CHANNEL_LENGTH_MISMATCH",
            PcmError::NonFiniteSample { .. } => "NON_FINITE_SAMPLE",
            PcmError::DegenerateInput { .. } => "DEGENERATE_INPUT",
            PcmError::InvalidParameter { .. } => "INVALID_PARAMETER",
            PcmError::InvalidTransformSyntax { .. } => "INVALID_TRANSFORM_SYNTAX",
            PcmError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            PcmError::AudioReadError { .. } => "AUDIO_READ_ERROR",
            PcmError::AudioWriteError { .. } => "AUDIO_WRITE_ERROR",
            PcmError::Io(_) => "IO_ERROR",
            PcmError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get the pipeline stage that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            PcmError::Decode { .. } | PcmError::AudioReadError { .. } => Stage::Decode,
            PcmError::Encode { .. } | PcmError::AudioWriteError { .. } => Stage::Encode,
            PcmError::NoChannels
            | PcmError::ChannelLengthMismatch { .. }
            | PcmError::NonFiniteSample { .. } => Stage::Validate,
            PcmError::DegenerateInput { .. } | PcmError::InvalidParameter { .. } => {
                Stage::Transform
            }
            PcmError::InvalidTransformSyntax { .. }
            | PcmError::UnsupportedFormat { .. }
            | PcmError::Serialization(_) => Stage::Config,
            PcmError::Io(_) => Stage::Io,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            PcmError::Decode { .. } => "The file may be truncated; check channel count and sample width",
            PcmError::Encode { .. } => "Normalize the signal or re-run with --clamp",
            PcmError::NoChannels => "The transform pipeline must keep at least one channel",
            PcmError::ChannelLengthMismatch { .. } => {
                "Every transform must produce channels of equal length"
            }
            PcmError::NonFiniteSample { .. } => "Check transform parameters for extreme values",
            PcmError::DegenerateInput { .. } => "The input is silent; skip normalization",
            PcmError::InvalidParameter { .. } => "Adjust the parameter to be within valid range",
            PcmError::InvalidTransformSyntax { .. } => {
                "Use name[:arg,arg], e.g. echo:0.25,0.5 or normalize:-2"
            }
            PcmError::UnsupportedFormat { .. } => {
                "Use integer PCM WAV (8/16/24/32-bit) or raw PCM"
            }
            PcmError::AudioReadError { .. } => {
                "Check that the file exists and is a valid audio file"
            }
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PcmError::Decode {
            reason: "partial frame".to_string(),
        };
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn test_mismatch_message_names_channel() {
        let err = PcmError::ChannelLengthMismatch {
            channel: 2,
            expected: 100,
            actual: 99,
        };
        let message = err.to_string();
        assert!(message.contains("channel 2"));
        assert!(message.contains("100"));
        assert!(message.contains("99"));
        assert_eq!(err.stage(), Stage::Validate);
    }

    #[test]
    fn test_invalid_param_helper() {
        let err = PcmError::invalid_param("factor", 0.0, "must be > 0");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(err.stage(), Stage::Transform);
        assert!(!err.recovery_hint().is_empty());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Encode.to_string(), "encode");
        assert_eq!(Stage::Validate.to_string(), "validate");
    }
}
