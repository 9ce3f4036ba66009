//! DSP Transform Library
//!
//! Pure time-domain transforms over a [`ChannelBuffer`](crate::engine::ChannelBuffer).
//! Each transform is available both as a free function and as a
//! [`Transform`] object for use in a [`TransformChain`].
//!
//! Every transform preserves the channel count. Speed changes alter the
//! per-channel length; everything else preserves it.

pub mod chain;
mod delay;
mod flanger;
mod gain;
mod speed;
mod transform;

pub use chain::{TransformChain, TransformSpec};
pub use delay::{delay, echo, Delay, Echo};
pub use flanger::{flanger, lfo, Flanger};
pub use gain::{change_amp, normalize, ChangeAmp, Normalize};
pub use speed::{half_speed_average, speed_change, HalfSpeedAverage, SpeedChange};
pub use transform::{seconds_to_samples, Transform};
