//! Audio input
//!
//! [`AudioStream`] is the only surface the engine reads from. [`WavStream`]
//! adapts WAV files; [`MemoryStream`] serves PCM already in memory.

pub mod stream;
pub mod wav;

pub use stream::{AudioStream, MemoryStream, StreamFormat};
pub use wav::WavStream;
