//! Persisted spectrogram artifacts
//!
//! A matrix is quantized into a [`QuantizedGrid`] and stored as a PNG under
//! the artifact folder. Cache hits decode straight into a [`SpectrogramImage`].

pub mod codec;
pub mod quantize;

pub use codec::{
    decode_artifact, encode_artifact, PixelPacking, SpectrogramImage, ARTIFACT_EXTENSION,
};
pub use quantize::{quantize, QuantizedGrid, INT_MAX_RANGE, NOISE_FLOOR};
