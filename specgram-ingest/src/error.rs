//! Error types for specgram-ingest
//!
//! Engine validation errors (`FormatMismatch`, `InvalidConfig`, `InvalidStream`)
//! are fatal and raised before any frame is read. Loader errors carry the key of
//! the asset that produced them so batch callers can attribute failures.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type using [`SpectroError`]
pub type Result<T> = std::result::Result<T, SpectroError>;

/// Main error type for spectrogram extraction and caching
#[derive(Debug, Error)]
pub enum SpectroError {
    /// Stream bit depth or sample rate differs from the required format
    #[error(
        "Format mismatch: {bit_depth}-bit / {sample_rate} Hz stream, \
         expected {expected_bit_depth}-bit / {expected_sample_rate} Hz"
    )]
    FormatMismatch {
        bit_depth: u16,
        sample_rate: u32,
        expected_bit_depth: u16,
        expected_sample_rate: u32,
    },

    /// Engine or loader configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stream metadata is unusable (e.g. zero channels)
    #[error("Invalid audio stream: {0}")]
    InvalidStream(String),

    /// Reading frames from the stream failed
    #[error("Audio stream read failed: {0}")]
    StreamRead(String),

    /// Matrix write outside the allocated shape
    #[error("Matrix write out of bounds: row {row} with {len} values, matrix is {rows}x{cols}")]
    OverrunGuard {
        row: usize,
        len: usize,
        rows: usize,
        cols: usize,
    },

    /// Directory could not be listed
    #[error("Cannot list directory {path}: {source}")]
    InvalidDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory contains no raw audio assets
    #[error("No wav files in directory {0}")]
    EmptyDirectory(PathBuf),

    /// Reading/writing a raw asset or its artifact failed
    #[error("Asset '{key}': {source}")]
    AssetIo {
        key: String,
        #[source]
        source: AssetIoError,
    },

    /// The engine rejected an asset
    #[error("Asset '{key}': {source}")]
    Conversion {
        key: String,
        #[source]
        source: Box<SpectroError>,
    },

    /// Worker pool could not be built or a worker task failed
    #[error("Worker error: {0}")]
    Worker(String),

    /// Configuration file error
    #[error(transparent)]
    Common(#[from] specgram_common::Error),
}

impl SpectroError {
    /// Attach an asset key to an I/O failure
    pub fn asset_io(key: impl Into<String>, source: impl Into<AssetIoError>) -> Self {
        SpectroError::AssetIo {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Attach an asset key to an engine failure
    ///
    /// Stream read failures are I/O failures of the raw asset; everything else
    /// the engine raises is kept as-is under `Conversion`.
    pub fn attributed(key: impl Into<String>, error: SpectroError) -> Self {
        match error {
            SpectroError::StreamRead(message) => SpectroError::AssetIo {
                key: key.into(),
                source: AssetIoError::Read(message),
            },
            other => SpectroError::Conversion {
                key: key.into(),
                source: Box::new(other),
            },
        }
    }

    /// Asset key this error is attributed to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            SpectroError::AssetIo { key, .. } | SpectroError::Conversion { key, .. } => Some(key),
            _ => None,
        }
    }

    /// True for a format mismatch, directly or attributed to an asset
    pub fn is_format_mismatch(&self) -> bool {
        match self {
            SpectroError::FormatMismatch { .. } => true,
            SpectroError::Conversion { source, .. } => source.is_format_mismatch(),
            _ => false,
        }
    }
}

/// Per-asset I/O failures
#[derive(Debug, Error)]
pub enum AssetIoError {
    /// WAV header could not be opened or parsed
    #[error("WAV open failed: {0}")]
    Wav(#[from] hound::Error),

    /// Sample data could not be read
    #[error("Audio read failed: {0}")]
    Read(String),

    /// PNG encoding failed
    #[error("PNG encode failed: {0}")]
    Encode(#[from] png::EncodingError),

    /// PNG decoding failed
    #[error("PNG decode failed: {0}")]
    Decode(#[from] png::DecodingError),

    /// Artifact decoded but has an unsupported layout
    #[error("Unsupported artifact: {0}")]
    UnsupportedArtifact(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
