//! # Specgram Ingest
//!
//! Spectrogram extraction with a directory-scoped artifact cache:
//! - [`engine`]: FFT spectrogram of a fixed-length clip from an [`AudioStream`]
//! - [`artifact`]: quantization and PNG persistence
//! - [`loader`]: lazy per-directory iterator that computes on miss and decodes
//!   on hit
//! - [`services`]: parallel batch conversion of one folder or a tree of
//!   label folders

pub mod artifact;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod services;

pub use crate::artifact::{PixelPacking, SpectrogramImage};
pub use crate::audio::{AudioStream, MemoryStream, StreamFormat, WavStream};
pub use crate::config::IngestConfig;
pub use crate::engine::{
    ClipStrategy, EngineConfig, SpectrogramEngine, SpectrogramMatrix, SpectrogramTransform,
};
pub use crate::error::{AssetIoError, Result, SpectroError};
pub use crate::loader::{ArtifactOrigin, LoadedSpectrogram, LoaderOptions, SpectrogramLoader};
pub use crate::services::{
    convert_tree, BatchConverter, BatchOptions, BatchReport, FailurePolicy, FolderReport,
};
