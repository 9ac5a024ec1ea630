//! Per-asset cache resolution
//!
//! Shared by the sequential loader and the batch converter. A resolver only
//! reads its own configuration, so one instance can serve many threads.

use super::{ArtifactOrigin, LoadedSpectrogram};
use crate::artifact::{self, PixelPacking};
use crate::audio::WavStream;
use crate::engine::{ClipStrategy, SpectrogramTransform};
use crate::error::{Result, SpectroError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// One raw asset awaiting resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    pub key: String,
    pub raw_path: PathBuf,
    /// Persisted artifact found at scan time
    pub cached: Option<PathBuf>,
}

/// Turns an [`AssetJob`] into a decoded artifact, computing it on a miss
#[derive(Debug, Clone)]
pub struct AssetResolver<T> {
    transform: T,
    strategy: ClipStrategy,
    artifact_dir: PathBuf,
    packing: PixelPacking,
}

impl<T: SpectrogramTransform> AssetResolver<T> {
    pub fn new(
        transform: T,
        strategy: ClipStrategy,
        artifact_dir: PathBuf,
        packing: PixelPacking,
    ) -> Self {
        Self {
            transform,
            strategy,
            artifact_dir,
            packing,
        }
    }

    pub fn strategy(&self) -> ClipStrategy {
        self.strategy
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Path a freshly computed artifact for `key` is written to
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.artifact_dir
            .join(format!("{}.{}", key, artifact::ARTIFACT_EXTENSION))
    }

    /// Resolve one asset
    ///
    /// Every error is attributed to `job.key`.
    pub fn resolve(&self, job: &AssetJob) -> Result<LoadedSpectrogram> {
        match &job.cached {
            Some(path) => {
                info!(key = %job.key, path = %path.display(), "Spectrogram cached");
                let image = artifact::decode_artifact(path)
                    .map_err(|e| SpectroError::asset_io(&job.key, e))?;
                Ok(LoadedSpectrogram {
                    key: job.key.clone(),
                    origin: ArtifactOrigin::Cached,
                    path: path.clone(),
                    image,
                })
            }
            None => self.compute(job),
        }
    }

    fn compute(&self, job: &AssetJob) -> Result<LoadedSpectrogram> {
        let key = job.key.as_str();
        info!(
            key = %key,
            path = %job.raw_path.display(),
            strategy = %self.strategy,
            "Computing spectrogram"
        );
        let started = Instant::now();

        let mut stream =
            WavStream::open(&job.raw_path).map_err(|e| SpectroError::asset_io(key, e))?;
        let matrix = self
            .transform
            .convert_to_spectrogram(&mut stream, self.strategy)
            .map_err(|e| SpectroError::attributed(key, e))?;

        let grid = artifact::quantize(&matrix);

        fs::create_dir_all(&self.artifact_dir).map_err(|e| SpectroError::asset_io(key, e))?;
        let path = self.artifact_path(key);
        artifact::encode_artifact(&grid, self.packing, &path)
            .map_err(|e| SpectroError::asset_io(key, e))?;

        debug!(
            key = %key,
            path = %path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Artifact written"
        );

        let image = artifact::decode_artifact(&path).map_err(|e| SpectroError::asset_io(key, e))?;
        Ok(LoadedSpectrogram {
            key: job.key.clone(),
            origin: ArtifactOrigin::Computed,
            path,
            image,
        })
    }
}
