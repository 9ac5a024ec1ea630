//! Directory-scoped spectrogram cache
//!
//! A [`SpectrogramLoader`] scans its directory once and then yields one decoded
//! artifact per raw audio asset, in key order. Assets with a persisted artifact
//! are decoded directly; the rest are computed, written to the artifact folder
//! and decoded from disk so both paths return the same representation.
//!
//! Iteration is single-pass. Build a new loader to iterate again.

pub mod inventory;
pub mod resolver;

pub use inventory::{AssetInventory, ARTIFACT_FOLDER, RAW_AUDIO_EXTENSION};
pub use resolver::{AssetJob, AssetResolver};

use crate::artifact::{PixelPacking, SpectrogramImage};
use crate::engine::{ClipStrategy, SpectrogramEngine, SpectrogramTransform};
use crate::error::Result;
use std::collections::{btree_map, BTreeMap};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Loader settings beyond the transform and strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Pixel packing for newly written artifacts
    pub packing: PixelPacking,
}

/// Where a loaded spectrogram came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    /// Decoded from an artifact present at scan time
    Cached,
    /// Computed, persisted, then decoded
    Computed,
}

/// One resolved asset
#[derive(Debug, Clone)]
pub struct LoadedSpectrogram {
    pub key: String,
    pub origin: ArtifactOrigin,
    /// Artifact the image was decoded from
    pub path: PathBuf,
    pub image: SpectrogramImage,
}

impl LoadedSpectrogram {
    pub fn image(&self) -> &SpectrogramImage {
        &self.image
    }

    pub fn into_image(self) -> SpectrogramImage {
        self.image
    }

    pub fn was_cached(&self) -> bool {
        self.origin == ArtifactOrigin::Cached
    }
}

/// Lazy, single-pass iterator over the spectrograms of one directory
///
/// Each step yields its own `Result`; a failed asset does not end iteration.
pub struct SpectrogramLoader<T = SpectrogramEngine> {
    resolver: AssetResolver<T>,
    pending: btree_map::IntoIter<String, PathBuf>,
    cache_entries: BTreeMap<String, PathBuf>,
}

impl<T: SpectrogramTransform> SpectrogramLoader<T> {
    /// Scan `dir` with default options
    ///
    /// # Errors
    /// `InvalidDirectory` or `EmptyDirectory` from the scan.
    pub fn new(dir: impl AsRef<Path>, transform: T, strategy: ClipStrategy) -> Result<Self> {
        Self::with_options(dir, transform, strategy, LoaderOptions::default())
    }

    pub fn with_options(
        dir: impl AsRef<Path>,
        transform: T,
        strategy: ClipStrategy,
        options: LoaderOptions,
    ) -> Result<Self> {
        let inventory = AssetInventory::scan(dir.as_ref())?;
        let (artifact_dir, raw_assets, cache_entries) = inventory.into_parts();

        Ok(Self {
            resolver: AssetResolver::new(transform, strategy, artifact_dir, options.packing),
            pending: raw_assets.into_iter(),
            cache_entries,
        })
    }

    /// Artifacts known to this loader: those found at scan time plus those
    /// written since
    pub fn cache_entries(&self) -> &BTreeMap<String, PathBuf> {
        &self.cache_entries
    }

    pub fn artifact_dir(&self) -> &Path {
        self.resolver.artifact_dir()
    }

    pub fn strategy(&self) -> ClipStrategy {
        self.resolver.strategy()
    }

    /// Assets not yet yielded
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Split into the resolver and the jobs still pending
    pub(crate) fn into_parts(self) -> (AssetResolver<T>, Vec<AssetJob>) {
        let cache_entries = self.cache_entries;
        let jobs = self
            .pending
            .map(|(key, raw_path)| {
                let cached = cache_entries.get(&key).cloned();
                AssetJob {
                    key,
                    raw_path,
                    cached,
                }
            })
            .collect();
        (self.resolver, jobs)
    }
}

impl<T: SpectrogramTransform> Iterator for SpectrogramLoader<T> {
    type Item = Result<LoadedSpectrogram>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, raw_path) = self.pending.next()?;
        let job = AssetJob {
            cached: self.cache_entries.get(&key).cloned(),
            key,
            raw_path,
        };

        let result = self.resolver.resolve(&job);
        match &result {
            Ok(loaded) if loaded.origin == ArtifactOrigin::Computed => {
                self.cache_entries.insert(loaded.key.clone(), loaded.path.clone());
            }
            Ok(_) => {}
            Err(e) => warn!(key = %job.key, error = %e, "Failed to load spectrogram"),
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl<T: SpectrogramTransform> ExactSizeIterator for SpectrogramLoader<T> {}
