//! Directory inventory
//!
//! Built once per loader by a single pass over the immediate children of the
//! source directory. Read-only afterwards.

use crate::artifact::codec::TEMP_SUFFIX;
use crate::error::{Result, SpectroError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of raw audio assets (matched case-insensitively)
pub const RAW_AUDIO_EXTENSION: &str = "wav";

/// Name of the artifact subfolder (matched case-insensitively)
pub const ARTIFACT_FOLDER: &str = "spectrograms";

/// Raw assets and persisted artifacts of one directory, keyed by file stem
#[derive(Debug, Clone)]
pub struct AssetInventory {
    dir: PathBuf,
    artifact_dir: PathBuf,
    raw_assets: BTreeMap<String, PathBuf>,
    artifacts: BTreeMap<String, PathBuf>,
}

impl AssetInventory {
    /// Scan `dir`
    ///
    /// # Errors
    /// `InvalidDirectory` if `dir` or its artifact folder cannot be listed,
    /// `EmptyDirectory` if `dir` holds no raw audio.
    pub fn scan(dir: &Path) -> Result<Self> {
        let entries = sorted_entries(dir)?;

        let mut raw_assets = BTreeMap::new();
        let mut artifact_folder = None;

        for path in entries {
            if path.is_dir() {
                if artifact_folder.is_none() && name_matches(&path, ARTIFACT_FOLDER) {
                    artifact_folder = Some(path);
                }
                continue;
            }
            if !has_extension(&path, RAW_AUDIO_EXTENSION) {
                continue;
            }
            insert_by_stem(&mut raw_assets, path);
        }

        if raw_assets.is_empty() {
            return Err(SpectroError::EmptyDirectory(dir.to_path_buf()));
        }

        let mut artifacts = BTreeMap::new();
        if let Some(folder) = &artifact_folder {
            for path in sorted_entries(folder)? {
                if !path.is_file() || has_extension(&path, TEMP_SUFFIX) {
                    continue;
                }
                insert_by_stem(&mut artifacts, path);
            }
        }

        debug!(
            dir = %dir.display(),
            raw_assets = raw_assets.len(),
            artifacts = artifacts.len(),
            "Directory scanned"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            artifact_dir: artifact_folder.unwrap_or_else(|| dir.join(ARTIFACT_FOLDER)),
            raw_assets,
            artifacts,
        })
    }

    /// Source directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact folder; may not exist yet
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn raw_assets(&self) -> &BTreeMap<String, PathBuf> {
        &self.raw_assets
    }

    pub fn artifacts(&self) -> &BTreeMap<String, PathBuf> {
        &self.artifacts
    }

    /// Persisted artifact for `key`, if one was found
    pub fn artifact_for(&self, key: &str) -> Option<&Path> {
        self.artifacts.get(key).map(PathBuf::as_path)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (PathBuf, BTreeMap<String, PathBuf>, BTreeMap<String, PathBuf>) {
        (self.artifact_dir, self.raw_assets, self.artifacts)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let invalid = |source| SpectroError::InvalidDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(invalid)? {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry"),
        }
    }
    paths.sort();
    Ok(paths)
}

fn name_matches(path: &Path, name: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn insert_by_stem(map: &mut BTreeMap<String, PathBuf>, path: PathBuf) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        warn!(path = %path.display(), "Skipping file with non UTF-8 name");
        return;
    };

    if let Some(existing) = map.get(stem) {
        warn!(
            key = stem,
            kept = %existing.display(),
            ignored = %path.display(),
            "Duplicate asset key"
        );
        return;
    }
    map.insert(stem.to_string(), path);
}
