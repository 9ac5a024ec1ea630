//! Conversion of a root folder of label folders
//!
//! Each immediate child folder is its own loader directory with its own
//! artifact folder. Children without raw audio are skipped.

use crate::engine::{ClipStrategy, SpectrogramTransform};
use crate::error::{Result, SpectroError};
use crate::loader::{LoaderOptions, SpectrogramLoader, ARTIFACT_FOLDER};
use crate::services::batch::{BatchConverter, BatchOptions, BatchReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome for one child folder
#[derive(Debug)]
pub struct FolderReport {
    pub dir: PathBuf,
    /// Batch report, or the error that kept the folder from being scanned
    pub result: Result<BatchReport>,
}

impl FolderReport {
    /// Folder name, used as the label
    pub fn label(&self) -> &str {
        self.dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Run a [`BatchConverter`] over every child folder of `root`, in name order
///
/// # Errors
/// `InvalidDirectory` if `root` cannot be listed. Failures inside a child are
/// reported in its [`FolderReport`].
pub fn convert_tree<T: SpectrogramTransform + Clone>(
    root: impl AsRef<Path>,
    transform: T,
    strategy: ClipStrategy,
    loader: LoaderOptions,
    options: BatchOptions,
) -> Result<Vec<FolderReport>> {
    let root = root.as_ref();
    let started = Instant::now();

    let mut folders = Vec::new();
    let entries = fs::read_dir(root).map_err(|source| SpectroError::InvalidDirectory {
        path: root.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let is_artifact_folder = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.eq_ignore_ascii_case(ARTIFACT_FOLDER));
        if path.is_dir() && !is_artifact_folder {
            folders.push(path);
        }
    }
    folders.sort();

    info!(root = %root.display(), folders = folders.len(), "Converting folder tree");

    let mut reports = Vec::with_capacity(folders.len());
    for dir in folders {
        let scanned = SpectrogramLoader::with_options(&dir, transform.clone(), strategy, loader);
        let result = match scanned {
            Ok(folder_loader) => BatchConverter::new(folder_loader, options).run(),
            Err(SpectroError::EmptyDirectory(_)) => {
                debug!(dir = %dir.display(), "No raw audio, skipping folder");
                continue;
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Folder could not be scanned");
                Err(e)
            }
        };
        reports.push(FolderReport { dir, result });
    }

    info!(
        root = %root.display(),
        folders = reports.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Folder tree converted"
    );
    Ok(reports)
}
