//! Parallel conversion of a whole directory
//!
//! The inventory is built by the loader before any work starts. Assets are
//! then resolved on a bounded rayon pool; each writes only its own artifact
//! path, so workers share nothing but the read-only resolver and the counters.
//! Outcomes are fanned in over a channel and reported in key order.

use crate::engine::SpectrogramTransform;
use crate::error::{Result, SpectroError};
use crate::loader::{AssetJob, LoadedSpectrogram, SpectrogramLoader};
use rayon::prelude::*;
use specgram_common::config::BatchSettings;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to do with the remaining assets after a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop starting new assets after the first failure
    FailFast,
    /// Attempt every asset
    #[default]
    BestEffort,
}

/// Batch settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; 0 uses rayon's default
    pub workers: usize,
    pub policy: FailurePolicy,
}

impl From<&BatchSettings> for BatchOptions {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            workers: settings.workers,
            policy: if settings.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::BestEffort
            },
        }
    }
}

/// Result for one asset
#[derive(Debug)]
pub enum AssetOutcome {
    Loaded(LoadedSpectrogram),
    Failed { key: String, error: SpectroError },
    /// Not attempted because an earlier asset failed under `FailFast`
    Skipped { key: String },
}

impl AssetOutcome {
    pub fn key(&self) -> &str {
        match self {
            AssetOutcome::Loaded(loaded) => &loaded.key,
            AssetOutcome::Failed { key, .. } | AssetOutcome::Skipped { key } => key,
        }
    }
}

/// Outcomes of a batch, sorted by key
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<AssetOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Loaded(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&AssetOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    /// First failure in key order
    pub fn first_error(&self) -> Option<&SpectroError> {
        self.outcomes.iter().find_map(|o| match o {
            AssetOutcome::Failed { error, .. } => Some(error),
            _ => None,
        })
    }

    /// Loaded spectrograms, or the first failure in key order
    pub fn into_result(self) -> Result<Vec<LoadedSpectrogram>> {
        let mut loaded = Vec::with_capacity(self.outcomes.len());
        for outcome in self.outcomes {
            match outcome {
                AssetOutcome::Loaded(l) => loaded.push(l),
                AssetOutcome::Failed { error, .. } => return Err(error),
                AssetOutcome::Skipped { .. } => {}
            }
        }
        Ok(loaded)
    }
}

/// Resolves every pending asset of a loader in parallel
pub struct BatchConverter<T> {
    loader: SpectrogramLoader<T>,
    options: BatchOptions,
}

impl<T: SpectrogramTransform> BatchConverter<T> {
    pub fn new(loader: SpectrogramLoader<T>, options: BatchOptions) -> Self {
        Self { loader, options }
    }

    /// Process every asset on a dedicated pool
    ///
    /// # Errors
    /// Only `Worker` if the pool cannot be built. Per-asset failures are
    /// reported in the [`BatchReport`].
    pub fn run(self) -> Result<BatchReport> {
        let started = Instant::now();
        let options = self.options;
        let (resolver, jobs) = self.loader.into_parts();
        let total = jobs.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| SpectroError::Worker(e.to_string()))?;

        info!(
            assets = total,
            workers = pool.current_num_threads(),
            policy = ?options.policy,
            "Starting batch conversion"
        );

        let abort = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let (tx, rx) = mpsc::channel::<AssetOutcome>();

        pool.install(|| {
            jobs.into_par_iter().for_each_with(tx, |tx, job: AssetJob| {
                if options.policy == FailurePolicy::FailFast && abort.load(Ordering::Relaxed) {
                    let _ = tx.send(AssetOutcome::Skipped { key: job.key });
                    return;
                }

                let outcome = match resolver.resolve(&job) {
                    Ok(loaded) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                        AssetOutcome::Loaded(loaded)
                    }
                    Err(error) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        warn!(key = %job.key, error = %error, "Asset failed");
                        if options.policy == FailurePolicy::FailFast {
                            abort.store(true, Ordering::Relaxed);
                        }
                        AssetOutcome::Failed {
                            key: job.key,
                            error,
                        }
                    }
                };

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 100 == 0 {
                    debug!("Processed {}/{}", done, total);
                }
                let _ = tx.send(outcome);
            });
        });

        // All senders are gone once the pool returns
        let mut outcomes: Vec<AssetOutcome> = rx.into_iter().collect();
        outcomes.sort_by(|a, b| a.key().cmp(b.key()));

        let report = BatchReport { outcomes };
        info!(
            total = total,
            processed = processed.load(Ordering::Relaxed),
            succeeded = succeeded.load(Ordering::Relaxed),
            failed = failed.load(Ordering::Relaxed),
            skipped = report.skipped(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch conversion completed"
        );
        Ok(report)
    }
}

impl<T: SpectrogramTransform + 'static> BatchConverter<T> {
    /// [`run`](Self::run) on tokio's blocking pool
    pub async fn run_async(self) -> Result<BatchReport> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .map_err(|e| SpectroError::Worker(format!("batch task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_settings() {
        let settings = BatchSettings {
            workers: 3,
            fail_fast: true,
        };
        assert_eq!(
            BatchOptions::from(&settings),
            BatchOptions {
                workers: 3,
                policy: FailurePolicy::FailFast
            }
        );
        assert_eq!(
            BatchOptions::from(&BatchSettings::default()).policy,
            FailurePolicy::BestEffort
        );
    }

    #[test]
    fn test_report_counts_and_result() {
        let report = BatchReport {
            outcomes: vec![
                AssetOutcome::Failed {
                    key: "a".into(),
                    error: SpectroError::Worker("boom".into()),
                },
                AssetOutcome::Skipped { key: "b".into() },
            ],
        };
        assert_eq!((report.succeeded(), report.failed(), report.skipped()), (0, 1, 1));
        assert!(report.first_error().is_some());
        assert!(matches!(report.into_result(), Err(SpectroError::Worker(_))));
    }

    #[test]
    fn test_skipped_only_is_ok() {
        let report = BatchReport {
            outcomes: vec![AssetOutcome::Skipped { key: "b".into() }],
        };
        assert!(report.into_result().unwrap().is_empty());
    }
}
