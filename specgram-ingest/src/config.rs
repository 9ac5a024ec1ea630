//! Typed configuration for the ingest crate
//!
//! Converts the string-typed [`TomlConfig`] sections into engine, loader and
//! batch settings, rejecting unknown policy names.

use crate::artifact::PixelPacking;
use crate::engine::{ClipStrategy, EngineConfig};
use crate::error::Result;
use crate::loader::LoaderOptions;
use crate::services::BatchOptions;
use specgram_common::config::{self, TomlConfig};
use std::path::Path;

/// Everything needed to build an engine, a loader and a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    pub engine: EngineConfig,
    pub strategy: ClipStrategy,
    pub loader: LoaderOptions,
    pub batch: BatchOptions,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            strategy: ClipStrategy::Middle,
            loader: LoaderOptions::default(),
            batch: BatchOptions::default(),
        }
    }
}

impl IngestConfig {
    /// Parse policy names from a loaded TOML configuration
    ///
    /// # Errors
    /// `InvalidConfig` for an unknown strategy, packing, downmix or window
    /// name. Numeric engine settings are validated when the engine is built.
    pub fn from_toml(toml: &TomlConfig) -> Result<Self> {
        let engine = EngineConfig {
            clip_seconds: toml.engine.clip_seconds,
            frame_size: toml.engine.frame_size,
            downmix: toml.engine.downmix.parse()?,
            window: toml.engine.window.parse()?,
            ..EngineConfig::default()
        };
        let packing: PixelPacking = toml.cache.packing.parse()?;

        Ok(Self {
            engine,
            strategy: toml.cache.strategy.parse()?,
            loader: LoaderOptions { packing },
            batch: BatchOptions::from(&toml.batch),
        })
    }

    /// Resolve, load and parse the configuration file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let toml = config::load_config(explicit)?;
        Self::from_toml(&toml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DownmixPolicy, WindowPolicy};
    use crate::error::SpectroError;
    use crate::services::FailurePolicy;

    #[test]
    fn test_defaults_match_builtin() {
        let config = IngestConfig::from_toml(&TomlConfig::default()).unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn test_parses_policies() {
        let toml: TomlConfig = toml_from(
            r#"
            [engine]
            clip_seconds = 30
            frame_size = 4096
            downmix = "average"
            window = "hann"

            [cache]
            strategy = "end"
            packing = "rgb"

            [batch]
            workers = 2
            fail_fast = true
            "#,
        );

        let config = IngestConfig::from_toml(&toml).unwrap();
        assert_eq!(config.engine.clip_seconds, 30);
        assert_eq!(config.engine.frame_size, 4096);
        assert_eq!(config.engine.downmix, DownmixPolicy::Average);
        assert_eq!(config.engine.window, WindowPolicy::Hann);
        assert_eq!(config.strategy, ClipStrategy::End);
        assert_eq!(config.loader.packing, PixelPacking::Rgb);
        assert_eq!(config.batch.workers, 2);
        assert_eq!(config.batch.policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let mut toml = TomlConfig::default();
        toml.cache.strategy = "random".to_string();
        assert!(matches!(
            IngestConfig::from_toml(&toml),
            Err(SpectroError::InvalidConfig(_))
        ));
    }

    fn toml_from(text: &str) -> TomlConfig {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, text).unwrap();
        config::load_config_file(&path).unwrap()
    }
}
