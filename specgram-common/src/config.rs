//! Configuration loading and resolution
//!
//! Configuration is a single TOML file. Every field has a built-in default, so a
//! missing file (or a missing section) never prevents startup.
//!
//! # Resolution priority
//!
//! 1. Explicit path supplied by the caller
//! 2. `SPECGRAM_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/specgram/config.toml` on Linux)
//! 4. Built-in defaults
//!
//! The required sample rate and bit depth are not configurable and do not
//! appear here.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "SPECGRAM_CONFIG";

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Spectrogram engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Artifact cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Parallel batch settings
    #[serde(default)]
    pub batch: BatchSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine settings
///
/// Policy names are kept as strings here and parsed by the engine crate, so an
/// unknown name is reported against the engine's own vocabulary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Clip duration in seconds
    #[serde(default = "default_clip_seconds")]
    pub clip_seconds: u32,

    /// FFT frame size in samples (power of two)
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Stereo downmix policy name
    #[serde(default = "default_downmix")]
    pub downmix: String,

    /// Window policy name
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            clip_seconds: default_clip_seconds(),
            frame_size: default_frame_size(),
            downmix: default_downmix(),
            window: default_window(),
        }
    }
}

/// Artifact cache settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Clip strategy name (start, middle, end)
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Pixel packing of persisted artifacts (rgba, rgb)
    #[serde(default = "default_packing")]
    pub packing: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            packing: default_packing(),
        }
    }
}

/// Parallel batch settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchSettings {
    /// Worker threads (0 = one per available core)
    #[serde(default)]
    pub workers: usize,

    /// Stop starting new assets after the first failure
    #[serde(default)]
    pub fail_fast: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_clip_seconds() -> u32 {
    120
}

fn default_frame_size() -> usize {
    8192
}

fn default_downmix() -> String {
    "channel0-plus-half-channel1".to_string()
}

fn default_window() -> String {
    "skip-first-sample".to_string()
}

fn default_strategy() -> String {
    "middle".to_string()
}

fn default_packing() -> String {
    "rgba".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("specgram").join("config.toml"))
}

/// Resolve which configuration file to read, if any
///
/// Returns the first candidate by priority. The returned path may not exist;
/// [`load_config`] treats a missing file as "use defaults".
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Load configuration following the resolution priority
///
/// A missing file logs a warning and yields defaults. A file that exists but
/// cannot be read or parsed is a configuration error.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("No configuration directory available, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file not found: {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    load_config_file(&path)
}

/// Load and parse a specific configuration file
pub fn load_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Write configuration atomically
///
/// Serializes into `<path>.tmp` and renames over the target, so readers see
/// either the old file or the new one, never a partial write.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = std::fs::write(&temp_path, content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!("Configuration written to {}", path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
