//! Logging initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt layer.
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse a configured log level name
pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim())
        .map_err(|_| Error::InvalidInput(format!("Unknown log level '{}'", level)))
}

/// Initialize global logging from configuration
///
/// Logs go to `config.file` when set (appending, no ANSI colors), otherwise to
/// stderr. Calling this more than once is harmless: later calls leave the
/// first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = if file_layer.is_none() {
        Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    } else {
        None
    };

    // Already initialized elsewhere (tests, embedding application)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" WARN ").unwrap(), Level::WARN);
        assert!(matches!(parse_level("loud"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_init_logging_twice_is_ok() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_init_logging_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert!(init_logging(&config).is_err());
    }
}
