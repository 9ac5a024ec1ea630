//! # Specgram Common Library
//!
//! Shared code for the specgram workspace:
//! - Error types
//! - TOML configuration loading and atomic write-back
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
