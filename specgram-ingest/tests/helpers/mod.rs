//! Test Helper Utilities
//!
//! Shared utilities for testing specgram-ingest

#![allow(dead_code)]

pub mod audio_generator;
pub mod log_capture;

pub use audio_generator::{generate_test_library, generate_test_wav, AudioConfig, Signal};
pub use log_capture::{capture_logs, LogCapture};
