//! Audio Test Fixture Generator
//!
//! Writes WAV files with known content for loader and batch tests

use std::path::{Path, PathBuf};

/// Sample content of a generated file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Digital silence
    Silence,
    /// Sine at `frequency` Hz, 30% amplitude
    Tone { frequency: f64 },
    /// Same value on every sample
    Constant(i16),
}

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub signal: Signal,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
            signal: Signal::Tone { frequency: 1_000.0 },
        }
    }
}

/// Generate a test WAV file with specified configuration
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: config.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_frames = (config.duration_seconds * config.sample_rate as f64) as usize;
    let full_scale = ((1i64 << (config.bits_per_sample - 1)) - 1) as f64;

    for i in 0..total_frames {
        let sample = match config.signal {
            Signal::Silence => 0,
            Signal::Constant(value) => value as i32,
            Signal::Tone { frequency } => {
                let t = i as f64 / config.sample_rate as f64;
                (0.3 * (2.0 * std::f64::consts::PI * frequency * t).sin() * full_scale) as i32
            }
        };

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Generate `count` files named `track_001.wav`, `track_002.wav`, ... in `dir`
pub fn generate_test_library(
    dir: &Path,
    count: usize,
    config: &AudioConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for i in 0..count {
        let file_path = dir.join(format!("track_{:03}.wav", i + 1));
        generate_test_wav(&file_path, config)?;
        files.push(file_path);
    }

    Ok(files)
}
