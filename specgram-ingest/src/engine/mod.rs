//! Spectrogram engine
//!
//! Turns an [`AudioStream`] into a fixed-shape [`SpectrogramMatrix`]:
//!
//! 1. Validate bit depth and sample rate (before any read)
//! 2. Skip to the clip selected by the [`ClipStrategy`]
//! 3. Per analysis frame: downmix, window, forward FFT, keep `|X|²` of the
//!    highest eighth of bins
//!
//! Analysis frames do not overlap. The matrix has `frames_per_clip` rows and
//! `frame_size / 8` columns regardless of input length.

pub mod dsp;
pub mod matrix;

pub use dsp::{DownmixPolicy, WindowPolicy};
pub use matrix::SpectrogramMatrix;

use crate::audio::{AudioStream, StreamFormat};
use crate::error::{Result, SpectroError};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Which part of the recording becomes the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStrategy {
    /// From the first frame
    Start,
    /// Centered on the middle frame
    Middle,
    /// The trailing clip, read until end-of-stream
    End,
}

impl FromStr for ClipStrategy {
    type Err = SpectroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ClipStrategy::Start),
            "middle" => Ok(ClipStrategy::Middle),
            "end" => Ok(ClipStrategy::End),
            other => Err(SpectroError::InvalidConfig(format!(
                "unknown clip strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ClipStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipStrategy::Start => "start",
            ClipStrategy::Middle => "middle",
            ClipStrategy::End => "end",
        };
        f.write_str(name)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clip duration in seconds
    pub clip_seconds: u32,
    /// FFT frame size in samples (power of two, at least 8)
    pub frame_size: usize,
    pub downmix: DownmixPolicy,
    pub window: WindowPolicy,
    /// Required stream format; fixed, never read from configuration files
    #[serde(skip)]
    pub format: StreamFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clip_seconds: 120,
            frame_size: 8192,
            downmix: DownmixPolicy::default(),
            window: WindowPolicy::default(),
            format: StreamFormat::REQUIRED,
        }
    }
}

impl EngineConfig {
    /// Config with the given clip length and frame size, default policies
    pub fn new(clip_seconds: u32, frame_size: usize) -> Self {
        Self {
            clip_seconds,
            frame_size,
            ..Self::default()
        }
    }

    /// Analysis frames per clip: `clip_seconds * (sample_rate / frame_size)`
    pub fn frames_per_clip(&self) -> usize {
        self.clip_seconds as usize * (self.format.sample_rate as usize / self.frame_size.max(1))
    }

    /// Audio frames per clip: `clip_seconds * sample_rate`
    pub fn clip_frames(&self) -> u64 {
        self.clip_seconds as u64 * self.format.sample_rate as u64
    }

    fn validate(&self) -> Result<()> {
        if self.frame_size < 8 || !self.frame_size.is_power_of_two() {
            return Err(SpectroError::InvalidConfig(format!(
                "frame size {} is not a power of two >= 8",
                self.frame_size
            )));
        }
        if self.clip_seconds == 0 {
            return Err(SpectroError::InvalidConfig(
                "clip duration must be at least one second".to_string(),
            ));
        }
        if self.frames_per_clip() == 0 {
            return Err(SpectroError::InvalidConfig(format!(
                "frame size {} exceeds sample rate {}",
                self.frame_size, self.format.sample_rate
            )));
        }
        Ok(())
    }
}

/// Anything that can turn a stream into a spectrogram matrix
///
/// The loader is generic over this so it can be driven by wrappers (counting,
/// caching, instrumentation) around [`SpectrogramEngine`].
pub trait SpectrogramTransform: Send + Sync {
    fn convert_to_spectrogram(
        &self,
        stream: &mut dyn AudioStream,
        strategy: ClipStrategy,
    ) -> Result<SpectrogramMatrix>;
}

impl<T: SpectrogramTransform + ?Sized> SpectrogramTransform for Arc<T> {
    fn convert_to_spectrogram(
        &self,
        stream: &mut dyn AudioStream,
        strategy: ClipStrategy,
    ) -> Result<SpectrogramMatrix> {
        (**self).convert_to_spectrogram(stream, strategy)
    }
}

/// Counters from one conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Audio frames read from the stream, skipped ones included
    pub frames_consumed: u64,
    /// Audio frame offset of the first accepted analysis frame
    pub clip_offset: u64,
    /// Analysis frames written into the matrix
    pub rows_written: usize,
    /// Accepted analysis frames discarded because the matrix was full
    pub frames_dropped: usize,
}

/// Range of audio frames a strategy accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClipWindow {
    /// Frames to skip before the first accepted frame
    skip: u64,
    /// Stop once this many frames have been consumed; `None` reads to the end
    limit: Option<u64>,
}

/// FFT spectrogram engine
///
/// Configuration, window coefficients and the FFT plan are fixed at
/// construction. Each conversion allocates its own buffers, so one engine can
/// serve many threads.
#[derive(Clone)]
pub struct SpectrogramEngine {
    config: EngineConfig,
    window: Arc<[f64]>,
    fft: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for SpectrogramEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrogramEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpectrogramEngine {
    /// Build an engine, validating the configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(config.frame_size);
        let window = config.window.coefficients(config.frame_size).into();

        debug!(
            clip_seconds = config.clip_seconds,
            frame_size = config.frame_size,
            frames_per_clip = config.frames_per_clip(),
            "Spectrogram engine configured"
        );

        Ok(Self {
            config,
            window,
            fft,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time-axis length of every matrix (rows)
    pub fn matrix_width(&self) -> usize {
        self.config.frames_per_clip()
    }

    /// Frequency-axis length of every matrix (columns)
    pub fn matrix_height(&self) -> usize {
        self.config.frame_size / 8
    }

    /// First FFT bin kept
    fn band_start(&self) -> usize {
        (self.config.frame_size / 8) * 7
    }

    fn clip_window(&self, strategy: ClipStrategy, total_frames: u64) -> ClipWindow {
        let clip_frames = self.config.clip_frames();
        let accepted = (self.matrix_width() * self.config.frame_size) as u64;
        match strategy {
            ClipStrategy::Start => ClipWindow {
                skip: 0,
                limit: Some(accepted),
            },
            ClipStrategy::Middle => {
                let skip = (total_frames / 2).saturating_sub(clip_frames / 2);
                ClipWindow {
                    skip,
                    limit: Some(skip + accepted),
                }
            }
            ClipStrategy::End => ClipWindow {
                skip: total_frames.saturating_sub(clip_frames),
                limit: None,
            },
        }
    }

    /// Convert a stream into a spectrogram
    ///
    /// Fails with `FormatMismatch` before reading if the stream's bit depth or
    /// sample rate differs from the configured format. Running out of audio is
    /// not an error: unfilled rows stay zero.
    pub fn convert_to_spectrogram<S: AudioStream + ?Sized>(
        &self,
        stream: &mut S,
        strategy: ClipStrategy,
    ) -> Result<SpectrogramMatrix> {
        self.convert_with_stats(stream, strategy)
            .map(|(matrix, _)| matrix)
    }

    /// [`convert_to_spectrogram`](Self::convert_to_spectrogram) plus counters
    pub fn convert_with_stats<S: AudioStream + ?Sized>(
        &self,
        stream: &mut S,
        strategy: ClipStrategy,
    ) -> Result<(SpectrogramMatrix, ConversionStats)> {
        let started = Instant::now();
        self.config.format.check(stream)?;

        let channels = stream.channels() as usize;
        if channels == 0 {
            return Err(SpectroError::InvalidStream(
                "stream reports zero channels".to_string(),
            ));
        }

        let frame_size = self.config.frame_size;
        let clip = self.clip_window(strategy, stream.total_frames());

        let mut interleaved = vec![0i32; frame_size * channels];
        let mut mono = vec![0.0f64; frame_size];
        let mut spectrum = vec![Complex::new(0.0f64, 0.0); frame_size];
        let mut scratch = vec![Complex::new(0.0f64, 0.0); self.fft.get_inplace_scratch_len()];
        let mut band = vec![0.0f64; self.matrix_height()];

        let mut matrix = SpectrogramMatrix::new(self.matrix_width(), self.matrix_height());
        let mut stats = ConversionStats {
            clip_offset: clip.skip,
            ..ConversionStats::default()
        };

        loop {
            if clip.limit.is_some_and(|limit| stats.frames_consumed >= limit) {
                break;
            }

            if stats.frames_consumed < clip.skip {
                let wanted = (clip.skip - stats.frames_consumed).min(frame_size as u64) as usize;
                let read = read_full(stream, &mut interleaved, wanted, channels)?;
                if read == 0 {
                    break;
                }
                stats.frames_consumed += read as u64;
                continue;
            }

            let read = read_full(stream, &mut interleaved, frame_size, channels)?;
            if read == 0 {
                break;
            }
            stats.frames_consumed += read as u64;

            let row = stats.rows_written;
            if row >= matrix.rows() {
                stats.frames_dropped += 1;
                continue;
            }

            // Short final frame
            interleaved[read * channels..].fill(0);

            self.config.downmix.downmix(&interleaved, channels, &mut mono);
            dsp::apply_window(&mut mono, &self.window);
            for (c, &s) in spectrum.iter_mut().zip(&mono) {
                *c = Complex::new(s, 0.0);
            }
            self.fft.process_with_scratch(&mut spectrum, &mut scratch);

            for (out, c) in band.iter_mut().zip(&spectrum[self.band_start()..]) {
                *out = c.re * c.re + c.im * c.im;
            }
            matrix.write_row(row, &band)?;
            stats.rows_written += 1;
        }

        debug!(
            strategy = %strategy,
            frames_consumed = stats.frames_consumed,
            clip_offset = stats.clip_offset,
            rows_written = stats.rows_written,
            frames_dropped = stats.frames_dropped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "FFT done"
        );

        Ok((matrix, stats))
    }
}

impl SpectrogramTransform for SpectrogramEngine {
    fn convert_to_spectrogram(
        &self,
        stream: &mut dyn AudioStream,
        strategy: ClipStrategy,
    ) -> Result<SpectrogramMatrix> {
        SpectrogramEngine::convert_to_spectrogram(self, stream, strategy)
    }
}

/// Read until `frames` frames are buffered or the stream is exhausted
fn read_full<S: AudioStream + ?Sized>(
    stream: &mut S,
    buf: &mut [i32],
    frames: usize,
    channels: usize,
) -> Result<usize> {
    let mut filled = 0;
    while filled < frames {
        let read = stream.read_frames(&mut buf[filled * channels..], frames - filled)?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryStream;

    fn small_engine(clip_seconds: u32) -> SpectrogramEngine {
        // 1 s clip, 4096-sample frames: 10 analysis frames per clip
        SpectrogramEngine::new(EngineConfig::new(clip_seconds, 4096)).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let engine = SpectrogramEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.matrix_width(), 600);
        assert_eq!(engine.matrix_height(), 1024);
        assert_eq!(engine.band_start(), 7168);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(SpectrogramEngine::new(EngineConfig::new(1, 1000)).is_err());
        assert!(SpectrogramEngine::new(EngineConfig::new(0, 4096)).is_err());
        assert!(SpectrogramEngine::new(EngineConfig::new(1, 4)).is_err());
        assert!(SpectrogramEngine::new(EngineConfig::new(1, 65536)).is_err());
    }

    #[test]
    fn test_format_mismatch_reads_nothing() {
        let engine = small_engine(1);
        let mut stream = MemoryStream::mono(vec![0; 44100]).with_format(StreamFormat {
            bit_depth: 24,
            sample_rate: 44100,
        });
        let err = engine
            .convert_to_spectrogram(&mut stream, ClipStrategy::Start)
            .unwrap_err();
        assert!(err.is_format_mismatch());
        assert_eq!(stream.read_calls(), 0);
    }

    #[test]
    fn test_zero_channels_is_invalid_stream() {
        let engine = small_engine(1);
        let mut stream = MemoryStream::new(vec![], 0);
        assert!(matches!(
            engine.convert_to_spectrogram(&mut stream, ClipStrategy::Start),
            Err(SpectroError::InvalidStream(_))
        ));
    }

    #[test]
    fn test_clip_windows() {
        let engine = small_engine(1);
        let accepted = 10 * 4096;

        assert_eq!(
            engine.clip_window(ClipStrategy::Start, 1_000_000),
            ClipWindow {
                skip: 0,
                limit: Some(accepted)
            }
        );
        assert_eq!(
            engine.clip_window(ClipStrategy::Middle, 1_000_000),
            ClipWindow {
                skip: 500_000 - 22050,
                limit: Some(500_000 - 22050 + accepted)
            }
        );
        assert_eq!(
            engine.clip_window(ClipStrategy::End, 1_000_000),
            ClipWindow {
                skip: 1_000_000 - 44100,
                limit: None
            }
        );
    }

    #[test]
    fn test_short_stream_clamps_offsets() {
        let engine = small_engine(1);
        assert_eq!(engine.clip_window(ClipStrategy::Middle, 1000).skip, 0);
        assert_eq!(engine.clip_window(ClipStrategy::End, 1000).skip, 0);
    }

    #[test]
    fn test_sine_energy_lands_in_kept_band() {
        let engine = small_engine(1);
        let frame_size = 4096;
        // Bin 3800 of 4096 sits in the kept band [3584, 4096)
        let bin = 3800.0;
        let samples: Vec<i32> = (0..frame_size * 10)
            .map(|n| {
                let phase = 2.0 * std::f64::consts::PI * bin * n as f64 / frame_size as f64;
                (10_000.0 * phase.cos()) as i32
            })
            .collect();

        let mut stream = MemoryStream::mono(samples);
        let matrix = engine
            .convert_to_spectrogram(&mut stream, ClipStrategy::Start)
            .unwrap();

        let row = matrix.row(0).unwrap();
        let (peak_col, _) = row
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak_col, 3800 - 3584);
    }
}
