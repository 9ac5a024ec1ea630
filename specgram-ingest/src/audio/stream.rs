//! Audio stream abstraction
//!
//! The engine never decodes containers itself. It consumes any source that
//! exposes decoded, interleaved integer PCM through [`AudioStream`].

use crate::error::{Result, SpectroError};
use serde::{Deserialize, Serialize};

/// Decoded PCM source
///
/// Samples are interleaved: frame `i` of a two-channel stream occupies
/// `buf[2 * i]` (channel 0) and `buf[2 * i + 1]` (channel 1).
pub trait AudioStream {
    /// Valid bits per sample
    fn bit_depth(&self) -> u16;

    /// Frames per second
    fn sample_rate(&self) -> u32;

    /// Channels per frame
    fn channels(&self) -> u16;

    /// Total frames in the stream
    fn total_frames(&self) -> u64;

    /// Read up to `frames` frames into `buf`
    ///
    /// `buf` must hold at least `frames * channels` samples. Returns the number
    /// of whole frames read; `0` signals end-of-stream.
    fn read_frames(&mut self, buf: &mut [i32], frames: usize) -> Result<usize>;
}

/// Bit depth and sample rate a stream must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub bit_depth: u16,
    pub sample_rate: u32,
}

impl StreamFormat {
    /// 16-bit, 44100 Hz
    pub const REQUIRED: StreamFormat = StreamFormat {
        bit_depth: 16,
        sample_rate: 44100,
    };

    /// Format reported by a stream
    pub fn of<S: AudioStream + ?Sized>(stream: &S) -> Self {
        Self {
            bit_depth: stream.bit_depth(),
            sample_rate: stream.sample_rate(),
        }
    }

    /// Fail with `FormatMismatch` unless `stream` reports exactly this format
    pub fn check<S: AudioStream + ?Sized>(&self, stream: &S) -> Result<()> {
        let actual = Self::of(stream);
        if actual == *self {
            return Ok(());
        }
        Err(SpectroError::FormatMismatch {
            bit_depth: actual.bit_depth,
            sample_rate: actual.sample_rate,
            expected_bit_depth: self.bit_depth,
            expected_sample_rate: self.sample_rate,
        })
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self::REQUIRED
    }
}

/// Check `buf` can hold `frames` frames of `channels` samples
pub(crate) fn check_buffer(buf: &[i32], frames: usize, channels: usize) -> Result<()> {
    let needed = frames.saturating_mul(channels);
    if buf.len() < needed {
        return Err(SpectroError::StreamRead(format!(
            "buffer holds {} samples, {} frames x {} channels requested",
            buf.len(),
            frames,
            channels
        )));
    }
    Ok(())
}

/// In-memory stream over interleaved samples
///
/// Counts the frames handed out so callers can verify how much of a stream
/// was consumed.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    samples: Vec<i32>,
    channels: u16,
    format: StreamFormat,
    position: usize,
    read_calls: usize,
}

impl MemoryStream {
    /// Create a stream in the required format
    pub fn new(samples: Vec<i32>, channels: u16) -> Self {
        Self {
            samples,
            channels,
            format: StreamFormat::REQUIRED,
            position: 0,
            read_calls: 0,
        }
    }

    /// Mono stream from samples
    pub fn mono(samples: Vec<i32>) -> Self {
        Self::new(samples, 1)
    }

    /// Interleave equally long channel buffers into one stream
    pub fn from_channels(channels: &[Vec<i32>]) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels.len());
        for i in 0..frames {
            for channel in channels {
                samples.push(channel[i]);
            }
        }
        Self::new(samples, channels.len() as u16)
    }

    /// Report a different bit depth / sample rate
    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }

    /// Frames handed out so far
    pub fn frames_consumed(&self) -> u64 {
        self.position as u64
    }

    /// Number of `read_frames` calls so far
    pub fn read_calls(&self) -> usize {
        self.read_calls
    }
}

impl AudioStream for MemoryStream {
    fn bit_depth(&self) -> u16 {
        self.format.bit_depth
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        match self.channels {
            0 => 0,
            ch => (self.samples.len() / ch as usize) as u64,
        }
    }

    fn read_frames(&mut self, buf: &mut [i32], frames: usize) -> Result<usize> {
        self.read_calls += 1;
        let channels = self.channels as usize;
        if channels == 0 {
            return Ok(0);
        }
        check_buffer(buf, frames, channels)?;

        let remaining = self.total_frames() as usize - self.position;
        let count = frames.min(remaining);
        let start = self.position * channels;
        let end = start + count * channels;
        buf[..count * channels].copy_from_slice(&self.samples[start..end]);
        self.position += count;
        Ok(count)
    }
}
