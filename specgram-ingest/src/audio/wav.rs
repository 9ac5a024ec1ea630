//! WAV file stream
//!
//! Adapter exposing a WAV file through [`AudioStream`]. Samples are read lazily
//! from the file as the engine asks for frames.

use super::stream::{check_buffer, AudioStream};
use crate::error::{Result, SpectroError};
use hound::{WavReader, WavSpec};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// WAV-backed audio stream
pub struct WavStream {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    total_frames: u64,
}

impl WavStream {
    /// Open a WAV file and read its header
    pub fn open(path: &Path) -> std::result::Result<Self, hound::Error> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let total_frames = reader.duration() as u64;

        tracing::debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            bits_per_sample = spec.bits_per_sample,
            channels = spec.channels,
            total_frames,
            "Opened WAV stream"
        );

        Ok(Self {
            reader,
            spec,
            total_frames,
        })
    }

    /// WAV header
    pub fn spec(&self) -> WavSpec {
        self.spec
    }
}

impl AudioStream for WavStream {
    fn bit_depth(&self) -> u16 {
        self.spec.bits_per_sample
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn channels(&self) -> u16 {
        self.spec.channels
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn read_frames(&mut self, buf: &mut [i32], frames: usize) -> Result<usize> {
        let channels = self.spec.channels as usize;
        if channels == 0 {
            return Ok(0);
        }
        check_buffer(buf, frames, channels)?;

        let wanted = frames * channels;
        let mut count = 0;
        let mut samples = self.reader.samples::<i32>();
        while count < wanted {
            match samples.next() {
                Some(Ok(sample)) => {
                    buf[count] = sample;
                    count += 1;
                }
                Some(Err(e)) => return Err(SpectroError::StreamRead(e.to_string())),
                None => break,
            }
        }

        // A truncated trailing frame is dropped
        Ok(count / channels)
    }
}
