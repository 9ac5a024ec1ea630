//! Per-frame signal shaping: downmix and window
//!
//! The default policies reproduce the numeric behavior existing artifacts were
//! built with. The alternatives are the textbook forms.

use crate::error::SpectroError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// How interleaved multi-channel frames become one mono sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownmixPolicy {
    /// `ch0 + ch1 / 2` with integer division; channels past 1 are ignored
    #[default]
    #[serde(rename = "channel0-plus-half-channel1")]
    ChannelZeroPlusHalfChannelOne,

    /// Mean of all channels
    #[serde(rename = "average")]
    Average,
}

impl DownmixPolicy {
    /// Downmix `out.len()` frames from `interleaved` into `out`
    pub fn downmix(&self, interleaved: &[i32], channels: usize, out: &mut [f64]) {
        if channels <= 1 {
            for (o, &s) in out.iter_mut().zip(interleaved) {
                *o = s as f64;
            }
            return;
        }

        for (o, frame) in out.iter_mut().zip(interleaved.chunks_exact(channels)) {
            *o = match self {
                DownmixPolicy::ChannelZeroPlusHalfChannelOne => {
                    (frame[0] as i64 + frame[1] as i64 / 2) as f64
                }
                DownmixPolicy::Average => {
                    frame.iter().map(|&s| s as f64).sum::<f64>() / channels as f64
                }
            };
        }
    }
}

impl FromStr for DownmixPolicy {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel0-plus-half-channel1" => Ok(DownmixPolicy::ChannelZeroPlusHalfChannelOne),
            "average" => Ok(DownmixPolicy::Average),
            other => Err(SpectroError::InvalidConfig(format!(
                "unknown downmix policy '{}'",
                other
            ))),
        }
    }
}

/// Window applied to each analysis frame before the FFT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPolicy {
    /// Hann coefficients for indices `1..N`; index 0 is left unscaled
    #[default]
    #[serde(rename = "skip-first-sample")]
    SkipFirstSample,

    /// Hann coefficients for every index
    #[serde(rename = "hann")]
    Hann,
}

impl WindowPolicy {
    /// Window coefficients for a frame of `size` samples
    ///
    /// Frames shorter than two samples are left unscaled.
    pub fn coefficients(&self, size: usize) -> Vec<f64> {
        if size < 2 {
            return vec![1.0; size];
        }
        let denominator = (size - 1) as f64;
        (0..size)
            .map(|n| {
                if n == 0 && *self == WindowPolicy::SkipFirstSample {
                    1.0
                } else {
                    0.5 * (1.0 - (2.0 * PI * n as f64 / denominator).cos())
                }
            })
            .collect()
    }
}

impl FromStr for WindowPolicy {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip-first-sample" => Ok(WindowPolicy::SkipFirstSample),
            "hann" => Ok(WindowPolicy::Hann),
            other => Err(SpectroError::InvalidConfig(format!(
                "unknown window policy '{}'",
                other
            ))),
        }
    }
}

/// Multiply `samples` by `coefficients` in place
pub fn apply_window(samples: &mut [f64], coefficients: &[f64]) {
    for (s, &w) in samples.iter_mut().zip(coefficients) {
        *s *= w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_downmix_does_not_average() {
        let interleaved = vec![100, 50, 100, 50];
        let mut out = vec![0.0; 2];
        DownmixPolicy::ChannelZeroPlusHalfChannelOne.downmix(&interleaved, 2, &mut out);
        assert_eq!(out, vec![125.0, 125.0]);
    }

    #[test]
    fn test_legacy_downmix_truncates_toward_zero() {
        let interleaved = vec![0, 51, 0, -51];
        let mut out = vec![0.0; 2];
        DownmixPolicy::ChannelZeroPlusHalfChannelOne.downmix(&interleaved, 2, &mut out);
        assert_eq!(out, vec![25.0, -25.0]);
    }

    #[test]
    fn test_legacy_downmix_ignores_extra_channels() {
        let interleaved = vec![10, 20, 1000];
        let mut out = vec![0.0; 1];
        DownmixPolicy::ChannelZeroPlusHalfChannelOne.downmix(&interleaved, 3, &mut out);
        assert_eq!(out, vec![20.0]);
    }

    #[test]
    fn test_average_downmix() {
        let interleaved = vec![100, 50];
        let mut out = vec![0.0; 1];
        DownmixPolicy::Average.downmix(&interleaved, 2, &mut out);
        assert_eq!(out, vec![75.0]);
    }

    #[test]
    fn test_mono_passes_through() {
        let mut out = vec![0.0; 3];
        DownmixPolicy::default().downmix(&[7, -8, 9], 1, &mut out);
        assert_eq!(out, vec![7.0, -8.0, 9.0]);
    }

    #[test]
    fn test_skip_first_sample_window() {
        let w = WindowPolicy::SkipFirstSample.coefficients(8);
        assert_eq!(w[0], 1.0);
        // Last index completes the cosine period
        assert!(w[7].abs() < 1e-12);
        let expected = 0.5 * (1.0 - (2.0 * PI * 3.0 / 7.0).cos());
        assert!((w[3] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_hann_window_scales_first_sample() {
        let w = WindowPolicy::Hann.coefficients(8);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[1..], WindowPolicy::SkipFirstSample.coefficients(8)[1..]);
    }

    #[test]
    fn test_degenerate_window_sizes() {
        for policy in [WindowPolicy::SkipFirstSample, WindowPolicy::Hann] {
            assert!(policy.coefficients(0).is_empty());
            assert_eq!(policy.coefficients(1), vec![1.0]);
        }
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(
            "Average".parse::<DownmixPolicy>().unwrap(),
            DownmixPolicy::Average
        );
        assert_eq!("hann".parse::<WindowPolicy>().unwrap(), WindowPolicy::Hann);
        assert!("triangle".parse::<WindowPolicy>().is_err());
    }
}
