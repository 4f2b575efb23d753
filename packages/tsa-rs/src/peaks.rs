//! Smoothed z-score signal detection.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LAG: usize = 5;
pub const DEFAULT_THRESHOLD: f64 = 0.5;
/// Kept at the historical default even though it lies outside `[0, 1]`.
pub const DEFAULT_INFLUENCE: f64 = 3.5;

/// Classification of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum PeakFlag {
    High,
    Low,
    None,
}

impl PeakFlag {
    pub fn is_signal(&self) -> bool {
        !matches!(self, PeakFlag::None)
    }
}

impl From<PeakFlag> for i8 {
    fn from(flag: PeakFlag) -> Self {
        match flag {
            PeakFlag::High => 1,
            PeakFlag::Low => -1,
            PeakFlag::None => 0,
        }
    }
}

impl TryFrom<i8> for PeakFlag {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(PeakFlag::High),
            -1 => Ok(PeakFlag::Low),
            0 => Ok(PeakFlag::None),
            other => Err(format!("invalid peak flag {}", other)),
        }
    }
}

/// Flags parallel to the input plus the flagged values only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDetection {
    pub flags: Vec<PeakFlag>,
    pub peaks: Vec<Option<f64>>,
}

impl PeakDetection {
    pub fn signal_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| flag.is_signal())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Tuning of the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakDetector {
    /// Trailing window length for the rolling mean and deviation
    pub lag: usize,
    /// Deviations from the rolling mean needed to flag a sample
    pub threshold: f64,
    /// Weight of a flagged sample in the rolling window
    pub influence: f64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            lag: DEFAULT_LAG,
            threshold: DEFAULT_THRESHOLD,
            influence: DEFAULT_INFLUENCE,
        }
    }
}

impl PeakDetector {
    pub fn new(lag: usize, threshold: f64, influence: f64) -> Self {
        Self {
            lag,
            threshold,
            influence,
        }
    }

    /// Run the detector over `values`.
    ///
    /// The first `lag` samples seed the window and are never flagged. A
    /// flagged sample enters the window as
    /// `influence * value + (1 - influence) * previous`, where `previous` is
    /// the last window entry, so a signal only partially shifts later
    /// statistics.
    ///
    /// # Errors
    /// `InvalidInput` if `lag` is zero, the threshold is negative or not
    /// finite, or fewer than `lag` values are given.
    pub fn detect(&self, values: &[f64]) -> Result<PeakDetection> {
        let lag = self.lag;
        if lag == 0 {
            return Err(AnalysisError::InvalidInput(
                "peak detection lag must be at least 1".to_string(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "peak detection threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if values.len() < lag {
            return Err(AnalysisError::InvalidInput(format!(
                "peak detection with lag {} needs at least {} values, got {}",
                lag,
                lag,
                values.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.influence) {
            log::warn!(
                "Peak detection influence {} lies outside [0, 1]; flagged samples will be amplified",
                self.influence
            );
        }

        let mut flags = vec![PeakFlag::None; values.len()];
        let mut filtered = values[..lag].to_vec();
        let (mut avg, mut std) = window_stats(&filtered);

        for (i, &value) in values.iter().enumerate().skip(lag) {
            let deviation = value - avg;
            let entry = if deviation.abs() > self.threshold * std {
                flags[i] = if deviation > 0.0 {
                    PeakFlag::High
                } else {
                    PeakFlag::Low
                };
                self.influence * value + (1.0 - self.influence) * filtered[i - 1]
            } else {
                value
            };
            filtered.push(entry);
            (avg, std) = window_stats(&filtered[i + 1 - lag..=i]);
        }

        let peaks = values
            .iter()
            .zip(&flags)
            .map(|(&value, flag)| flag.is_signal().then_some(value))
            .collect();

        log::debug!(
            "Peak detection flagged {} of {} samples",
            flags.iter().filter(|f| f.is_signal()).count(),
            values.len()
        );

        Ok(PeakDetection { flags, peaks })
    }
}

/// Mean and population standard deviation of the window
fn window_stats(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
