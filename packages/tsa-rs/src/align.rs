//! Alignment of two independently sampled series onto a shared time axis.

use crate::error::{AnalysisError, Result};
use crate::types::{AlignedSeriesPair, Sample, Series};

/// Align two series by linear interpolation.
///
/// Both time axes are walked merge-style from index 1, the sample at index 0
/// only serving as the left anchor of the first interval. At every step the
/// series whose current time lies ahead gets a value interpolated at the other
/// series' time. The walk stops as soon as either series is exhausted, so
/// nothing is extrapolated past the shorter range.
///
/// Series with at most one sample cannot be interpolated and are returned
/// unchanged.
pub fn align(first: &Series, second: &Series) -> Result<AlignedSeriesPair> {
    if first.len() <= 1 || second.len() <= 1 {
        log::debug!(
            "Skipping alignment of degenerate series ({} and {} samples)",
            first.len(),
            second.len()
        );
        return Ok(AlignedSeriesPair {
            first: first.clone(),
            second: second.clone(),
        });
    }

    let a = first.samples();
    let b = second.samples();
    let capacity = a.len() + b.len();
    let mut aligned_a: Vec<Sample> = Vec::with_capacity(capacity);
    let mut aligned_b: Vec<Sample> = Vec::with_capacity(capacity);

    let mut i = 1;
    let mut j = 1;
    while i < a.len() && j < b.len() {
        let time_a = a[i].time;
        let time_b = b[j].time;

        if time_a == time_b {
            aligned_a.push(a[i]);
            aligned_b.push(b[j]);
            i += 1;
            j += 1;
        } else if time_a > time_b {
            let value = interpolate(a[i - 1], a[i], time_b)?;
            aligned_a.push(Sample::new(time_b, value));
            aligned_b.push(b[j]);
            j += 1;
        } else {
            let value = interpolate(b[j - 1], b[j], time_a)?;
            aligned_a.push(a[i]);
            aligned_b.push(Sample::new(time_a, value));
            i += 1;
        }
    }

    log::debug!(
        "Aligned {} + {} samples onto {} shared time points",
        a.len(),
        b.len(),
        aligned_a.len()
    );

    Ok(AlignedSeriesPair {
        first: Series::from_sorted(aligned_a),
        second: Series::from_sorted(aligned_b),
    })
}

/// Linear interpolation between `prev` and `next` at `time`.
///
/// A zero-width interval has no defined slope and is reported as
/// `InvalidInput` instead of producing NaN.
pub fn interpolate(prev: Sample, next: Sample, time: f64) -> Result<f64> {
    let width = next.time - prev.time;
    if width == 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "cannot interpolate at {} over zero-width interval at time {}",
            time, prev.time
        )));
    }
    Ok(prev.value + (time - prev.time) * (next.value - prev.value) / width)
}
