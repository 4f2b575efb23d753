//! Descriptive statistics over the values of a single series.

use crate::error::{AnalysisError, Result};

/// Decimal places used when reporting extrema
pub const EXTREMA_DECIMALS: i32 = 3;

fn require_values(values: &[f64], min_len: usize, what: &str) -> Result<()> {
    if values.len() < min_len {
        return Err(AnalysisError::InvalidInput(format!(
            "{} requires at least {} value(s), got {}",
            what,
            min_len,
            values.len()
        )));
    }
    Ok(())
}

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn mean(values: &[f64]) -> Result<f64> {
    require_values(values, 1, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max(values: &[f64]) -> Result<f64> {
    require_values(values, 1, "maximum")?;
    Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn min(values: &[f64]) -> Result<f64> {
    require_values(values, 1, "minimum")?;
    Ok(values.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Element at index `round(n / 2)` of the sorted values.
///
/// This is not the interpolated median: for odd `n` above one it picks the
/// element after the middle, for even `n` the upper middle. Downstream
/// consumers rely on these values. The index is clamped to the last element
/// so a single value is its own median.
pub fn median(values: &[f64]) -> Result<f64> {
    require_values(values, 1, "median")?;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let idx = ((sorted.len() as f64 / 2.0).round() as usize).min(sorted.len() - 1);
    Ok(sorted[idx])
}

/// Population variance (`/ n`) or sample variance (`/ (n - 1)`).
pub fn variance(values: &[f64], is_whole_population: bool) -> Result<f64> {
    if is_whole_population {
        require_values(values, 1, "population variance")?;
    } else {
        require_values(values, 2, "sample variance")?;
    }

    let mean = mean(values)?;
    let sum: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let n = values.len() as f64;

    Ok(if is_whole_population {
        sum / n
    } else {
        sum / (n - 1.0)
    })
}

pub fn standard_deviation(values: &[f64], is_whole_population: bool) -> Result<f64> {
    Ok(variance(values, is_whole_population)?.sqrt())
}

/// Pearson correlation coefficient of two equally long sequences.
///
/// # Errors
/// `InvalidInput` on length mismatch, empty input, or when either sequence
/// is constant.
pub fn correlation(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "correlation requires equally long sequences, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    require_values(a, 1, "correlation")?;

    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let mut axb = 0.0;
    let mut a2 = 0.0;
    let mut b2 = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        axb += da * db;
        a2 += da * da;
        b2 += db * db;
    }

    let denominator = (a2 * b2).sqrt();
    if denominator == 0.0 {
        return Err(AnalysisError::InvalidInput(
            "correlation is undefined for a constant sequence".to_string(),
        ));
    }
    Ok(axb / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn test_mean() {
        assert_eq!(mean(&DATA).unwrap(), 5.0);
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_variance_population_and_sample() {
        assert!((variance(&DATA, true).unwrap() - 4.0).abs() < 1e-12);
        assert!((variance(&DATA, false).unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert!((standard_deviation(&DATA, true).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_variance_of_single_value_is_error() {
        assert!(matches!(
            variance(&[3.0], false),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert_eq!(variance(&[3.0], true).unwrap(), 0.0);
    }

    #[test]
    fn test_extrema() {
        assert_eq!(max(&[1.5, -2.0, 8.25]).unwrap(), 8.25);
        assert_eq!(min(&[1.5, -2.0, 8.25]).unwrap(), -2.0);
        assert_eq!(round_to_decimals(3.14159, EXTREMA_DECIMALS), 3.142);
        assert_eq!(round_to_decimals(-2.71828, EXTREMA_DECIMALS), -2.718);
    }

    #[test]
    fn test_median_index_rule() {
        // n = 4 -> index 2 of [1, 2, 3, 4]
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 3.0);
        // n = 3 -> round(1.5) = 2
        assert_eq!(median(&[5.0, 1.0, 3.0]).unwrap(), 5.0);
        // n = 5 -> round(2.5) = 3
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 4.0);
        // n = 1 clamps to the only element
        assert_eq!(median(&[7.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_correlation_perfect() {
        assert!((correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_errors() {
        assert!(correlation(&[1.0, 2.0], &[1.0]).is_err());
        assert!(correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
