//! Least-squares fitting: straight line, log-linearised exponential and
//! polynomial (normal equations solved by Gaussian elimination).

use crate::error::{AnalysisError, Result};
use crate::types::Series;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// `y = b0 + b1 * x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub b0: f64,
    pub b1: f64,
}

impl LinearFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.b0 + self.b1 * x
    }
}

/// `y = a * e^(r * x)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialFit {
    pub a: f64,
    pub r: f64,
}

impl ExponentialFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.a * (self.r * x).exp()
    }
}

/// `y = Σ coefficients[i] * x^i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    pub coefficients: Vec<f64>,
}

impl PolynomialFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| c * x.powi(i as i32))
            .sum()
    }

    /// Fitted curve sampled at the series' own times
    pub fn fitted_values(&self, series: &Series) -> Vec<f64> {
        series.samples().iter().map(|s| self.evaluate(s.time)).collect()
    }
}

/// Ordinary least squares for a straight line.
///
/// Inputs of unequal length are truncated to the shorter prefix.
///
/// # Errors
/// `InvalidInput` when there is no data or all `x` values are identical.
pub fn least_squares(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    let n = x.len().min(y.len());
    if n == 0 {
        return Err(AnalysisError::InvalidInput(
            "least squares requires at least one (x, y) pair".to_string(),
        ));
    }
    if x.len() != y.len() {
        log::debug!(
            "Truncating least squares input to {} pairs ({} x, {} y)",
            n,
            x.len(),
            y.len()
        );
    }

    let (x, y) = (&x[..n], &y[..n]);
    let x_mean = x.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    if sxx == 0.0 {
        return Err(AnalysisError::InvalidInput(
            "x values have zero variance, regression slope is undefined".to_string(),
        ));
    }

    let b1 = sxy / sxx;
    let b0 = y_mean - b1 * x_mean;
    Ok(LinearFit { b0, b1 })
}

/// Exponential fit through log-linearisation.
///
/// Non-positive `y` values have no logarithm; they enter the linear fit as
/// `ln(y) = 0` so every sample keeps its position.
pub fn exponential_least_squares(x: &[f64], y: &[f64]) -> Result<ExponentialFit> {
    let ln_y: Vec<f64> = y
        .iter()
        .map(|&value| if value > 0.0 { value.ln() } else { 0.0 })
        .collect();

    let clamped = y.iter().filter(|&&value| value <= 0.0).count();
    if clamped > 0 {
        log::debug!("{} non-positive values treated as ln(y) = 0", clamped);
    }

    let line = least_squares(x, &ln_y)?;
    Ok(ExponentialFit {
        a: line.b0.exp(),
        r: line.b1,
    })
}

/// Polynomial least squares with `degree` coefficients (highest power
/// `degree - 1`).
///
/// # Errors
/// - `InvalidInput` for an empty series or `degree == 0`
/// - `NumericInstability` when `degree` exceeds the number of samples or the
///   normal equations cannot be solved
pub fn polynomial_least_squares(series: &Series, degree: usize) -> Result<PolynomialFit> {
    if degree == 0 {
        return Err(AnalysisError::InvalidInput(
            "polynomial degree must be at least 1".to_string(),
        ));
    }
    if series.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "polynomial regression requires at least one sample".to_string(),
        ));
    }

    // More coefficients than samples leaves the normal matrix singular
    if degree > series.len() {
        return Err(AnalysisError::NumericInstability(format!(
            "{} coefficients cannot be fitted to {} samples",
            degree,
            series.len()
        )));
    }

    let samples = series.samples();
    let normal = DMatrix::from_fn(degree, degree, |i, j| {
        samples
            .iter()
            .map(|s| s.time.powi(i as i32) * s.time.powi(j as i32))
            .sum::<f64>()
    });
    let targets = DVector::from_fn(degree, |i, _| {
        samples
            .iter()
            .map(|s| s.time.powi(i as i32) * s.value)
            .sum::<f64>()
    });

    let coefficients = solve_linear_system(&normal, &targets)?;
    Ok(PolynomialFit { coefficients })
}

/// Solve `matrix * x = targets` by Gaussian elimination with partial pivoting.
///
/// # Errors
/// `NumericInstability` when any solution component is not finite.
pub fn solve_linear_system(matrix: &DMatrix<f64>, targets: &DVector<f64>) -> Result<Vec<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n || targets.len() != n {
        return Err(AnalysisError::InvalidInput(format!(
            "system must be square: {}x{} matrix with {} targets",
            n,
            matrix.ncols(),
            targets.len()
        )));
    }

    // Augmented matrix [A | b]
    let mut a = DMatrix::from_fn(n, n + 1, |i, j| if j < n { matrix[(i, j)] } else { targets[i] });

    for i in 0..n {
        let mut max_row = i;
        let mut max_el = a[(i, i)].abs();
        for k in (i + 1)..n {
            if a[(k, i)].abs() > max_el {
                max_el = a[(k, i)].abs();
                max_row = k;
            }
        }
        a.swap_rows(i, max_row);

        for k in (i + 1)..n {
            let c = -a[(k, i)] / a[(i, i)];
            a[(k, i)] = 0.0;
            for j in (i + 1)..=n {
                a[(k, j)] += c * a[(i, j)];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = a[(i, n)] / a[(i, i)];
        for k in 0..i {
            a[(k, n)] -= a[(k, i)] * x[i];
        }
    }

    if x.iter().any(|c| !c.is_finite()) {
        return Err(AnalysisError::NumericInstability(format!(
            "polynomial degree {} is too large for a stable solve; reduce the degree",
            n
        )));
    }

    Ok(x)
}
