//! Named analyses over experiment variables.
//!
//! Every operation fetches its series through a [`SeriesSource`], runs the
//! numeric engines and returns a scalar, a label or a [`ChartPayload`].
//! Nothing is cached between calls.

use crate::align::align;
use crate::chart::{
    column, shape_result, ChartPayload, LegendEntry, PRIMARY_COLOR, RESULT_COLOR, SECONDARY_COLOR,
};
use crate::error::{AnalysisError, Result};
use crate::peaks::PeakDetector;
use crate::regression::{exponential_least_squares, least_squares, polynomial_least_squares};
use crate::source::SeriesSource;
use crate::statistics::{self, round_to_decimals, EXTREMA_DECIMALS};
use crate::types::{AlignedSeriesPair, Credential, Series, SeriesId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default number of polynomial coefficients
pub const DEFAULT_POLYNOMIAL_DEGREE: usize = 3;

/// Direction of the fitted trend of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Monotonicity {
    Increasing,
    Decreasing,
}

impl Monotonicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Monotonicity::Increasing => "increasing",
            Monotonicity::Decreasing => "decreasing",
        }
    }
}

impl fmt::Display for Monotonicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for all analyses
#[derive(Clone)]
pub struct AnalysisFacade {
    source: Arc<dyn SeriesSource>,
}

impl AnalysisFacade {
    pub fn new(source: Arc<dyn SeriesSource>) -> Self {
        Self { source }
    }

    pub fn with_source<S: SeriesSource + 'static>(source: S) -> Self {
        Self::new(Arc::new(source))
    }

    pub async fn fetch(&self, id: SeriesId, credential: &Credential) -> Result<Series> {
        let series = self.source.fetch_series(id, credential).await?;
        log::debug!("Fetched {} samples for {}", series.len(), id);
        Ok(series)
    }

    /// Fetch two variables concurrently and align them
    pub async fn fetch_aligned(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<AlignedSeriesPair> {
        let (a, b) = tokio::try_join!(self.fetch(first, credential), self.fetch(second, credential))?;
        align(&a, &b)
    }

    async fn values(&self, id: SeriesId, credential: &Credential) -> Result<Vec<f64>> {
        Ok(self.fetch(id, credential).await?.values())
    }

    pub async fn variable_mean(&self, id: SeriesId, credential: &Credential) -> Result<f64> {
        statistics::mean(&self.values(id, credential).await?)
    }

    /// Maximum rounded to three decimals
    pub async fn variable_maximum(&self, id: SeriesId, credential: &Credential) -> Result<f64> {
        let max = statistics::max(&self.values(id, credential).await?)?;
        Ok(round_to_decimals(max, EXTREMA_DECIMALS))
    }

    /// Minimum rounded to three decimals
    pub async fn variable_minimum(&self, id: SeriesId, credential: &Credential) -> Result<f64> {
        let min = statistics::min(&self.values(id, credential).await?)?;
        Ok(round_to_decimals(min, EXTREMA_DECIMALS))
    }

    pub async fn variable_median(&self, id: SeriesId, credential: &Credential) -> Result<f64> {
        statistics::median(&self.values(id, credential).await?)
    }

    pub async fn variable_variance(
        &self,
        id: SeriesId,
        is_whole_population: bool,
        credential: &Credential,
    ) -> Result<f64> {
        statistics::variance(&self.values(id, credential).await?, is_whole_population)
    }

    pub async fn variable_standard_deviation(
        &self,
        id: SeriesId,
        is_whole_population: bool,
        credential: &Credential,
    ) -> Result<f64> {
        statistics::standard_deviation(&self.values(id, credential).await?, is_whole_population)
    }

    /// Pointwise mean of two aligned variables
    pub async fn two_variables_mean(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let pair = require_aligned(self.fetch_aligned(first, second, credential).await?)?;
        let (values1, values2) = (pair.first.values(), pair.second.values());
        let mean: Vec<f64> = values1
            .iter()
            .zip(&values2)
            .map(|(a, b)| (a + b) / 2.0)
            .collect();

        Ok(pointwise_chart(first, "Two Variables Mean", "Mean", &pair, &mean))
    }

    /// Pointwise `first - second` of two aligned variables
    pub async fn two_variables_difference(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let pair = require_aligned(self.fetch_aligned(first, second, credential).await?)?;
        let (values1, values2) = (pair.first.values(), pair.second.values());
        let difference: Vec<f64> = values1.iter().zip(&values2).map(|(a, b)| a - b).collect();

        Ok(pointwise_chart(
            first,
            "Two Variables Difference",
            "Difference",
            &pair,
            &difference,
        ))
    }

    /// Straight line fitted over time
    pub async fn variable_linear_regression(
        &self,
        id: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let series = self.fetch(id, credential).await?;
        let (times, values) = (series.times(), series.values());
        let fit = least_squares(&times, &values)?;
        log::debug!("Linear fit for {}: b0={}, b1={}", id, fit.b0, fit.b1);

        let fitted: Vec<f64> = times.iter().map(|&t| fit.evaluate(t)).collect();
        Ok(shape_result(
            id.experiment,
            "Linear regression",
            vec![column(&times), column(&values), column(&fitted)],
            vec![
                LegendEntry::new("Time series", PRIMARY_COLOR),
                LegendEntry::new("Linear regression", RESULT_COLOR),
            ],
        ))
    }

    /// Straight line fitted through aligned (first, second) value pairs
    pub async fn two_variables_linear_regression(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let pair = self.fetch_aligned(first, second, credential).await?;
        let (x, y) = (pair.first.values(), pair.second.values());
        let fit = least_squares(&x, &y)?;

        let fitted: Vec<f64> = x.iter().map(|&v| fit.evaluate(v)).collect();
        Ok(relation_chart(first, "Linear regression", &x, &y, &fitted))
    }

    /// Sign of the fitted slope over time
    pub async fn variable_monotonicity(
        &self,
        id: SeriesId,
        credential: &Credential,
    ) -> Result<Monotonicity> {
        let series = self.fetch(id, credential).await?;
        if series.len() < 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "monotonicity requires at least 2 samples, got {}",
                series.len()
            )));
        }

        let fit = least_squares(&series.times(), &series.values())?;
        Ok(if fit.b1 > 0.0 {
            Monotonicity::Increasing
        } else {
            Monotonicity::Decreasing
        })
    }

    /// `a * e^(r * t)` fitted over time
    pub async fn variable_exponential_regression(
        &self,
        id: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let series = self.fetch(id, credential).await?;
        let (times, values) = (series.times(), series.values());
        let fit = exponential_least_squares(&times, &values)?;

        let fitted: Vec<f64> = times.iter().map(|&t| fit.evaluate(t)).collect();
        Ok(shape_result(
            id.experiment,
            "Exponential regression",
            vec![column(&times), column(&values), column(&fitted)],
            vec![
                LegendEntry::new("Time series", PRIMARY_COLOR),
                LegendEntry::new("Exponential Regression", RESULT_COLOR),
            ],
        ))
    }

    /// Exponential curve fitted through aligned (first, second) value pairs
    pub async fn two_variables_exponential_regression(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let pair = self.fetch_aligned(first, second, credential).await?;
        let (x, y) = (pair.first.values(), pair.second.values());
        let fit = exponential_least_squares(&x, &y)?;

        let fitted: Vec<f64> = x.iter().map(|&v| fit.evaluate(v)).collect();
        Ok(relation_chart(first, "Exponential regression", &x, &y, &fitted))
    }

    /// Smoothed z-score peaks of one variable
    pub async fn variable_find_peaks(
        &self,
        id: SeriesId,
        detector: PeakDetector,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let series = self.fetch(id, credential).await?;
        let (times, values) = (series.times(), series.values());
        let detection = detector.detect(&values)?;

        Ok(shape_result(
            id.experiment,
            "Peaks",
            vec![column(&times), column(&values), detection.peaks],
            vec![
                LegendEntry::new("Variable", PRIMARY_COLOR),
                LegendEntry::new("Peaks", RESULT_COLOR),
            ],
        ))
    }

    /// Pearson correlation of two aligned variables
    pub async fn two_variables_correlation(
        &self,
        first: SeriesId,
        second: SeriesId,
        credential: &Credential,
    ) -> Result<f64> {
        let pair = self.fetch_aligned(first, second, credential).await?;
        statistics::correlation(&pair.first.values(), &pair.second.values())
    }

    /// Polynomial with `maximum_degree` coefficients fitted over time
    pub async fn variable_polynomial_regression(
        &self,
        id: SeriesId,
        maximum_degree: usize,
        credential: &Credential,
    ) -> Result<ChartPayload> {
        let series = self.fetch(id, credential).await?;
        let fit = polynomial_least_squares(&series, maximum_degree).map_err(|e| match e {
            AnalysisError::NumericInstability(_) => AnalysisError::NumericInstability(format!(
                "maximum degree {} is too high for {} samples of {}; lower the degree",
                maximum_degree,
                series.len(),
                id
            )),
            other => other,
        })?;

        Ok(shape_result(
            id.experiment,
            "Polynomial Regression",
            vec![
                column(&series.times()),
                column(&series.values()),
                column(&fit.fitted_values(&series)),
            ],
            vec![
                LegendEntry::new("Variable", PRIMARY_COLOR),
                LegendEntry::new("Polynomial Regression", RESULT_COLOR),
            ],
        ))
    }
}

impl fmt::Debug for AnalysisFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisFacade").finish_non_exhaustive()
    }
}

/// Pointwise operations need both series on one non-empty axis
fn require_aligned(pair: AlignedSeriesPair) -> Result<AlignedSeriesPair> {
    if pair.is_empty() || !pair.is_aligned() {
        return Err(AnalysisError::InvalidInput(format!(
            "variables share no common time axis ({} and {} samples after alignment)",
            pair.first.len(),
            pair.second.len()
        )));
    }
    Ok(pair)
}

fn pointwise_chart(
    first: SeriesId,
    title: &str,
    result_name: &str,
    pair: &AlignedSeriesPair,
    derived: &[f64],
) -> ChartPayload {
    shape_result(
        first.experiment,
        title,
        vec![
            column(&pair.times()),
            column(&pair.first.values()),
            column(&pair.second.values()),
            column(derived),
        ],
        vec![
            LegendEntry::new("Variable 1", PRIMARY_COLOR),
            LegendEntry::new("Variable 2", SECONDARY_COLOR),
            LegendEntry::new(result_name, RESULT_COLOR),
        ],
    )
}

/// Chart of the second variable against the first, plus the fitted curve
fn relation_chart(first: SeriesId, title: &str, x: &[f64], y: &[f64], fitted: &[f64]) -> ChartPayload {
    let mut chart = shape_result(
        first.experiment,
        title,
        vec![column(x), column(y), column(fitted)],
        vec![
            LegendEntry::new("Variable 2", PRIMARY_COLOR),
            LegendEntry::new(title, RESULT_COLOR),
        ],
    );
    chart.x_axis_name = "Variable 1".to_string();
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    fn facade() -> AnalysisFacade {
        let source = InMemorySource::new()
            .with_series(
                SeriesId::new(1, 1),
                Series::from_pairs([(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]).unwrap(),
            )
            .with_series(
                SeriesId::new(1, 2),
                Series::from_pairs([(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap(),
            )
            .with_series(
                SeriesId::new(2, 1),
                Series::from_pairs([(0.0, 4.0), (1.0, 2.0), (2.0, 1.0)]).unwrap(),
            )
            .with_series(SeriesId::new(3, 1), Series::from_pairs([(0.0, 1.0)]).unwrap());
        AnalysisFacade::with_source(source)
    }

    #[tokio::test]
    async fn test_scalar_statistics() {
        let facade = facade();
        let cred = Credential::anonymous();
        let a = SeriesId::new(1, 1);

        assert_eq!(facade.variable_mean(a, &cred).await.unwrap(), 2.0);
        assert_eq!(facade.variable_maximum(a, &cred).await.unwrap(), 3.0);
        assert_eq!(facade.variable_minimum(a, &cred).await.unwrap(), 1.0);
        assert_eq!(facade.variable_median(a, &cred).await.unwrap(), 3.0);
        assert_eq!(facade.variable_variance(a, false, &cred).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_two_variables_mean_chart() {
        let facade = facade();
        let chart = facade
            .two_variables_mean(SeriesId::new(1, 1), SeriesId::new(1, 2), &Credential::anonymous())
            .await
            .unwrap();

        let data = &chart.primary().unwrap().data;
        assert_eq!(data.len(), 4);
        assert_eq!(data[0], vec![Some(1.0), Some(2.0)]);
        assert_eq!(data[3], vec![Some(2.5), Some(4.0)]);
        assert_eq!(chart.legend[2].name, "Mean");
        assert_eq!(chart.id, "1");
    }

    #[tokio::test]
    async fn test_two_variables_regression_chart_layout() {
        let facade = facade();
        let chart = facade
            .two_variables_linear_regression(
                SeriesId::new(1, 1),
                SeriesId::new(1, 2),
                &Credential::anonymous(),
            )
            .await
            .unwrap();

        assert_eq!(chart.x_axis_name, "Variable 1");
        let names: Vec<&str> = chart.legend.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Variable 2", "Linear regression"]);
        assert_eq!(chart.primary().unwrap().data.len(), 3);
    }

    #[tokio::test]
    async fn test_monotonicity() {
        let facade = facade();
        let cred = Credential::anonymous();
        assert_eq!(
            facade.variable_monotonicity(SeriesId::new(1, 1), &cred).await.unwrap(),
            Monotonicity::Increasing
        );
        assert_eq!(
            facade.variable_monotonicity(SeriesId::new(2, 1), &cred).await.unwrap(),
            Monotonicity::Decreasing
        );
        assert!(matches!(
            facade.variable_monotonicity(SeriesId::new(3, 1), &cred).await,
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_pointwise_requires_common_axis() {
        let facade = facade();
        let result = facade
            .two_variables_difference(SeriesId::new(1, 1), SeriesId::new(3, 1), &Credential::anonymous())
            .await;
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_polynomial_plots_measured_values() {
        let facade = facade();
        let chart = facade
            .variable_polynomial_regression(SeriesId::new(1, 2), 2, &Credential::anonymous())
            .await
            .unwrap();

        let data = &chart.primary().unwrap().data;
        assert_eq!(data[1], vec![Some(1.0), Some(3.0), Some(5.0)]);
        for (fitted, measured) in data[2].iter().zip(&data[1]) {
            assert!((fitted.unwrap() - measured.unwrap()).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_polynomial_degree_too_high() {
        let facade = facade();
        let result = facade
            .variable_polynomial_regression(SeriesId::new(3, 1), 4, &Credential::anonymous())
            .await;
        assert!(matches!(result, Err(AnalysisError::NumericInstability(_))));
    }

    #[tokio::test]
    async fn test_missing_series_propagates() {
        let facade = facade();
        let result = facade
            .variable_mean(SeriesId::new(42, 42), &Credential::anonymous())
            .await;
        assert!(matches!(result, Err(AnalysisError::OperationFailed(_))));
    }
}
