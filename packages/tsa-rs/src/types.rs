use crate::chart::ChartPayload;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Experiment identifier as issued by the Data API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(pub u64);

/// Variable identifier within an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub u64);

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects one measured variable of one experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId {
    pub experiment: ExperimentId,
    pub variable: VariableId,
}

impl SeriesId {
    pub fn new(experiment: u64, variable: u64) -> Self {
        Self {
            experiment: ExperimentId(experiment),
            variable: VariableId(variable),
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "experiment {} / variable {}", self.experiment, self.variable)
    }
}

/// Opaque access token forwarded to the data collaborator
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<none>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// One (time, value) measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Time-ordered samples of one variable, keyed by time
///
/// Construction enforces ascending times. A sample whose time equals the
/// previous one replaces it, so no two samples of a series share a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        let mut keyed: Vec<Sample> = Vec::with_capacity(samples.len());

        for (idx, sample) in samples.into_iter().enumerate() {
            if !sample.time.is_finite() || !sample.value.is_finite() {
                return Err(AnalysisError::InvalidInput(format!(
                    "sample {} is not finite (time={}, value={})",
                    idx, sample.time, sample.value
                )));
            }

            match keyed.last_mut() {
                Some(last) if sample.time < last.time => {
                    return Err(AnalysisError::InvalidInput(format!(
                        "sample times must be ascending, but {} follows {}",
                        sample.time, last.time
                    )));
                }
                Some(last) if sample.time == last.time => *last = sample,
                _ => keyed.push(sample),
            }
        }

        Ok(Self { samples: keyed })
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(time, value)| Sample::new(time, value))
                .collect(),
        )
    }

    /// Caller guarantees strictly ascending, finite times.
    pub(crate) fn from_sorted(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }
}

impl TryFrom<Vec<Sample>> for Series {
    type Error = AnalysisError;

    fn try_from(samples: Vec<Sample>) -> Result<Self> {
        Self::new(samples)
    }
}

impl From<Series> for Vec<Sample> {
    fn from(series: Series) -> Self {
        series.samples
    }
}

/// Two series resampled onto one shared time axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeriesPair {
    pub first: Series,
    pub second: Series,
}

impl AlignedSeriesPair {
    /// Shared time axis (taken from the first series)
    pub fn times(&self) -> Vec<f64> {
        self.first.times()
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// True when both series carry identical time sequences
    pub fn is_aligned(&self) -> bool {
        self.first.len() == self.second.len()
            && self
                .first
                .samples()
                .iter()
                .zip(self.second.samples())
                .all(|(a, b)| a.time == b.time)
    }
}

/// Kind of value an analysis returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputType {
    #[serde(rename = "float")]
    Number,
    #[serde(rename = "string")]
    Text,
    #[serde(rename = "array")]
    Chart,
}

/// Result produced by one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisValue {
    Number(f64),
    Text(String),
    Chart(Box<ChartPayload>),
}

impl AnalysisValue {
    pub fn output_type(&self) -> OutputType {
        match self {
            Self::Number(_) => OutputType::Number,
            Self::Text(_) => OutputType::Text,
            Self::Chart(_) => OutputType::Chart,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartPayload> {
        match self {
            Self::Chart(chart) => Some(chart),
            _ => None,
        }
    }
}

/// Envelope returned for every analysis invocation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub id: String,
    pub operation: String,
    pub output_type: OutputType,
    pub result: AnalysisValue,
    pub created_at: String,
}

impl AnalysisOutcome {
    pub fn new(operation: impl Into<String>, result: AnalysisValue) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            output_type: result.output_type(),
            result,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
