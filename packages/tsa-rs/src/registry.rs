//! Registry of invocable analyses.
//!
//! Each analysis is described by an [`OperationSpec`]: its method name, the
//! parameters it takes (with grouping tags used by clients to lay out input
//! forms) and the kind of value it returns. [`AnalysisFacade::run`] decodes a
//! JSON object of inputs against the operation's parameters and dispatches
//! to the facade.

use crate::error::{AnalysisError, Result};
use crate::operations::{AnalysisFacade, DEFAULT_POLYNOMIAL_DEGREE};
use crate::peaks::{PeakDetector, DEFAULT_INFLUENCE, DEFAULT_LAG, DEFAULT_THRESHOLD};
use crate::types::{AnalysisOutcome, AnalysisValue, Credential, OutputType, SeriesId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Group assigned to parameters without a group tag
pub const NONGROUPED: &str = "nongrouped";

/// Analyses known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    VariableMean,
    VariableMaximum,
    VariableMinimum,
    VariableMedian,
    VariableVariance,
    VariableStandardDeviation,
    TwoVariablesMean,
    TwoVariablesDifference,
    VariableLinearRegression,
    TwoVariablesLinearRegression,
    VariableMonotonicity,
    VariableExponentialRegression,
    TwoVariablesExponentialRegression,
    VariableFindPeaks,
    TwoVariablesCorrelation,
    VariablePolynomialRegression,
}

/// Wire type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    ExperimentId,
    VariableId,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "bool")]
    Bool,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::ExperimentId => "ExperimentId",
            ParameterKind::VariableId => "VariableId",
            ParameterKind::Int => "int",
            ParameterKind::Float => "float",
            ParameterKind::Bool => "bool",
        }
    }
}

/// Value used when an optional parameter is omitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            DefaultValue::Int(v) => Value::from(v),
            DefaultValue::Float(v) => Value::from(v),
            DefaultValue::Bool(v) => Value::from(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub key: &'static str,
    pub kind: ParameterKind,
    pub group: Option<&'static str>,
    pub description: Option<&'static str>,
    pub default: Option<DefaultValue>,
    pub unsigned: bool,
}

impl ParameterSpec {
    const fn new(key: &'static str, kind: ParameterKind) -> Self {
        Self {
            key,
            kind,
            group: None,
            description: None,
            default: None,
            unsigned: false,
        }
    }

    const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Display name, e.g. `isWholePopulation` -> `Is Whole Population`
    pub fn display_name(&self) -> String {
        method_to_display_name(self.key)
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub operation: Operation,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub parameters: &'static [ParameterSpec],
    pub output: OutputType,
    pub output_description: Option<&'static str>,
}

impl OperationSpec {
    /// Look up by method name (`variableMean`) or display name (`Variable Mean`)
    pub fn from_name(name: &str) -> Option<&'static OperationSpec> {
        let method = display_to_method_name(name);
        OPERATION_REGISTRY.iter().find(|op| op.name == method)
    }

    pub fn display_name(&self) -> String {
        method_to_display_name(self.name)
    }

    /// Parameters grouped for input forms, groups in first-seen order
    pub fn prescription(&self) -> Prescription {
        let mut groups: Vec<InputGroup> = Vec::new();

        for param in self.parameters {
            let group_name = param.group.unwrap_or(NONGROUPED);
            let input = InputPrescription {
                key: param.key.to_string(),
                name: param.display_name(),
                kind: param.kind,
                description: param.description.map(str::to_string),
                default_value: param.default.map(DefaultValue::to_json),
                unsigned: param.unsigned.then_some(true),
            };

            match groups.iter_mut().find(|g| g.name == group_name) {
                Some(group) => group.inputs.push(input),
                None => groups.push(InputGroup {
                    name: group_name.to_string(),
                    inputs: vec![input],
                }),
            }
        }

        Prescription {
            name: self.display_name(),
            description: self.description.map(str::to_string),
            input_groups: groups,
            output: OutputPrescription {
                kind: self.output,
                description: self.output_description.map(str::to_string),
            },
        }
    }
}

/// Input form description of one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub name: String,
    pub description: Option<String>,
    pub input_groups: Vec<InputGroup>,
    pub output: OutputPrescription,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputGroup {
    pub name: String,
    pub inputs: Vec<InputPrescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPrescription {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPrescription {
    #[serde(rename = "type")]
    pub kind: OutputType,
    pub description: Option<String>,
}

const EXPERIMENT: ParameterSpec = ParameterSpec::new("experiment", ParameterKind::ExperimentId)
    .group("Variable")
    .describe("Experiment identifier");
const VARIABLE: ParameterSpec = ParameterSpec::new("variable", ParameterKind::VariableId)
    .group("Variable")
    .describe("Variable identifier");
const EXPERIMENT_1: ParameterSpec = ParameterSpec::new("experiment1", ParameterKind::ExperimentId)
    .group("Variable1")
    .describe("First experiment.");
const VARIABLE_1: ParameterSpec = ParameterSpec::new("variable1", ParameterKind::VariableId)
    .group("Variable1")
    .describe("Variable of first experiment.");
const EXPERIMENT_2: ParameterSpec = ParameterSpec::new("experiment2", ParameterKind::ExperimentId)
    .group("Variable2")
    .describe("Second experiment.");
const VARIABLE_2: ParameterSpec = ParameterSpec::new("variable2", ParameterKind::VariableId)
    .group("Variable2")
    .describe("Variable of second experiment.");
const IS_WHOLE_POPULATION: ParameterSpec = ParameterSpec::new("isWholePopulation", ParameterKind::Bool)
    .describe("Are data measured for whole population?");

const ONE_VARIABLE: &[ParameterSpec] = &[EXPERIMENT, VARIABLE];
const TWO_VARIABLES: &[ParameterSpec] = &[EXPERIMENT_1, VARIABLE_1, EXPERIMENT_2, VARIABLE_2];
const ONE_VARIABLE_POPULATION: &[ParameterSpec] = &[EXPERIMENT, VARIABLE, IS_WHOLE_POPULATION];

const FIND_PEAKS_PARAMETERS: &[ParameterSpec] = &[
    EXPERIMENT,
    VARIABLE,
    ParameterSpec::new("lag", ParameterKind::Int)
        .describe(
            "Trailing window length. Controls how much the data is smoothed and how quickly \
             the detector adapts to changes in the long-term average.",
        )
        .default(DefaultValue::Int(DEFAULT_LAG as i64))
        .unsigned(),
    ParameterSpec::new("influence", ParameterKind::Float)
        .describe(
            "Weight of detected signals on the rolling mean and deviation. 0 assumes a \
             stationary series; values towards 1 let signals shift the baseline.",
        )
        .default(DefaultValue::Float(DEFAULT_INFLUENCE)),
    ParameterSpec::new("threshold", ParameterKind::Float)
        .describe(
            "Number of rolling standard deviations a sample must deviate from the rolling \
             mean to be classified as a signal.",
        )
        .default(DefaultValue::Float(DEFAULT_THRESHOLD)),
];

const POLYNOMIAL_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::new("experiment", ParameterKind::ExperimentId).group("Experiment"),
    ParameterSpec::new("variable", ParameterKind::VariableId).group("Experiment"),
    ParameterSpec::new("maximumDegree", ParameterKind::Int)
        .describe("Number of polynomial coefficients")
        .default(DefaultValue::Int(DEFAULT_POLYNOMIAL_DEGREE as i64))
        .unsigned(),
];

const fn spec(
    operation: Operation,
    name: &'static str,
    description: &'static str,
    parameters: &'static [ParameterSpec],
    output: OutputType,
    output_description: &'static str,
) -> OperationSpec {
    OperationSpec {
        operation,
        name,
        description: Some(description),
        parameters,
        output,
        output_description: Some(output_description),
    }
}

/// All analyses, in listing order
pub const OPERATION_REGISTRY: &[OperationSpec] = &[
    spec(
        Operation::VariableMean,
        "variableMean",
        "The mean of one variable.",
        ONE_VARIABLE,
        OutputType::Number,
        "Decimal number mean of variable data.",
    ),
    spec(
        Operation::VariableMaximum,
        "variableMaximum",
        "The maximum value of one variable.",
        ONE_VARIABLE,
        OutputType::Number,
        "Largest value, rounded to three decimals.",
    ),
    spec(
        Operation::VariableMinimum,
        "variableMinimum",
        "The minimum value of one variable.",
        ONE_VARIABLE,
        OutputType::Number,
        "Smallest value, rounded to three decimals.",
    ),
    spec(
        Operation::VariableMedian,
        "variableMedian",
        "The median of one variable.",
        ONE_VARIABLE,
        OutputType::Number,
        "Middle element of the sorted values.",
    ),
    spec(
        Operation::VariableVariance,
        "variableVariance",
        "The variance of one variable.",
        ONE_VARIABLE_POPULATION,
        OutputType::Number,
        "Population or sample variance.",
    ),
    spec(
        Operation::VariableStandardDeviation,
        "variableStandardDeviation",
        "The standard deviation of one variable.",
        ONE_VARIABLE_POPULATION,
        OutputType::Number,
        "Square root of the variance.",
    ),
    spec(
        Operation::TwoVariablesMean,
        "twoVariablesMean",
        "The mean of two variables. Result is new time series.",
        TWO_VARIABLES,
        OutputType::Chart,
        "Both variables and their pointwise mean on a shared time axis.",
    ),
    spec(
        Operation::TwoVariablesDifference,
        "twoVariablesDifference",
        "The difference of two variables. Result is new time series.",
        TWO_VARIABLES,
        OutputType::Chart,
        "Both variables and their pointwise difference on a shared time axis.",
    ),
    spec(
        Operation::VariableLinearRegression,
        "variableLinearRegression",
        "The linear regression of one variable. Intersects the data with a straight line.",
        ONE_VARIABLE,
        OutputType::Chart,
        "Time series with the fitted line.",
    ),
    spec(
        Operation::TwoVariablesLinearRegression,
        "twoVariablesLinearRegression",
        "Linear regression of the second variable against the first.",
        TWO_VARIABLES,
        OutputType::Chart,
        "Aligned value pairs with the fitted line.",
    ),
    spec(
        Operation::VariableMonotonicity,
        "variableMonotonicity",
        "Whether one variable is increasing or decreasing, judged by its linear trend.",
        ONE_VARIABLE,
        OutputType::Text,
        "\"increasing\" or \"decreasing\".",
    ),
    spec(
        Operation::VariableExponentialRegression,
        "variableExponentialRegression",
        "The exponential regression of one variable.",
        ONE_VARIABLE,
        OutputType::Chart,
        "Time series with the fitted exponential curve.",
    ),
    spec(
        Operation::TwoVariablesExponentialRegression,
        "twoVariablesExponentialRegression",
        "Exponential regression of the second variable against the first.",
        TWO_VARIABLES,
        OutputType::Chart,
        "Aligned value pairs with the fitted exponential curve.",
    ),
    spec(
        Operation::VariableFindPeaks,
        "variableFindPeaks",
        "Find local extremes in variable. The result depends strongly on the parameters.",
        FIND_PEAKS_PARAMETERS,
        OutputType::Chart,
        "Time series with the detected peaks.",
    ),
    spec(
        Operation::TwoVariablesCorrelation,
        "twoVariablesCorrelation",
        "Pearson correlation of two variables.",
        TWO_VARIABLES,
        OutputType::Number,
        "Correlation coefficient in [-1, 1].",
    ),
    spec(
        Operation::VariablePolynomialRegression,
        "variablePolynomialRegression",
        "The polynomial regression of one variable.",
        POLYNOMIAL_PARAMETERS,
        OutputType::Chart,
        "Time series with the fitted polynomial.",
    ),
];

/// Display names of all analyses
pub fn list_operations() -> Vec<String> {
    OPERATION_REGISTRY.iter().map(OperationSpec::display_name).collect()
}

/// Prescription of one analysis by method or display name
pub fn prescription(name: &str) -> Result<Prescription> {
    OperationSpec::from_name(name)
        .map(OperationSpec::prescription)
        .ok_or_else(|| AnalysisError::UnknownOperation(name.to_string()))
}

/// `variableMean` -> `Variable Mean`
pub fn method_to_display_name(method: &str) -> String {
    let mut out = String::with_capacity(method.len() + 4);
    for (i, c) in method.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
            continue;
        }
        if c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// `Variable Mean` -> `variableMean`
pub fn display_to_method_name(display: &str) -> String {
    let joined: String = display.split_whitespace().collect();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JSON inputs checked against one operation's parameters
struct Inputs<'a> {
    spec: &'static OperationSpec,
    values: &'a Map<String, Value>,
}

impl<'a> Inputs<'a> {
    fn param(&self, key: &str) -> Result<&'static ParameterSpec> {
        self.spec
            .parameters
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("{} has no parameter {}", self.spec.name, key)))
    }

    /// Raw value by key or display name; `null` counts as absent
    fn raw(&self, param: &ParameterSpec) -> Option<&'a Value> {
        self.values
            .get(param.key)
            .or_else(|| self.values.get(&param.display_name()))
            .filter(|v| !v.is_null())
    }

    fn value_or_default(&self, key: &str) -> Result<(&'static ParameterSpec, Value)> {
        let param = self.param(key)?;
        match (self.raw(param), param.default) {
            (Some(value), _) => Ok((param, value.clone())),
            (None, Some(default)) => Ok((param, default.to_json())),
            (None, None) => Err(AnalysisError::MissingParameter(param.display_name())),
        }
    }

    fn id(&self, key: &str) -> Result<u64> {
        let (param, value) = self.value_or_default(key)?;
        let parsed = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| type_error(param, "a non-negative integer identifier", &value))
    }

    fn series_id(&self, experiment_key: &str, variable_key: &str) -> Result<SeriesId> {
        Ok(SeriesId::new(self.id(experiment_key)?, self.id(variable_key)?))
    }

    fn int(&self, key: &str) -> Result<i64> {
        let (param, value) = self.value_or_default(key)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let int = parsed.ok_or_else(|| type_error(param, "an integer", &value))?;
        if param.unsigned && int < 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} must not be negative, got {}",
                param.display_name(),
                int
            )));
        }
        Ok(int)
    }

    fn usize(&self, key: &str) -> Result<usize> {
        let int = self.int(key)?;
        usize::try_from(int)
            .map_err(|_| AnalysisError::InvalidInput(format!("{} is out of range: {}", key, int)))
    }

    fn float(&self, key: &str) -> Result<f64> {
        let (param, value) = self.value_or_default(key)?;
        let parsed = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| type_error(param, "a number", &value))
    }

    fn bool(&self, key: &str) -> Result<bool> {
        let (param, value) = self.value_or_default(key)?;
        let parsed = match &value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| type_error(param, "a boolean", &value))
    }
}

fn type_error(param: &ParameterSpec, expected: &str, got: &Value) -> AnalysisError {
    AnalysisError::InvalidInput(format!(
        "{} must be {}, got {}",
        param.display_name(),
        expected,
        got
    ))
}

impl AnalysisFacade {
    /// Run an analysis by method or display name with JSON inputs.
    ///
    /// Inputs are looked up by parameter key (`experiment1`) or display name
    /// (`Experiment1`). Omitted optional parameters take their defaults.
    pub async fn run(
        &self,
        name: &str,
        inputs: &Map<String, Value>,
        credential: &Credential,
    ) -> Result<AnalysisOutcome> {
        let spec = OperationSpec::from_name(name)
            .ok_or_else(|| AnalysisError::UnknownOperation(name.to_string()))?;
        crate::profile_scope!(format!("analysis {}", spec.name));
        log::info!("Running analysis {}", spec.name);

        let inputs = Inputs {
            spec,
            values: inputs,
        };
        let value = self.dispatch(&inputs, credential).await?;
        Ok(AnalysisOutcome::new(spec.name, value))
    }

    async fn dispatch(&self, inputs: &Inputs<'_>, credential: &Credential) -> Result<AnalysisValue> {
        use AnalysisValue::{Chart, Number, Text};

        let one = || inputs.series_id("experiment", "variable");
        let two = || -> Result<(SeriesId, SeriesId)> {
            Ok((
                inputs.series_id("experiment1", "variable1")?,
                inputs.series_id("experiment2", "variable2")?,
            ))
        };

        let value = match inputs.spec.operation {
            Operation::VariableMean => Number(self.variable_mean(one()?, credential).await?),
            Operation::VariableMaximum => Number(self.variable_maximum(one()?, credential).await?),
            Operation::VariableMinimum => Number(self.variable_minimum(one()?, credential).await?),
            Operation::VariableMedian => Number(self.variable_median(one()?, credential).await?),
            Operation::VariableVariance => {
                let population = inputs.bool("isWholePopulation")?;
                Number(self.variable_variance(one()?, population, credential).await?)
            }
            Operation::VariableStandardDeviation => {
                let population = inputs.bool("isWholePopulation")?;
                Number(
                    self.variable_standard_deviation(one()?, population, credential)
                        .await?,
                )
            }
            Operation::TwoVariablesMean => {
                let (a, b) = two()?;
                Chart(Box::new(self.two_variables_mean(a, b, credential).await?))
            }
            Operation::TwoVariablesDifference => {
                let (a, b) = two()?;
                Chart(Box::new(self.two_variables_difference(a, b, credential).await?))
            }
            Operation::VariableLinearRegression => {
                Chart(Box::new(self.variable_linear_regression(one()?, credential).await?))
            }
            Operation::TwoVariablesLinearRegression => {
                let (a, b) = two()?;
                Chart(Box::new(
                    self.two_variables_linear_regression(a, b, credential).await?,
                ))
            }
            Operation::VariableMonotonicity => Text(
                self.variable_monotonicity(one()?, credential)
                    .await?
                    .to_string(),
            ),
            Operation::VariableExponentialRegression => Chart(Box::new(
                self.variable_exponential_regression(one()?, credential)
                    .await?,
            )),
            Operation::TwoVariablesExponentialRegression => {
                let (a, b) = two()?;
                Chart(Box::new(
                    self.two_variables_exponential_regression(a, b, credential)
                        .await?,
                ))
            }
            Operation::VariableFindPeaks => {
                let detector = PeakDetector::new(
                    inputs.usize("lag")?,
                    inputs.float("threshold")?,
                    inputs.float("influence")?,
                );
                Chart(Box::new(
                    self.variable_find_peaks(one()?, detector, credential).await?,
                ))
            }
            Operation::TwoVariablesCorrelation => {
                let (a, b) = two()?;
                Number(self.two_variables_correlation(a, b, credential).await?)
            }
            Operation::VariablePolynomialRegression => {
                let degree = inputs.usize("maximumDegree")?;
                Chart(Box::new(
                    self.variable_polynomial_regression(one()?, degree, credential)
                        .await?,
                ))
            }
        };

        Ok(value)
    }
}
