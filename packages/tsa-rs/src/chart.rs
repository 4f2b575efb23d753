use serde::{Deserialize, Serialize};

pub const DEFAULT_X_AXIS: &str = "Time";
pub const DEFAULT_Y_AXIS: &str = "Species [molecules/cell]";

/// Legend colours, in dataset order
pub const PRIMARY_COLOR: &str = "6364d3";
pub const SECONDARY_COLOR: &str = "9163d3";
pub const RESULT_COLOR: &str = "f07058";

/// Legend entry for one plotted array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub name: String,
    pub color: String,
}

impl LegendEntry {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Named table of value arrays; the first array is the shared x axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub data: Vec<Vec<Option<f64>>>,
}

/// Named selection of visible datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSet {
    pub name: String,
    pub datasets: Vec<bool>,
}

/// Chart-ready result of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub model: bool,
    pub id: String,
    pub name: String,
    pub x_axis_name: String,
    pub y_axis_name: String,
    pub datasets: Vec<Dataset>,
    pub legend: Vec<LegendEntry>,
    pub graphsets: Vec<GraphSet>,
    pub legend_items: Option<Vec<LegendEntry>>,
    pub datasets_visibility: Option<Vec<bool>>,
}

impl ChartPayload {
    /// First (and usually only) dataset
    pub fn primary(&self) -> Option<&Dataset> {
        self.datasets.first()
    }
}

/// Column of plain values
pub fn column(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Package computed arrays into a [`ChartPayload`].
///
/// `data` holds the x axis followed by one array per legend entry. A single
/// "All" graph set shows every array.
pub fn shape_result(
    id: impl ToString,
    title: &str,
    data: Vec<Vec<Option<f64>>>,
    legend: Vec<LegendEntry>,
) -> ChartPayload {
    let graphsets = vec![GraphSet {
        name: "All".to_string(),
        datasets: vec![true; data.len()],
    }];

    ChartPayload {
        model: false,
        id: id.to_string(),
        name: title.to_string(),
        x_axis_name: DEFAULT_X_AXIS.to_string(),
        y_axis_name: DEFAULT_Y_AXIS.to_string(),
        datasets: vec![Dataset {
            name: title.to_string(),
            data,
        }],
        legend,
        graphsets,
        legend_items: None,
        datasets_visibility: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_result_layout() {
        let data = vec![
            column(&[0.0, 1.0]),
            column(&[2.0, 3.0]),
            vec![None, Some(3.0)],
        ];
        let legend = vec![
            LegendEntry::new("Variable", PRIMARY_COLOR),
            LegendEntry::new("Peaks", RESULT_COLOR),
        ];

        let chart = shape_result(42u64, "Peaks", data, legend);
        assert_eq!(chart.id, "42");
        assert_eq!(chart.graphsets[0].datasets, vec![true, true, true]);
        assert_eq!(chart.primary().unwrap().data[2][0], None);

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["xAxisName"], "Time");
        assert_eq!(json["datasets"][0]["data"][2][0], serde_json::Value::Null);
        assert_eq!(json["legend"][1]["color"], "f07058");
        assert!(json["legendItems"].is_null());
    }
}
