use crate::error::{AnalysisError, Result};
use crate::types::{Sample, Series};

/// Parse two-column `time value` text into a [`Series`]
pub fn parse_series(content: &str) -> Result<Series> {
    parse_series_from_bytes(content.as_bytes())
}

/// Parse two-column series data from a byte slice (e.g. mmap).
///
/// Columns may be separated by commas, semicolons or whitespace. Empty lines
/// and `#` comments are skipped, as are non-numeric lines before the first
/// sample (headers). Later malformed rows are skipped with a warning.
/// Samples are ordered by time before the series is built.
pub fn parse_series_from_bytes(content: &[u8]) -> Result<Series> {
    let text = std::str::from_utf8(content)
        .map_err(|e| AnalysisError::ParseError(format!("series data is not UTF-8: {}", e)))?;

    let mut samples: Vec<Sample> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_row(line) {
            Some(sample) => samples.push(sample),
            None if samples.is_empty() => {
                log::debug!("Skipping header line {}: {:?}", line_no + 1, line);
            }
            None => {
                log::warn!("Line {} is not a valid (time, value) row, skipping", line_no + 1);
            }
        }
    }

    if samples.is_empty() {
        return Err(AnalysisError::ParseError(
            "No valid samples found in series data".to_string(),
        ));
    }

    log::debug!("Parsed {} samples", samples.len());

    samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    Series::new(samples)
}

fn parse_row(line: &str) -> Option<Sample> {
    let mut fields = line
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|field| !field.is_empty());

    let time = fields.next()?.parse::<f64>().ok()?;
    let value = fields.next()?.parse::<f64>().ok()?;
    Some(Sample::new(time, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_series_basic() {
        let content = "# exported series\n\
                       time,value\n\
                       0.0,1.0\n\
                       1.0, 2.5\n\
                       2.0\t4.0\n";

        let series = parse_series(content).unwrap();
        assert_eq!(series.times(), vec![0.0, 1.0, 2.0]);
        assert_eq!(series.values(), vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_parse_series_sorts_by_time() {
        let series = parse_series("2;20\n0;0\n1;10").unwrap();
        assert_eq!(series.times(), vec![0.0, 1.0, 2.0]);
        assert_eq!(series.values(), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_parse_series_skips_malformed_rows() {
        let series = parse_series("0 1\nnot a row\n1 2\n3\n").unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_parse_empty_content() {
        let content = "# Only comments\n# More comments\n";
        assert!(matches!(parse_series(content), Err(AnalysisError::ParseError(_))));
    }
}
