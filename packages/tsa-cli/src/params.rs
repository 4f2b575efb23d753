use crate::cli::SourceArgs;
use crate::exit_codes;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tsa_rs::{AnalysisError, Credential, DataApiClient, DataApiConfig, FileSource, SeriesSource};

/// Parse `key=value` inputs into a JSON object.
///
/// Numbers, booleans and `null` are decoded as JSON; anything else is kept as
/// a string. A repeated key keeps the last value.
pub fn parse_inputs(raw: &[String]) -> Result<Map<String, Value>, String> {
    let mut inputs = Map::new();
    for item in raw {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| format!("Invalid input '{}': expected KEY=VALUE", item))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Invalid input '{}': empty key", item));
        }
        inputs.insert(key.to_string(), parse_value(value.trim()));
    }
    Ok(inputs)
}

fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}

/// Build the series source selected on the command line
pub fn resolve_source(args: &SourceArgs) -> Result<Arc<dyn SeriesSource>, String> {
    if let Some(ref dir) = args.data_dir {
        let source = FileSource::new(dir).map_err(|e| e.to_string())?;
        log::info!("Reading series from {}", dir);
        return Ok(Arc::new(source));
    }

    let mut config = match args.api_url {
        Some(ref url) => DataApiConfig::new(url.as_str()),
        None => DataApiConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    log::info!("Fetching series from {}", config.base_url);
    let client = DataApiClient::new(config).map_err(|e| e.to_string())?;
    Ok(Arc::new(client))
}

pub fn credential(args: &SourceArgs) -> Credential {
    args.token
        .as_deref()
        .map(Credential::new)
        .unwrap_or_default()
}

/// Exit code reported for an analysis failure
pub fn exit_code_for(error: &AnalysisError) -> i32 {
    match error {
        AnalysisError::AccessForbidden(_) => exit_codes::ACCESS_DENIED,
        AnalysisError::InvalidInput(_)
        | AnalysisError::MissingParameter(_)
        | AnalysisError::UnknownOperation(_)
        | AnalysisError::ParseError(_) => exit_codes::INPUT_ERROR,
        AnalysisError::OperationFailed(_)
        | AnalysisError::NumericInstability(_)
        | AnalysisError::IoError(_) => exit_codes::EXECUTION_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs_types() {
        let raw = vec![
            "experiment=12".to_string(),
            "isWholePopulation=true".to_string(),
            "threshold=0.75".to_string(),
            "Variable 1=abc".to_string(),
        ];
        let inputs = parse_inputs(&raw).unwrap();
        assert_eq!(inputs["experiment"], 12);
        assert_eq!(inputs["isWholePopulation"], true);
        assert_eq!(inputs["threshold"], 0.75);
        assert_eq!(inputs["Variable 1"], "abc");
    }

    #[test]
    fn test_parse_inputs_invalid() {
        assert!(parse_inputs(&["experiment".to_string()]).is_err());
        assert!(parse_inputs(&["=3".to_string()]).is_err());
    }

    #[test]
    fn test_parse_inputs_json_objects_stay_strings() {
        let inputs = parse_inputs(&["lag=[1,2]".to_string()]).unwrap();
        assert_eq!(inputs["lag"], "[1,2]");
    }

    #[test]
    fn test_exit_codes_for_errors() {
        assert_eq!(
            exit_code_for(&AnalysisError::AccessForbidden("Not authorized.".into())),
            exit_codes::ACCESS_DENIED
        );
        assert_eq!(
            exit_code_for(&AnalysisError::MissingParameter("Experiment".into())),
            exit_codes::INPUT_ERROR
        );
        assert_eq!(
            exit_code_for(&AnalysisError::NumericInstability("degree".into())),
            exit_codes::EXECUTION_ERROR
        );
    }

    #[test]
    fn test_resolve_source_missing_data_dir() {
        let args = SourceArgs {
            data_dir: Some("/nonexistent_dir_12345".to_string()),
            ..SourceArgs::default()
        };
        assert!(resolve_source(&args).is_err());
    }

    #[test]
    fn test_resolve_source_rejects_bad_url() {
        let args = SourceArgs {
            api_url: Some("ftp://example.org".to_string()),
            ..SourceArgs::default()
        };
        assert!(resolve_source(&args).is_err());
    }

    #[test]
    fn test_credential_defaults_to_anonymous() {
        assert_eq!(credential(&SourceArgs::default()), Credential::anonymous());
        let args = SourceArgs {
            token: Some("abc".to_string()),
            ..SourceArgs::default()
        };
        assert_eq!(credential(&args).as_str(), "abc");
    }
}
