use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn tsa() -> Command {
    Command::cargo_bin("tsa").unwrap()
}

/// Directory with series 1-1 (1,2,3) and 1-2 (1,3,5) over t = 0, 1, 2
fn series_dir() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("1-1.csv"), "time,value\n0,1\n1,2\n2,3\n").unwrap();
    fs::write(tmp.path().join("1-2.csv"), "time,value\n0,1\n1,3\n2,5\n").unwrap();
    tmp
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

fn dir_arg(dir: &Path) -> &str {
    dir.to_str().unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    tsa()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    tsa()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tsa"));
}

#[test]
fn test_help_flag() {
    tsa()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("peak detection"));
}

// =============================================================================
// LIST / DESCRIBE
// =============================================================================

#[test]
fn test_list_subcommand() {
    tsa()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Variable Mean"))
        .stdout(predicate::str::contains("Two Variables Correlation"))
        .stdout(predicate::str::contains("Variable Polynomial Regression"));
}

#[test]
fn test_list_json() {
    let output = tsa().args(["list", "--json"]).assert().success();
    let parsed = stdout_json(output.get_output());
    let names = parsed["analysis"].as_array().unwrap();
    assert_eq!(names.len(), 16);
    assert_eq!(names[0], "Variable Mean");
}

#[test]
fn test_describe_json() {
    let output = tsa()
        .args(["describe", "Variable Find Peaks", "--json"])
        .assert()
        .success();
    let parsed = stdout_json(output.get_output());
    assert_eq!(parsed["name"], "Variable Find Peaks");
    assert_eq!(parsed["output"]["type"], "array");

    let inputs: Vec<&str> = parsed["inputGroups"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|g| g["inputs"].as_array().unwrap())
        .map(|i| i["key"].as_str().unwrap())
        .collect();
    assert_eq!(inputs, vec!["experiment", "variable", "lag", "influence", "threshold"]);
}

#[test]
fn test_describe_text() {
    tsa()
        .args(["describe", "variableVariance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("isWholePopulation"))
        .stdout(predicate::str::contains("[nongrouped]"));
}

#[test]
fn test_describe_unknown_analysis() {
    tsa()
        .args(["describe", "Variable Mode"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown analysis"));
}

// =============================================================================
// RUN
// =============================================================================

#[test]
fn test_run_variable_mean() {
    let dir = series_dir();
    let output = tsa()
        .args(["run", "Variable Mean", "--data-dir", dir_arg(dir.path())])
        .args(["--input", "experiment=1", "--input", "variable=1", "--quiet"])
        .assert()
        .success();

    let parsed = stdout_json(output.get_output());
    assert_eq!(parsed["operation"], "variableMean");
    assert_eq!(parsed["outputType"], "float");
    assert_eq!(parsed["result"], 2.0);
}

#[test]
fn test_run_two_variables_mean_chart() {
    let dir = series_dir();
    let output = tsa()
        .args(["run", "twoVariablesMean", "--data-dir", dir_arg(dir.path()), "--compact", "--quiet"])
        .args(["-i", "experiment1=1", "-i", "variable1=1", "-i", "experiment2=1", "-i", "variable2=2"])
        .assert()
        .success();

    let parsed = stdout_json(output.get_output());
    assert_eq!(parsed["outputType"], "array");
    let data = &parsed["result"]["datasets"][0]["data"];
    assert_eq!(data[0], serde_json::json!([1.0, 2.0]));
    assert_eq!(data[3], serde_json::json!([2.5, 4.0]));
}

#[test]
fn test_run_writes_output_file() {
    let dir = series_dir();
    let out = dir.path().join("results").join("monotonicity.json");
    tsa()
        .args(["run", "Variable Monotonicity", "--data-dir", dir_arg(dir.path())])
        .args(["--input", "experiment=1", "--input", "variable=2"])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Results written to"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["result"], "increasing");
    assert_eq!(written["outputType"], "string");
}

#[test]
fn test_run_missing_parameter() {
    let dir = series_dir();
    tsa()
        .args(["run", "variableVariance", "--data-dir", dir_arg(dir.path())])
        .args(["--input", "experiment=1", "--input", "variable=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Is Whole Population"));
}

#[test]
fn test_run_unknown_analysis() {
    let dir = series_dir();
    tsa()
        .args(["run", "variableMode", "--data-dir", dir_arg(dir.path())])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown analysis"));
}

#[test]
fn test_run_malformed_input() {
    let dir = series_dir();
    tsa()
        .args(["run", "variableMean", "--data-dir", dir_arg(dir.path())])
        .args(["--input", "experiment"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_run_missing_series_file() {
    let dir = series_dir();
    tsa()
        .args(["run", "variableMean", "--data-dir", dir_arg(dir.path())])
        .args(["--input", "experiment=7", "--input", "variable=7"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Analysis failed"));
}

#[test]
fn test_run_degree_too_high() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("2-1.csv"), "0,1\n").unwrap();
    tsa()
        .args(["run", "variablePolynomialRegression", "--data-dir", dir_arg(tmp.path())])
        .args(["--input", "experiment=2", "--input", "variable=1", "--input", "maximumDegree=4"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Numeric instability"));
}

#[test]
fn test_run_rejects_non_http_api_url() {
    tsa()
        .args(["run", "variableMean", "--api-url", "ftp://data.example.org"])
        .args(["--input", "experiment=1", "--input", "variable=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("http"));
}

// =============================================================================
// BATCH
// =============================================================================

#[test]
fn test_batch_dry_run() {
    let dir = series_dir();
    let pattern = format!("{}/*.csv", dir_arg(dir.path()));
    tsa()
        .args(["batch", "variableMean", "--glob", &pattern, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1-1.csv"))
        .stdout(predicate::str::contains("1-2.csv"));
}

#[test]
fn test_batch_jsonl_output() {
    let dir = series_dir();
    let pattern = format!("{}/*.csv", dir_arg(dir.path()));
    let output = tsa()
        .args(["batch", "Variable Maximum", "--glob", &pattern, "--quiet"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let results: Vec<f64> = stdout
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .map(|v| v["result"].as_f64().unwrap())
        .collect();
    assert_eq!(results, vec![3.0, 5.0]);
}

#[test]
fn test_batch_output_dir() {
    let dir = series_dir();
    let out_dir = dir.path().join("out");
    let pattern = format!("{}/*.csv", dir_arg(dir.path()));
    tsa()
        .args(["batch", "variableMedian", "--glob", &pattern, "--quiet"])
        .args(["--output-dir", out_dir.to_str().unwrap()])
        .assert()
        .success();

    assert!(out_dir.join("1-1_variableMedian.json").is_file());
    assert!(out_dir.join("1-2_variableMedian.json").is_file());
}

#[test]
fn test_batch_partial_failure() {
    let dir = series_dir();
    let bad = dir.path().join("3-1.csv");
    fs::write(&bad, "no samples here\n").unwrap();

    let files = [
        dir.path().join("1-1.csv"),
        bad,
    ];
    tsa()
        .args(["batch", "variableMean", "--continue-on-error", "--files"])
        .args(files.iter().map(|p| p.to_str().unwrap()))
        .assert()
        .code(4);
}

#[test]
fn test_batch_rejects_two_variable_analysis() {
    let dir = series_dir();
    let pattern = format!("{}/*.csv", dir_arg(dir.path()));
    tsa()
        .args(["batch", "twoVariablesMean", "--glob", &pattern])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("single-variable"));
}

#[test]
fn test_batch_requires_files() {
    tsa()
        .args(["batch", "variableMean"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--glob or --files"));
}
