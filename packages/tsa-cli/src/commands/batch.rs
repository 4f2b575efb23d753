use crate::cli::BatchArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Instant;
use tsa_rs::source::series_id_from_path;
use tsa_rs::{AnalysisFacade, Credential, FileSource, OperationSpec, SeriesId};

pub async fn execute(args: BatchArgs) -> i32 {
    let spec = match OperationSpec::from_name(&args.name) {
        Some(spec) => spec,
        None => {
            eprintln!("Error: Unknown analysis '{}'. See `tsa list`.", args.name);
            return exit_codes::INPUT_ERROR;
        }
    };
    if !is_single_variable(spec) {
        eprintln!(
            "Error: '{}' needs two variables; batch runs single-variable analyses only",
            spec.display_name()
        );
        return exit_codes::INPUT_ERROR;
    }

    let files = match resolve_files(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No matching files found");
        return exit_codes::INPUT_ERROR;
    }

    // Dry-run mode: print file list and exit
    if args.dry_run {
        for f in &files {
            println!("{}", f);
        }
        if !args.quiet {
            eprintln!("Found {} file(s)", files.len());
        }
        return exit_codes::SUCCESS;
    }

    let base_inputs = match params::parse_inputs(&args.inputs) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if let Some(ref dir) = args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: Failed to create output directory '{}': {}", dir, e);
            return exit_codes::EXECUTION_ERROR;
        }
    }

    let total = files.len();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let start_time = Instant::now();

    for (i, file_path) in files.iter().enumerate() {
        if !args.quiet {
            eprintln!("[{}/{}] {}...", i + 1, total, file_path);
        }

        match run_file(spec, file_path, &base_inputs).await {
            Ok(outcome) => {
                let written = match args.output_dir {
                    Some(ref dir) => {
                        let stem = Path::new(file_path)
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .unwrap_or("output");
                        let out_path = Path::new(dir).join(format!("{}_{}.json", stem, spec.name));
                        output::to_json(&outcome, args.compact)
                            .and_then(|json| output::write_output(&json, out_path.to_str()))
                    }
                    None => output::to_json(&outcome, true).and_then(|json| output::write_line(&json)),
                };

                match written {
                    Ok(()) => succeeded += 1,
                    Err(e) => {
                        eprintln!("  Error writing output: {}", e);
                        failed += 1;
                        if !args.continue_on_error {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("  Analysis failed: {}", e);
                failed += 1;
                if !args.continue_on_error {
                    break;
                }
            }
        }
    }

    let elapsed = start_time.elapsed();

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} succeeded, {}/{} failed, {:.1}s",
            succeeded,
            total,
            failed,
            total,
            elapsed.as_secs_f64()
        );
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn is_single_variable(spec: &OperationSpec) -> bool {
    let has = |key: &str| spec.parameters.iter().any(|p| p.key == key);
    has("experiment") && has("variable")
}

/// Analyse one `{experiment}-{variable}.csv` file
async fn run_file(
    spec: &OperationSpec,
    file_path: &str,
    base_inputs: &Map<String, Value>,
) -> Result<tsa_rs::AnalysisOutcome, String> {
    let path = Path::new(file_path);
    let id = series_id_from_path(path).ok_or_else(|| {
        format!(
            "cannot derive series id from '{}': expected {{experiment}}-{{variable}}.csv",
            file_path
        )
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let facade = AnalysisFacade::with_source(FileSource::new(dir).map_err(|e| e.to_string())?);

    facade
        .run(spec.name, &inputs_for(id, base_inputs), &Credential::anonymous())
        .await
        .map_err(|e| e.to_string())
}

fn inputs_for(id: SeriesId, base_inputs: &Map<String, Value>) -> Map<String, Value> {
    let mut inputs = base_inputs.clone();
    inputs.insert("experiment".to_string(), Value::from(id.experiment.0));
    inputs.insert("variable".to_string(), Value::from(id.variable.0));
    inputs
}

fn resolve_files(args: &BatchArgs) -> Result<Vec<String>, String> {
    if let Some(ref pattern) = args.glob {
        resolve_glob(pattern)
    } else if let Some(ref files) = args.files {
        Ok(files.clone())
    } else {
        Err("One of --glob or --files must be specified".to_string())
    }
}

fn resolve_glob(pattern: &str) -> Result<Vec<String>, String> {
    let paths = glob::glob(pattern)
        .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<String> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(s) = path.to_str() {
                        files.push(s.to_string());
                    }
                }
            }
            Err(e) => {
                log::warn!("glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}
