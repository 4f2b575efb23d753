use crate::cli::RunArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use tsa_rs::{AnalysisFacade, OperationSpec};

pub async fn execute(args: RunArgs) -> i32 {
    let spec = match OperationSpec::from_name(&args.name) {
        Some(spec) => spec,
        None => {
            eprintln!("Error: Unknown analysis '{}'. See `tsa list`.", args.name);
            return exit_codes::INPUT_ERROR;
        }
    };

    let inputs = match params::parse_inputs(&args.inputs) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let source = match params::resolve_source(&args.source) {
        Ok(source) => source,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };
    let facade = AnalysisFacade::new(source);
    let credential = params::credential(&args.source);

    if !args.quiet {
        eprintln!("Running {}...", spec.display_name());
    }

    match facade.run(spec.name, &inputs, &credential).await {
        Ok(outcome) => match output::to_json(&outcome, args.compact) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, args.output.as_deref()) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
                if !args.quiet {
                    if let Some(ref path) = args.output {
                        eprintln!("Results written to {}", path);
                    }
                }
                exit_codes::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing result: {}", e);
                exit_codes::EXECUTION_ERROR
            }
        },
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            params::exit_code_for(&e)
        }
    }
}
