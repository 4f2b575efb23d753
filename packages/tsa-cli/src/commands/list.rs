use crate::cli::ListArgs;
use crate::exit_codes;
use crate::output;
use serde::Serialize;
use tsa_rs::registry::{list_operations, OPERATION_REGISTRY};
use tsa_rs::OutputType;

#[derive(Serialize)]
struct Listing {
    analysis: Vec<String>,
}

pub fn execute(args: ListArgs) -> i32 {
    if args.json {
        let listing = Listing {
            analysis: list_operations(),
        };
        return match output::to_json(&listing, false)
            .and_then(|json| output::write_output(&json, None))
        {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::EXECUTION_ERROR
            }
        };
    }

    println!("Available analyses:\n");
    println!("  {:<38} {:<8} {}", "Name", "Output", "Inputs");
    println!("  {}", "-".repeat(90));
    for op in OPERATION_REGISTRY {
        let inputs: Vec<String> = op
            .parameters
            .iter()
            .map(|p| {
                if p.is_required() {
                    p.key.to_string()
                } else {
                    format!("[{}]", p.key)
                }
            })
            .collect();
        println!(
            "  {:<38} {:<8} {}",
            op.display_name(),
            output_label(op.output),
            inputs.join(" ")
        );
    }
    println!();
    println!("Example: tsa run \"Variable Mean\" --input experiment=1 --input variable=2");

    exit_codes::SUCCESS
}

pub(crate) fn output_label(output: OutputType) -> &'static str {
    match output {
        OutputType::Number => "float",
        OutputType::Text => "string",
        OutputType::Chart => "array",
    }
}
