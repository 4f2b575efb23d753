use crate::cli::DescribeArgs;
use crate::commands::list::output_label;
use crate::exit_codes;
use crate::output;
use tsa_rs::prescription;

pub fn execute(args: DescribeArgs) -> i32 {
    let prescription = match prescription(&args.name) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    if args.json {
        return match output::to_json(&prescription, false)
            .and_then(|json| output::write_output(&json, None))
        {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::EXECUTION_ERROR
            }
        };
    }

    println!("{}", prescription.name);
    if let Some(ref description) = prescription.description {
        println!("  {}", description);
    }
    println!();

    for group in &prescription.input_groups {
        println!("  [{}]", group.name);
        for input in &group.inputs {
            let mut line = format!("    {:<20} {}", input.key, input.kind.as_str());
            if let Some(ref default) = input.default_value {
                line.push_str(&format!(" (default {})", default));
            }
            if input.unsigned == Some(true) {
                line.push_str(" unsigned");
            }
            println!("{}", line);
            if let Some(ref description) = input.description {
                println!("      {}", description);
            }
        }
    }

    println!();
    print!("  Output: {}", output_label(prescription.output.kind));
    match prescription.output.description {
        Some(ref description) => println!(" - {}", description),
        None => println!(),
    }

    exit_codes::SUCCESS
}
