use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;
mod params;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::List(args) => commands::list::execute(args),
        cli::Command::Describe(args) => commands::describe::execute(args),
        cli::Command::Run(args) => commands::run::execute(args).await,
        cli::Command::Batch(args) => commands::batch::execute(args).await,
    };

    std::process::exit(exit_code);
}
