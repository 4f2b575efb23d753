use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tsa",
    version,
    about = "Time-series analysis of experiment variables",
    long_about = "Run statistics, regressions and peak detection on experiment variables.\n\
                  Series come from the Data API (--api-url, $TSA_DATA_API_URL) or from a\n\
                  directory of {experiment}-{variable}.csv files (--data-dir)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// List available analyses
    List(ListArgs),
    /// Show the inputs and output of one analysis
    Describe(DescribeArgs),
    /// Run one analysis
    Run(RunArgs),
    /// Run a single-variable analysis over many series files
    Batch(BatchArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct DescribeArgs {
    /// Analysis name, e.g. "Variable Mean" or variableMean
    pub name: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Where series are read from
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Directory of {experiment}-{variable}.csv series files (takes precedence over --api-url)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Data API base URL
    #[arg(long, env = "TSA_DATA_API_URL")]
    pub api_url: Option<String>,

    /// Access token forwarded to the Data API
    #[arg(long, env = "TSA_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Data API request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Analysis name, e.g. "Variable Mean" or variableMean
    pub name: String,

    /// Analysis input as key=value (repeatable), e.g. --input experiment=1
    #[arg(short, long = "input", value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Single-variable analysis name
    pub name: String,

    /// Glob pattern for series files (e.g. "data/*.csv")
    #[arg(long)]
    pub glob: Option<String>,

    /// Explicit list of series files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    /// Extra analysis input as key=value (repeatable)
    #[arg(short, long = "input", value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    /// Write one JSON file per series into this directory (default: JSONL on stdout)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Keep going after a failed series
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Only list the series that would be analysed
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Compact JSON in per-series output files
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}
