pub mod args;
pub mod commands;
pub mod output;

pub use args::{LogLevel, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nARGUMENTS:\n{positionals}\n\
\nOPTIONS:\n{options}\n";

#[derive(Parser, Debug)]
#[command(name = "circleci-docs")]
#[command(version = crate::VERSION)]
#[command(about = "Parse a CircleCI configuration and print its pipeline structure")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Example:\n    circleci-docs .circleci/config.yml --format json\n\nLogging is configured by .circleci-docs/logging.toml, RUST_LOG, then --log-level."
)]
pub struct Args {
    /// Path to the CircleCI configuration file
    #[arg(value_name = "CONFIG_FILE")]
    pub config_file: PathBuf,

    /// Log verbosity (overrides RUST_LOG and the logging config file)
    #[arg(short = 'l', long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// How the parsed configuration is printed
    #[arg(long, default_value = "debug", value_name = "FORMAT")]
    pub format: OutputFormat,
}

pub fn run(args: &Args) -> Result<(), crate::core::AppError> {
    commands::describe(&args.config_file, args.format)
}
