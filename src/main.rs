use circleci_docs::cli::{self, Args};
use circleci_docs::core::{DefaultErrorReporter, ErrorReporter};
use circleci_docs::logging;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let _logging = match logging::init(&args) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Invalid logging configuration: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    match cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            DefaultErrorReporter::new().report_error(&err);
            ExitCode::FAILURE
        }
    }
}
