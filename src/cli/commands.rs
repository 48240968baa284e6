use crate::cli::{args::OutputFormat, output};
use crate::core::{pipeline, AppError};
use std::io::Write;
use std::path::Path;

/// Decode the configuration at `path` and print it to stdout.
pub fn describe(path: &Path, format: OutputFormat) -> Result<(), AppError> {
    let config = pipeline::load_from_file(path)?;
    tracing::info!("Parsed config {}", config.summary());

    let rendered = output::render(&config, format)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    Ok(())
}
