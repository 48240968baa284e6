//! CircleCI pipeline configuration decoding.
//!
//! [`parse`] turns a YAML document into a [`Config`] in a single pass and then
//! normalizes it so that every entity stored under a map key carries that key
//! as its `name`. Aliases and merge keys (`<<: *defaults`) are resolved while
//! decoding; duplicate keys in a mapping are rejected.

mod merge;
mod scalar;
pub mod schema;
mod workflow_job;

pub use schema::{Config, Job, Parameter, Workflow, WorkflowJob, Workflows};

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::fs;
use std::path::Path;

/// Failure to decode a document against the pipeline schema.
#[derive(Debug, thiserror::Error)]
#[error("cannot decode pipeline configuration: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_yaml::Error,
}

impl DecodeError {
    /// One-based line and column of the offending node, when known.
    pub fn location(&self) -> Option<(usize, usize)> {
        self.source
            .location()
            .map(|location| (location.line(), location.column()))
    }
}

/// Decode and normalize a configuration document.
///
/// Malformed YAML or a node whose type does not fit the schema fails the
/// whole document; no partial configuration is returned. Workflow job
/// entries are the exception, see [`WorkflowJob`].
pub fn parse(bytes: &[u8]) -> Result<Config, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Config::default());
    }
    let raw: Option<Config> = serde_yaml::from_slice(bytes)?;
    Ok(raw.unwrap_or_default().normalized())
}

pub fn parse_str(text: &str) -> Result<Config, DecodeError> {
    parse(text.as_bytes())
}

/// Read a configuration file and decode it.
pub fn load_from_file(path: &Path) -> Result<Config, AppError> {
    tracing::debug!("Parsing circleci configuration: {}", path.display());
    let bytes = fs::read(path).map_err(|err| {
        tracing::debug!("Read file error: {}", err);
        AppError::with_source(
            ErrorCategory::IoError,
            format!("failed to read {}", path.display()),
            Box::new(err),
        )
        .with_suggestion("Check that the configuration path exists and is readable")
    })?;

    let config = parse(&bytes).map_err(|err| {
        tracing::debug!("Cannot unmarshal yaml: {}", err);
        let mut error = AppError::from(err);
        error.add_context("path", &path.display().to_string());
        error
    })?;
    tracing::debug!("Decoded {}", config.summary());
    Ok(config)
}
